use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use woodgas_render::{RenderError, TextureHandle, validate_texture_data};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    mvp_0: [f32; 4],
    mvp_1: [f32; 4],
    mvp_2: [f32; 4],
    mvp_3: [f32; 4],
}

impl From<Mat4> for InstanceData {
    fn from(mvp: Mat4) -> Self {
        let cols = mvp.to_cols_array_2d();
        Self {
            mvp_0: cols[0],
            mvp_1: cols[1],
            mvp_2: cols[2],
            mvp_3: cols[3],
        }
    }
}

/// A queued quad: its final clip-space matrix and texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadInstance {
    pub mvp: Mat4,
    pub texture: TextureHandle,
}

/// Unit quad centered on the origin, v flipped so images load top-left first.
fn quad_mesh() -> ([Vertex; 4], [u16; 6]) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = [
        Vertex { position: [-p, -p], uv: [0.0, 1.0] },
        Vertex { position: [ p, -p], uv: [1.0, 1.0] },
        Vertex { position: [ p,  p], uv: [1.0, 0.0] },
        Vertex { position: [-p,  p], uv: [0.0, 0.0] },
    ];
    let indices = [0, 1, 2, 2, 3, 0];
    (vertices, indices)
}

/// Split `instances` into runs sharing one texture, as `(texture, start..end)`.
fn texture_runs(instances: &[QuadInstance]) -> Vec<(TextureHandle, std::ops::Range<u32>)> {
    let mut runs: Vec<(TextureHandle, std::ops::Range<u32>)> = Vec::new();
    for (i, instance) in instances.iter().enumerate() {
        let i = i as u32;
        match runs.last_mut() {
            Some((texture, range)) if *texture == instance.texture => range.end = i + 1,
            _ => runs.push((instance.texture, i..i + 1)),
        }
    }
    runs
}

struct GpuTexture {
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Textured quad pipeline with a preallocated instance buffer.
pub struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
}

impl QuadPipeline {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::QUAD_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x2,
                            1 => Float32x2,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (vertices, indices) = quad_mesh();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Instance buffer (pre-allocated)
        let max_instances = 10_000u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut pipeline = Self {
            pipeline,
            texture_layout,
            sampler,
            textures: Vec::new(),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            instance_buffer,
            max_instances,
        };
        pipeline.upload_texture(device, queue, 1, 1, &[255; 4]);
        pipeline
    }

    pub fn max_instances(&self) -> u32 {
        self.max_instances
    }

    pub fn has_texture(&self, texture: TextureHandle) -> bool {
        (texture.0 as usize) < self.textures.len()
    }

    /// Upload RGBA8 pixels as a new sRGB texture.
    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        validate_texture_data(width, height, rgba.len())?;
        Ok(self.upload_texture(device, queue, width, height, rgba))
    }

    fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> TextureHandle {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quad_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&Default::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_texture_bind_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            bind_group,
        });
        tracing::debug!(?handle, width, height, "texture uploaded");
        handle
    }

    /// Render one frame of queued quads into `view`.
    ///
    /// `clear` selects between clearing to a color and loading the previous contents.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
        instances: &[QuadInstance],
    ) {
        let count = instances.len().min(self.max_instances as usize);
        let instances = &instances[..count];

        if !instances.is_empty() {
            let data: Vec<InstanceData> = instances.iter().map(|q| q.mvp.into()).collect();
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&data));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quad_encoder"),
        });

        {
            let load = match clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if !instances.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                for (texture, range) in texture_runs(instances) {
                    // Handles are checked when queued; fall back to white otherwise.
                    let bound = self
                        .textures
                        .get(texture.0 as usize)
                        .or_else(|| self.textures.first());
                    if let Some(gpu_texture) = bound {
                        pass.set_bind_group(0, &gpu_texture.bind_group, &[]);
                        pass.draw_indexed(0..self.index_count, 0, range);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

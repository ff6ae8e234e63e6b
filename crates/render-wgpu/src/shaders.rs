/// WGSL shader for instanced textured quads.
///
/// The per-instance matrix is the full `projection * view * model` product,
/// computed on the CPU when the quad is queued.
pub const QUAD_SHADER: &str = r#"
@group(0) @binding(0)
var quad_texture: texture_2d<f32>;
@group(0) @binding(1)
var quad_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct InstanceInput {
    @location(2) mvp_0: vec4<f32>,
    @location(3) mvp_1: vec4<f32>,
    @location(4) mvp_2: vec4<f32>,
    @location(5) mvp_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let mvp = mat4x4<f32>(
        instance.mvp_0,
        instance.mvp_1,
        instance.mvp_2,
        instance.mvp_3,
    );

    var out: VertexOutput;
    out.clip_position = mvp * vec4<f32>(vertex.position, 0.0, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(quad_texture, quad_sampler, in.uv);
}
"#;

use crate::gpu::{QuadInstance, QuadPipeline};
use crate::keymap::map_key;
use glam::Mat4;
use std::sync::Arc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};
use woodgas_common::WindowConfig;
use woodgas_input::InputState;
use woodgas_render::{RenderBackend, RenderError, TextureHandle};

/// Startup pumps to wait for the window and GPU before giving up.
const STARTUP_PUMPS: usize = 500;

/// Errors from opening the window or initializing the GPU.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
    #[error("window was not created after {0} event loop pumps")]
    NotCreated(usize),
}

/// Window, surface and device. Created once the event loop resumes.
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    quads: QuadPipeline,
    window: Arc<Window>,
}

impl GpuState {
    fn new(window: Arc<Window>, vsync: bool) -> Result<Self, WindowError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(WindowError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("woodgas_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(WindowError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let quads = QuadPipeline::new(&device, &queue, surface_format);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            quads,
            window,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(width = self.config.width, height = self.config.height, "surface resized");
    }
}

/// Event handler state, driven by `pump_app_events`.
struct WindowApp {
    window_config: WindowConfig,
    gpu: Option<GpuState>,
    input: InputState,
    open: bool,
    error: Option<WindowError>,
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.window_config.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));
        let created = event_loop
            .create_window(attrs)
            .map_err(WindowError::from)
            .and_then(|window| GpuState::new(Arc::new(window), self.window_config.vsync));
        match created {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("window startup failed: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::debug!("window close requested");
                self.open = false;
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::Focused(false) => {
                self.input.clear();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(code) {
                    self.input.set(key, key_state == ElementState::Pressed);
                }
            }
            _ => {}
        }
    }
}

/// Windowed [`RenderBackend`].
///
/// Owns the winit event loop and pumps it from `poll_inputs`, so the caller
/// keeps control of the frame loop.
pub struct WindowRenderer {
    event_loop: EventLoop<()>,
    app: WindowApp,
    clear_color: wgpu::Color,
    projection: Mat4,
    view: Mat4,
    transform: Mat4,
    bound: TextureHandle,
    clear_requested: bool,
    queued: Vec<QuadInstance>,
    dropped: usize,
}

impl WindowRenderer {
    /// Open the window and wait until the GPU surface is ready.
    pub fn new(window: &WindowConfig, clear_color: [f32; 4]) -> Result<Self, WindowError> {
        let mut event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = WindowApp {
            window_config: window.clone(),
            gpu: None,
            input: InputState::new(),
            open: true,
            error: None,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app);
            if let Some(e) = app.error.take() {
                return Err(e);
            }
            if app.gpu.is_some() || matches!(status, PumpStatus::Exit(_)) {
                break;
            }
        }
        if app.gpu.is_none() {
            return Err(WindowError::NotCreated(STARTUP_PUMPS));
        }

        let [r, g, b, a] = clear_color.map(f64::from);
        Ok(Self {
            event_loop,
            app,
            clear_color: wgpu::Color { r, g, b, a },
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            transform: Mat4::IDENTITY,
            bound: TextureHandle::WHITE,
            clear_requested: false,
            queued: Vec::new(),
            dropped: 0,
        })
    }

    /// Current surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.app
            .gpu
            .as_ref()
            .map_or((0, 0), |gpu| (gpu.config.width, gpu.config.height))
    }

    fn check_texture(&self, texture: TextureHandle) -> Result<(), RenderError> {
        match &self.app.gpu {
            Some(gpu) if gpu.quads.has_texture(texture) => Ok(()),
            _ => Err(RenderError::UnknownTexture(texture)),
        }
    }

    fn queue_quad(&mut self, model: Mat4, texture: TextureHandle) {
        let capacity = self
            .app
            .gpu
            .as_ref()
            .map_or(0, |gpu| gpu.quads.max_instances() as usize);
        if self.queued.len() >= capacity {
            self.dropped += 1;
            return;
        }
        self.queued.push(QuadInstance {
            mvp: self.projection * self.view * model,
            texture,
        });
    }
}

impl RenderBackend for WindowRenderer {
    fn is_window_open(&self) -> bool {
        self.app.open
    }

    fn poll_inputs(&mut self) {
        if !self.app.open {
            return;
        }
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app);
        if let PumpStatus::Exit(code) = status {
            tracing::debug!(code, "event loop exited");
            self.app.open = false;
        }
    }

    fn input_state(&self) -> InputState {
        self.app.input.clone()
    }

    fn clear(&mut self) {
        self.clear_requested = true;
    }

    fn upload_orthographic(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn upload_view(&mut self, view: Mat4) {
        self.view = view;
    }

    fn upload_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        let gpu = self
            .app
            .gpu
            .as_mut()
            .ok_or_else(|| RenderError::Backend("window is closed".into()))?;
        gpu.quads
            .create_texture(&gpu.device, &gpu.queue, width, height, rgba)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), RenderError> {
        self.check_texture(texture)?;
        self.bound = texture;
        Ok(())
    }

    fn draw_quad(&mut self) {
        self.queue_quad(self.transform, self.bound);
    }

    fn begin_batch(&mut self) {}

    fn batch_quad(&mut self, transform: Mat4, texture: TextureHandle) -> Result<(), RenderError> {
        self.check_texture(texture)?;
        self.queue_quad(transform, texture);
        Ok(())
    }

    fn end_batch(&mut self) {}

    fn swap_buffers(&mut self) -> Result<(), RenderError> {
        let quads = std::mem::take(&mut self.queued);
        let clear = std::mem::take(&mut self.clear_requested).then_some(self.clear_color);
        if self.dropped > 0 {
            tracing::warn!(dropped = self.dropped, "instance buffer full, quads dropped");
            self.dropped = 0;
        }

        let Some(gpu) = &self.app.gpu else {
            return Ok(());
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout, frame skipped");
                return Ok(());
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Err(RenderError::Backend(e.to_string()));
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        gpu.quads.render(&gpu.device, &gpu.queue, &view, clear, &quads);
        gpu.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

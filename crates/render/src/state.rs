use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use fractal::{ExplorerState, FrameBackend, Viewport};
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window};

use crate::controller::InputController;
use crate::gpu_types::FrameUniform;
use crate::offscreen::OffscreenRenderer;
use crate::pipeline;
use crate::shader::{KernelPrecision, ShaderSources};

/// Longest frame time fed to the simulation. Keeps a stalled frame from
/// flinging the camera across the scene.
const MAX_FRAME_TIME: f32 = 0.25;

pub struct State {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad: wgpu::Buffer,
    precision: KernelPrecision,
    sources: ShaderSources,
    shader_dir: Option<PathBuf>,
    snapshot_dir: PathBuf,
    explorer: ExplorerState,
    controller: InputController,
    cursor_grabbed: bool,
    last_frame: Instant,
}

impl State {
    pub async fn new(
        window: Arc<Window>,
        explorer: ExplorerState,
        shader_dir: Option<PathBuf>,
        snapshot_dir: PathBuf,
    ) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to get adapter")?;
        let (device, queue, precision) = pipeline::request_device(&adapter, "Explorer Device").await?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sources = match &shader_dir {
            Some(dir) => ShaderSources::load(dir)?,
            None => ShaderSources::builtin(),
        };
        let source = sources.build(precision).context("tracer shader failed validation")?;

        let bind_group_layout = pipeline::create_bind_group_layout(&device);
        let uniform_buffer = pipeline::create_uniform_buffer(&device);
        let bind_group = pipeline::create_bind_group(&device, &bind_group_layout, &uniform_buffer);
        let pipeline = pipeline::create_render_pipeline(&device, &bind_group_layout, config.format, &source);
        let quad = pipeline::create_fullscreen_quad(&device);

        tracing::info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "surface configured"
        );

        Ok(Self {
            window,
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            bind_group_layout,
            pipeline,
            bind_group,
            uniform_buffer,
            quad,
            precision,
            sources,
            shader_dir,
            snapshot_dir,
            explorer,
            controller: InputController::new(),
            cursor_grabbed: false,
            last_frame: Instant::now(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub fn explorer(&self) -> &ExplorerState {
        &self.explorer
    }

    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.controller.exit_requested()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Handles window events the explorer cares about. Returns whether the
    /// event was consumed.
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => self.controller.process_keyboard(*code, *state, *repeat),
            WindowEvent::Focused(true) => {
                self.grab_cursor();
                true
            }
            WindowEvent::Focused(false) => {
                self.controller.release_all();
                self.cursor_grabbed = false;
                true
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !self.cursor_grabbed {
                    self.grab_cursor();
                }
                true
            }
            _ => false,
        }
    }

    /// Raw pointer motion drives the camera while the cursor is grabbed.
    pub fn device_input(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_grabbed {
                self.explorer.camera.on_pointer_delta(delta.0, delta.1);
            }
        }
    }

    fn grab_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.cursor_grabbed = true;
                self.explorer.camera.reacquire();
                tracing::debug!("cursor grabbed");
            }
            Err(e) => tracing::warn!("failed to grab cursor: {e}"),
        }
    }

    /// Advances the explorer by the wall time since the previous update.
    pub fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32().min(MAX_FRAME_TIME);
        self.last_frame = now;

        if let Some(step) = self.controller.take_power_step() {
            self.explorer.adjust_power(step);
        }
        self.explorer.advance(&self.controller.input_state(), dt);

        if self.controller.take_snapshot_request() {
            if let Err(e) = self.snapshot() {
                tracing::error!("snapshot failed: {e:#}");
            }
        }
    }

    /// Recomposes the kernel from disk. On any failure the running pipeline
    /// is kept.
    pub fn reload_shaders(&mut self) -> Result<()> {
        let Some(dir) = &self.shader_dir else {
            return Ok(());
        };
        let sources = ShaderSources::load(dir)?;
        let source = sources.build(self.precision)?;
        self.pipeline =
            pipeline::try_create_render_pipeline(&self.device, &self.bind_group_layout, self.config.format, &source)?;
        self.sources = sources;
        tracing::info!(dir = %dir.display(), "shaders reloaded");
        Ok(())
    }

    /// Renders the current frame offscreen at window size and saves a PNG.
    pub fn snapshot(&self) -> Result<PathBuf> {
        let renderer = OffscreenRenderer::with_device(
            self.device.clone(),
            self.queue.clone(),
            self.precision,
            &self.sources,
        )?;
        let frame = self.explorer.frame_params(self.viewport());
        let pixels = renderer.render_to_vec(&frame)?;
        std::fs::create_dir_all(&self.snapshot_dir)
            .with_context(|| format!("failed to create {}", self.snapshot_dir.display()))?;
        let path = crate::snapshot::timestamped_path(&self.snapshot_dir);
        crate::snapshot::save_png(&path, frame.viewport, &pixels)?;
        Ok(path)
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.explorer.frame_params(self.viewport());
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&FrameUniform::from(&frame)));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("enc") });
        pipeline::encode_frame(&mut encoder, &view, &self.pipeline, &self.bind_group, &self.quad);
        self.queue.submit(Some(encoder.finish()));
        output.present();

        Ok(())
    }
}

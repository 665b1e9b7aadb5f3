use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use anyhow::{Context, Result};
use fractal::ExplorerState;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::state::State;

/// Everything the windowed explorer needs besides the explorer state.
pub struct RunOptions {
    pub title: String,
    /// Initial inner window size in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Directory to load WGSL from; the built-in kernel is used when `None`.
    pub shader_dir: Option<PathBuf>,
    /// Fires whenever the shader directory changed on disk.
    pub reload: Option<Receiver<()>>,
    pub snapshot_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            title: "Mandelbulb Explorer".to_string(),
            width: 1280,
            height: 720,
            shader_dir: None,
            reload: None,
            snapshot_dir: PathBuf::from("."),
        }
    }
}

/// Opens the window and runs the frame loop until exit is requested.
pub fn run(explorer: ExplorerState, options: RunOptions) -> Result<()> {
    let RunOptions {
        title,
        width,
        height,
        shader_dir,
        reload,
        snapshot_dir,
    } = options;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let mut state = pollster::block_on(State::new(window, explorer, shader_dir, snapshot_dir))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == state.window().id() => {
            if !state.input(event) {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                tracing::error!("surface out of memory, exiting");
                                elwt.exit();
                            }
                            Err(e) => tracing::warn!("skipping frame: {e:?}"),
                        }
                    }
                    _ => {}
                }
            }
            if state.exit_requested() {
                elwt.exit();
            }
        }
        Event::DeviceEvent { ref event, .. } => state.device_input(event),
        Event::AboutToWait => {
            if let Some(rx) = &reload {
                if rx.try_iter().count() > 0 {
                    if let Err(e) = state.reload_shaders() {
                        tracing::error!("shader reload failed, keeping previous pipeline: {e:#}");
                    }
                }
            }
            state.window().request_redraw();
        }
        _ => {}
    })?;
    Ok(())
}

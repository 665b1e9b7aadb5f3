//! # Explorer Application Logic
//!
//! Installs logging, resolves the configuration and hands control to either
//! the windowed frame loop or a single headless render.

use std::sync::mpsc;

use anyhow::{Context, Result};
use fractal::{CpuBackend, ExplorerConfig, ExplorerState, FrameBackend, Viewport};
use render::{OffscreenRenderer, RunOptions, ShaderSources};
use tracing_subscriber::EnvFilter;

use crate::{watcher, Args, Backend, ExecutionMode};

/// Runs the explorer as described by `args`.
///
/// # Errors
///
/// Returns configuration errors, renderer setup failures and I/O errors from
/// writing the headless image.
pub fn run(args: &Args) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = args.resolve_config()?;
    let state = ExplorerState::from_config(&config);
    tracing::info!(
        power = config.fractal.power,
        lod = state.lod.lod(),
        position = ?state.camera.position,
        "explorer configured"
    );

    match args.execution_mode() {
        ExecutionMode::Windowed => run_windowed(args, &config, state),
        ExecutionMode::Headless => run_headless(args, &config, &state),
    }
}

fn run_windowed(args: &Args, config: &ExplorerConfig, state: ExplorerState) -> Result<()> {
    let (reload_tx, reload_rx) = mpsc::channel();

    let _shader_watcher = match &args.shader_dir {
        Some(dir) => match watcher::start(dir, reload_tx) {
            Ok(watcher_instance) => Some(watcher_instance),
            Err(e) => {
                tracing::error!("Failed to start shader watcher: {e:?}");
                None
            }
        },
        None => None,
    };

    let options = RunOptions {
        width: config.view.width,
        height: config.view.height,
        shader_dir: args.shader_dir.clone(),
        reload: Some(reload_rx),
        snapshot_dir: args.snapshot_dir.clone(),
        ..RunOptions::default()
    };
    render::run(state, options)
}

fn run_headless(args: &Args, config: &ExplorerConfig, state: &ExplorerState) -> Result<()> {
    let viewport = Viewport::new(config.view.width, config.view.height);
    let frame = state.frame_params(viewport);

    let backend: Box<dyn FrameBackend> = match args.backend {
        Backend::Cpu => Box::new(CpuBackend::new()),
        Backend::Gpu => {
            let sources = match &args.shader_dir {
                Some(dir) => ShaderSources::load(dir)?,
                None => ShaderSources::builtin(),
            };
            match pollster::block_on(OffscreenRenderer::new(&sources)) {
                Ok(gpu) => Box::new(gpu),
                Err(e) => {
                    tracing::warn!("GPU renderer unavailable, falling back to CPU: {e:#}");
                    Box::new(CpuBackend::new())
                }
            }
        }
    };

    tracing::info!(
        backend = backend.name(),
        width = viewport.width(),
        height = viewport.height(),
        lod = frame.lod.lod,
        precision = ?frame.lod.precision,
        "rendering headless frame"
    );
    let pixels = backend.render_to_vec(&frame).context("headless render failed")?;
    render::snapshot::save_png(&args.output, viewport, &pixels)
}

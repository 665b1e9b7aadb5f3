//! # Mandelbulb Explorer
//!
//! Opens a window onto the Mandelbulb and lets you fly through it. Movement
//! slows down as the surface gets closer, and the level of detail is under
//! keyboard control.
//!
//! With `--headless` a single frame is rendered and written to `--output`
//! instead.

mod app;
mod watcher;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fractal::ExplorerConfig;

/// Command line interface
#[derive(Debug, Parser)]
#[command(name = "explorer", version, about)]
pub struct Args {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Window or image width in pixels
    #[arg(long)]
    pub width: Option<u32>,
    /// Window or image height in pixels
    #[arg(long)]
    pub height: Option<u32>,
    /// Initial level of detail
    #[arg(long)]
    pub lod: Option<f32>,
    /// Mandelbulb power
    #[arg(long)]
    pub power: Option<f32>,
    /// Render one frame to `--output` without opening a window
    #[arg(long)]
    pub headless: bool,
    /// Output image for headless mode
    #[arg(long, default_value = "mandelbulb.png")]
    pub output: PathBuf,
    /// Renderer for headless mode
    #[arg(long, value_enum, default_value_t = Backend::Cpu)]
    pub backend: Backend,
    /// Load WGSL from this directory and reload it when it changes
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,
    /// Where `P` snapshots are written
    #[arg(long, default_value = ".")]
    pub snapshot_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Cpu,
    Gpu,
}

/// Execution mode for the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interactive window
    Windowed,
    /// Single frame to disk
    Headless,
}

impl Args {
    #[must_use]
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.headless {
            ExecutionMode::Headless
        } else {
            ExecutionMode::Windowed
        }
    }

    /// Applies command line overrides on top of `config`.
    pub fn apply(&self, config: &mut ExplorerConfig) {
        if let Some(width) = self.width {
            config.view.width = width;
        }
        if let Some(height) = self.height {
            config.view.height = height;
        }
        if let Some(lod) = self.lod {
            config.lod.initial = lod;
        }
        if let Some(power) = self.power {
            config.fractal.power = power;
        }
    }

    /// Loads the configuration file if any, applies overrides and validates.
    pub fn resolve_config(&self) -> Result<ExplorerConfig> {
        let mut config = match &self.config {
            Some(path) => ExplorerConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?,
            None => ExplorerConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    app::run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let args = Args::parse_from(["explorer", "--width", "320", "--lod", "2.5", "--power", "6"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.view.width, 320);
        assert_eq!(config.view.height, ExplorerConfig::default().view.height);
        assert_eq!(config.lod.initial, 2.5);
        assert_eq!(config.fractal.power, 6.0);
        assert_eq!(args.execution_mode(), ExecutionMode::Windowed);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args::parse_from(["explorer", "--lod", "50"]);
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn oversized_width_is_rejected() {
        let args = Args::parse_from(["explorer", "--headless", "--backend", "gpu", "--width", "10000"]);
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn headless_defaults() {
        let args = Args::parse_from(["explorer", "--headless", "--backend", "gpu"]);
        assert_eq!(args.execution_mode(), ExecutionMode::Headless);
        assert_eq!(args.backend, Backend::Gpu);
        assert_eq!(args.output, PathBuf::from("mandelbulb.png"));
    }
}

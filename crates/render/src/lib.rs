//! wgpu/winit bridge for the Mandelbulb explorer.

pub mod controller;
pub mod gpu_types;
pub mod offscreen;
pub mod pipeline;
pub mod run;
pub mod shader;
pub mod snapshot;
pub mod state;

pub use offscreen::OffscreenRenderer;
pub use run::{run, RunOptions};
pub use shader::{KernelPrecision, ShaderSources};

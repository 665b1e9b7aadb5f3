//! Mandelbulb distance estimation, adaptive level of detail and sphere
//! tracing.
//!
//! This crate holds the CPU reference of everything the GPU kernel does, plus
//! the per-frame state machine that feeds it. Nothing here touches a window
//! or a device.

#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::float_cmp
)]

pub mod backend;
pub mod camera;
pub mod config;
pub mod cpu_backend;
pub mod distance;
pub mod error;
pub mod frame;
pub mod lod;
pub mod navigation;
pub mod shading;
pub mod tracer;

pub use backend::{FrameBackend, Texel};
pub use camera::{CameraRig, ViewBasis, PITCH_LIMIT};
pub use config::ExplorerConfig;
pub use cpu_backend::CpuBackend;
pub use distance::{estimate, estimate_high, estimate_low, estimate_signed, FractalParams, Mandelbulb, Precision};
pub use error::FractalError;
pub use frame::{ExplorerState, FrameParams, FrameStats, InputState, Viewport};
pub use lod::{derive, LodController, LodParams, LodRate};
pub use navigation::{MoveKeys, SpeedPolicy};
pub use tracer::{trace, DistanceEstimator, MarchBudget, TraceOutcome, TraceResult};

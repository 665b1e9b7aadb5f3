//! Level-of-detail controller.
//!
//! A single scalar `lod` drives every quality knob of the renderer and the
//! camera. [`derive`] is a pure function of that scalar so the renderer, the
//! camera speed query and the tests all see identical constants.

use serde::{Deserialize, Serialize};

use crate::distance::Precision;

pub const MIN_LOD: f32 = 0.1;
pub const MAX_LOD: f32 = 10.0;
/// `lod` at and above which the extended precision path is used.
pub const HIGH_PRECISION_LOD: f32 = 2.0;

const BASE_ITERATIONS: f32 = 20.0;
const MIN_ITERATIONS: u32 = 10;
const MAX_ITERATIONS: u32 = 120;

pub const BASE_MIN_STEP: f32 = 0.001;
pub const BASE_STEPS: u32 = 128;
const STEPS_PER_LOD: f32 = 256.0;
/// Hard cap on marching steps per ray.
pub const STEP_CAP: u32 = 4096;

const NORMAL_EPS_FLOOR: f32 = 1e-5;
const NORMAL_EPS_BASE: f32 = 5e-4;

/// Everything the renderer needs that depends on `lod`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodParams {
    pub lod: f32,
    pub iterations: u32,
    /// Convergence threshold of the sphere tracer.
    pub min_step: f32,
    pub max_steps: u32,
    pub precision: Precision,
    /// Finite difference step for normal estimation.
    pub normal_eps: f32,
}

/// Clamps `lod` into `[MIN_LOD, MAX_LOD]`. NaN collapses to the cheapest level.
#[must_use]
pub fn clamp_lod(lod: f32) -> f32 {
    if lod.is_nan() {
        MIN_LOD
    } else {
        lod.clamp(MIN_LOD, MAX_LOD)
    }
}

/// Derives the quality constants for `lod`.
///
/// Every output is monotonic in `lod`: iterations and steps never decrease,
/// the convergence threshold never increases. The `(1 + lod)^2.5` falloff
/// keeps `min_step` well behaved at low `lod` where a plain `lod^3` would blow
/// the threshold up.
#[must_use]
pub fn derive(lod: f32) -> LodParams {
    let lod = clamp_lod(lod);
    let iterations = ((BASE_ITERATIONS * lod).round() as u32).clamp(MIN_ITERATIONS, MAX_ITERATIONS);
    let min_step = BASE_MIN_STEP / (1.0 + lod).powf(2.5);
    let max_steps = (BASE_STEPS + (STEPS_PER_LOD * lod).round() as u32).min(STEP_CAP);
    let precision = if lod >= HIGH_PRECISION_LOD {
        Precision::High
    } else {
        Precision::Low
    };
    let normal_eps = (NORMAL_EPS_BASE / lod).max(NORMAL_EPS_FLOOR);

    LodParams {
        lod,
        iterations,
        min_step,
        max_steps,
        precision,
        normal_eps,
    }
}

/// How fast held LOD keys change the level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodRate {
    /// Multiplier applied per input event.
    pub factor: f32,
    /// Events synthesised per second while a key is held.
    pub events_per_second: f32,
}

impl Default for LodRate {
    fn default() -> Self {
        Self {
            factor: 1.01,
            events_per_second: 60.0,
        }
    }
}

fn direction(increase: bool, decrease: bool) -> i32 {
    i32::from(increase) - i32::from(decrease)
}

/// Applies one discrete input event.
#[must_use]
pub fn adjust(lod: f32, increase: bool, decrease: bool, factor: f32) -> f32 {
    clamp_lod(lod * factor.powi(direction(increase, decrease)))
}

/// Applies held keys over `dt` seconds.
///
/// The change is `factor^(events_per_second * dt)`, so two half-length frames
/// land exactly where one full-length frame does.
#[must_use]
pub fn hold(lod: f32, increase: bool, decrease: bool, dt: f32, rate: &LodRate) -> f32 {
    let dir = direction(increase, decrease);
    if dir == 0 || dt.is_nan() || dt <= 0.0 {
        return clamp_lod(lod);
    }
    let events = rate.events_per_second * dt;
    clamp_lod(lod * rate.factor.powf(dir as f32 * events))
}

/// Process-wide LOD state.
#[derive(Debug, Clone, PartialEq)]
pub struct LodController {
    lod: f32,
    rate: LodRate,
}

impl LodController {
    #[must_use]
    pub fn new(initial: f32, rate: LodRate) -> Self {
        Self {
            lod: clamp_lod(initial),
            rate,
        }
    }

    #[must_use]
    pub fn lod(&self) -> f32 {
        self.lod
    }

    #[must_use]
    pub fn rate(&self) -> LodRate {
        self.rate
    }

    pub fn set(&mut self, lod: f32) {
        self.lod = clamp_lod(lod);
    }

    /// One discrete key event.
    pub fn adjust(&mut self, increase: bool, decrease: bool) -> f32 {
        self.lod = adjust(self.lod, increase, decrease, self.rate.factor);
        self.lod
    }

    /// Held keys over `dt` seconds.
    pub fn hold(&mut self, increase: bool, decrease: bool, dt: f32) -> f32 {
        self.lod = hold(self.lod, increase, decrease, dt, &self.rate);
        self.lod
    }

    #[must_use]
    pub fn params(&self) -> LodParams {
        derive(self.lod)
    }
}

impl Default for LodController {
    fn default() -> Self {
        Self::new(1.0, LodRate::default())
    }
}

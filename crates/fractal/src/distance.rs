//! Mandelbulb distance estimator.
//!
//! The estimator iterates the power-`n` spherical map and returns
//! `0.5 * ln(r) * r / dr`, a conservative bound on the distance to the
//! surface near the set. Two evaluation paths share the same algorithm:
//!
//! - [`estimate_low`] runs entirely in `f32`.
//! - [`estimate_high`] accumulates `z`, `r` and `dr` in `f64` while keeping the
//!   transcendental calls in `f32`. At deep zoom the round-off in the
//!   `z = zr * dir + point` accumulation becomes comparable to the minimum
//!   step and shows up as banding; the wider accumulator suppresses it.
//!
//! The GPU kernel in `crates/render/shaders` mirrors both paths line for line.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::tracer::DistanceEstimator;

/// Radius below which the orbit is treated as sitting on the fractal centre.
pub const MIN_RADIUS: f32 = 1e-12;

/// Upper bound on the iteration budget regardless of caller input.
pub const MAX_ITERATIONS: u32 = 1024;

/// Parameters of the Mandelbulb map for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Exponent of the spherical power map. `1.0` degenerates to a sphere-like field.
    pub power: f32,
    /// Orbit escape radius.
    pub bailout: f32,
    /// Maximum number of map iterations.
    pub iterations: u32,
}

impl FractalParams {
    /// Builds a parameter set, clamping every field into its valid range.
    #[must_use]
    pub fn new(power: f32, bailout: f32, iterations: u32) -> Self {
        let power = if power.is_finite() { power.max(1.0) } else { 8.0 };
        let bailout = if bailout.is_finite() && bailout > 0.0 { bailout } else { 2.0 };
        Self {
            power,
            bailout,
            iterations: iterations.clamp(1, MAX_ITERATIONS),
        }
    }

    #[must_use]
    pub fn with_iterations(self, iterations: u32) -> Self {
        Self::new(self.power, self.bailout, iterations)
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self::new(8.0, 2.0, 20)
    }
}

/// Arithmetic width used to accumulate the orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Everything in `f32`.
    #[default]
    Low,
    /// `f64` accumulation, `f32` transcendentals.
    High,
}

/// Estimated distance from `point` to the surface, never negative and never NaN.
#[must_use]
pub fn estimate(point: Vec3, params: &FractalParams, precision: Precision) -> f32 {
    let d = estimate_signed(point, params, precision);
    if d.is_nan() {
        0.0
    } else {
        d.max(0.0)
    }
}

/// Raw estimator output. Negative inside the set; used for gradients.
#[must_use]
pub fn estimate_signed(point: Vec3, params: &FractalParams, precision: Precision) -> f32 {
    match precision {
        Precision::Low => estimate_low(point, params),
        Precision::High => estimate_high(point, params),
    }
}

/// Single precision evaluation.
#[must_use]
pub fn estimate_low(point: Vec3, params: &FractalParams) -> f32 {
    let power = params.power;
    let mut z = point;
    let mut dr = 1.0_f32;
    let mut r = 0.0_f32;

    for _ in 0..params.iterations {
        r = z.length();
        if r > params.bailout {
            break;
        }

        let theta = (z.z / r.max(MIN_RADIUS)).clamp(-1.0, 1.0).acos() * power;
        let phi = z.y.atan2(z.x) * power;

        dr = r.powf(power - 1.0) * power * dr + 1.0;
        let zr = r.powf(power);

        z = zr * spherical(theta, phi) + point;
    }

    if r < MIN_RADIUS {
        return 0.0;
    }
    0.5 * r.ln() * r / dr
}

/// Extended precision accumulation with single precision transcendentals.
#[must_use]
pub fn estimate_high(point: Vec3, params: &FractalParams) -> f32 {
    let power = params.power;
    let bailout = f64::from(params.bailout);
    let origin = point.as_dvec3();
    let mut z = origin;
    let mut dr = 1.0_f64;
    let mut r = 0.0_f64;

    for _ in 0..params.iterations {
        r = z.length();
        if r > bailout {
            break;
        }

        let r_f = r as f32;
        let cos_theta = (z.z / r.max(f64::from(MIN_RADIUS))) as f32;
        let theta = cos_theta.clamp(-1.0, 1.0).acos() * power;
        let phi = (z.y as f32).atan2(z.x as f32) * power;

        dr = f64::from(r_f.powf(power - 1.0) * power) * dr + 1.0;
        let zr = r_f.powf(power);

        z = (zr * spherical(theta, phi)).as_dvec3() + origin;
    }

    if r < f64::from(MIN_RADIUS) {
        return 0.0;
    }
    (0.5 * f64::from((r as f32).ln()) * r / dr) as f32
}

#[inline]
fn spherical(theta: f32, phi: f32) -> Vec3 {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// A Mandelbulb bound to one parameter set and precision mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mandelbulb {
    pub params: FractalParams,
    pub precision: Precision,
}

impl Mandelbulb {
    #[must_use]
    pub const fn new(params: FractalParams, precision: Precision) -> Self {
        Self { params, precision }
    }
}

impl DistanceEstimator for Mandelbulb {
    fn distance(&self, point: Vec3) -> f32 {
        estimate(point, &self.params, self.precision)
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        estimate_signed(point, &self.params, self.precision)
    }
}

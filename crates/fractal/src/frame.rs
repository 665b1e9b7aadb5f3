//! Per-frame state update and the parameter set handed to renderers.
//!
//! [`ExplorerState::advance`] is the only place the camera and the LOD are
//! mutated. It runs once per frame on the control thread and the
//! [`FrameParams`] it yields are read-only for every pixel.

use glam::Vec3;
use tracing::{debug, info};

use crate::camera::{CameraRig, ViewBasis};
use crate::config::{ExplorerConfig, MAX_POWER, MIN_POWER};
use crate::distance::{estimate, FractalParams, Mandelbulb};
use crate::lod::{derive, LodController, LodParams};
use crate::navigation::{displacement, MoveKeys, SpeedPolicy};
use crate::shading::pixel_color;
use crate::tracer::{trace, MarchBudget, TraceResult};

/// Output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// A viewport of at least one pixel in each direction.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Screen coordinates of the centre of pixel `(x, y)`, row 0 at the top.
    /// `v` spans `[-1, 1]` and `u` is scaled by the aspect ratio.
    #[must_use]
    pub fn uv(&self, x: u32, y: u32) -> (f32, f32) {
        let fx = (x as f32 + 0.5) / self.width as f32;
        let fy = (y as f32 + 0.5) / self.height as f32;
        ((fx - 0.5) * 2.0 * self.aspect(), (0.5 - fy) * 2.0)
    }
}

/// Everything a renderer reads to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub viewport: Viewport,
    pub position: Vec3,
    pub basis: ViewBasis,
    pub lod: LodParams,
    pub fractal: FractalParams,
    pub max_distance: f32,
    pub time: f32,
    pub palette_speed: f32,
}

impl FrameParams {
    #[must_use]
    pub fn mandelbulb(&self) -> Mandelbulb {
        Mandelbulb::new(self.fractal.with_iterations(self.lod.iterations), self.lod.precision)
    }

    #[must_use]
    pub fn budget(&self) -> MarchBudget {
        MarchBudget::from_lod(&self.lod, self.max_distance)
    }

    #[must_use]
    pub fn palette_phase(&self) -> f32 {
        self.palette_speed * self.time
    }

    #[must_use]
    pub fn ray_direction(&self, x: u32, y: u32) -> Vec3 {
        let (u, v) = self.viewport.uv(x, y);
        self.basis.ray_direction(u, v)
    }

    #[must_use]
    pub fn trace_pixel(&self, x: u32, y: u32) -> TraceResult {
        trace(&self.mandelbulb(), self.position, self.ray_direction(x, y), &self.budget())
    }

    /// Linear RGB of pixel `(x, y)` in `[0, 1]`.
    #[must_use]
    pub fn render_pixel(&self, x: u32, y: u32) -> Vec3 {
        let result = self.trace_pixel(x, y);
        pixel_color(&self.mandelbulb(), &result, &self.lod, self.palette_phase())
    }
}

/// Keys held during the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub movement: MoveKeys,
    pub lod_up: bool,
    pub lod_down: bool,
}

/// What one call to [`ExplorerState::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub lod: LodParams,
    /// Distance from the camera to the surface before moving.
    pub distance: f32,
    pub speed: f32,
}

/// Mutable explorer state: camera, LOD and fractal shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerState {
    pub camera: CameraRig,
    pub lod: LodController,
    power: f32,
    bailout: f32,
    pub speed: SpeedPolicy,
    pub max_distance: f32,
    pub palette_speed: f32,
    time: f32,
}

impl ExplorerState {
    #[must_use]
    pub fn from_config(config: &ExplorerConfig) -> Self {
        let camera = CameraRig::looking_at(config.camera.position, config.camera.target, config.camera.sensitivity);
        Self {
            camera,
            lod: LodController::new(config.lod.initial, config.lod.rate()),
            power: config.fractal.power.clamp(MIN_POWER, MAX_POWER),
            bailout: config.fractal.bailout,
            speed: config.camera.speed_policy(),
            max_distance: config.view.max_distance,
            palette_speed: config.view.palette_speed,
            time: 0.0,
        }
    }

    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Fractal parameters at the current LOD.
    #[must_use]
    pub fn fractal_params(&self) -> FractalParams {
        FractalParams::new(self.power, self.bailout, self.lod.params().iterations)
    }

    /// Steps the power by `step`, clamped to the keyboard range.
    pub fn adjust_power(&mut self, step: f32) -> f32 {
        let power = (self.power + step).clamp(MIN_POWER, MAX_POWER);
        if power != self.power {
            info!(power, "fractal power changed");
        }
        self.power = power;
        power
    }

    /// Applies one frame of input: LOD first, then a single distance query
    /// at the camera to scale movement, then the move itself.
    pub fn advance(&mut self, input: &InputState, dt: f32) -> FrameStats {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let before = self.lod.params().precision;
        self.lod.hold(input.lod_up, input.lod_down, dt);
        let lod = derive(self.lod.lod());
        if lod.precision != before {
            info!(lod = lod.lod, precision = ?lod.precision, "precision mode switched");
        }

        let params = FractalParams::new(self.power, self.bailout, lod.iterations);
        let distance = estimate(self.camera.position, &params, lod.precision);
        let speed = self.speed.speed(distance);

        if input.movement.any() {
            let basis = self.camera.basis();
            self.camera.position += displacement(input.movement, &basis, speed, dt);
        }
        self.time += dt;

        debug!(lod = lod.lod, distance, speed, "frame advanced");
        FrameStats { lod, distance, speed }
    }

    /// Snapshot of the current state for a renderer.
    #[must_use]
    pub fn frame_params(&self, viewport: Viewport) -> FrameParams {
        let lod = self.lod.params();
        FrameParams {
            viewport,
            position: self.camera.position,
            basis: self.camera.basis(),
            lod,
            fractal: FractalParams::new(self.power, self.bailout, lod.iterations),
            max_distance: self.max_distance,
            time: self.time,
            palette_speed: self.palette_speed,
        }
    }
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self::from_config(&ExplorerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Precision;

    #[test]
    fn uv_is_centred_and_aspect_scaled() {
        let viewport = Viewport::new(4, 2);
        let (u, v) = viewport.uv(0, 0);
        assert!((u + 1.5).abs() < 1e-6);
        assert!((v - 0.5).abs() < 1e-6);
        let (u, v) = viewport.uv(3, 1);
        assert!((u - 1.5).abs() < 1e-6);
        assert!((v + 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_viewport_is_widened() {
        assert_eq!(Viewport::new(0, 0).pixel_count(), 1);
    }

    #[test]
    fn advance_moves_forward_at_capped_speed() {
        let mut state = ExplorerState::default();
        let start = state.camera.position;
        let input = InputState {
            movement: MoveKeys {
                forward: true,
                ..MoveKeys::default()
            },
            ..InputState::default()
        };
        let stats = state.advance(&input, 0.1);
        assert!(stats.distance > 0.0);
        let moved = state.camera.position - start;
        assert!((moved.length() - stats.speed * 0.1).abs() < 1e-6);
        assert!(moved.z > 0.0);
        assert!((state.time() - 0.1).abs() < 1e-7);
    }

    #[test]
    fn holding_lod_up_switches_precision() {
        let mut state = ExplorerState::default();
        let input = InputState {
            lod_up: true,
            ..InputState::default()
        };
        for _ in 0..200 {
            state.advance(&input, 1.0 / 60.0);
        }
        assert!(state.lod.lod() > 2.0);
        assert_eq!(state.frame_params(Viewport::new(8, 8)).lod.precision, Precision::High);
    }

    #[test]
    fn power_is_clamped() {
        let mut state = ExplorerState::default();
        for _ in 0..20 {
            state.adjust_power(1.0);
        }
        assert_eq!(state.power(), MAX_POWER);
        for _ in 0..20 {
            state.adjust_power(-1.0);
        }
        assert_eq!(state.power(), MIN_POWER);
    }

    #[test]
    fn frame_params_carry_lod_iterations() {
        let state = ExplorerState::default();
        let frame = state.frame_params(Viewport::new(16, 9));
        assert_eq!(frame.fractal.iterations, frame.lod.iterations);
        assert_eq!(frame.mandelbulb().params.iterations, 20);
    }
}

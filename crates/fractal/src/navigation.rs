//! Distance-scaled camera movement.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::ViewBasis;

/// Maps the distance to the surface onto a movement speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedPolicy {
    pub zoom_factor: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self {
            zoom_factor: 0.5,
            min_speed: 1e-8,
            max_speed: 0.5,
        }
    }
}

impl SpeedPolicy {
    /// Speed in world units per second at `distance` from the surface.
    ///
    /// Proportional to the distance between the two bounds. A NaN distance
    /// falls back to the slowest speed.
    #[must_use]
    pub fn speed(&self, distance: f32) -> f32 {
        camera_speed(distance, self.zoom_factor, self.min_speed, self.max_speed)
    }
}

#[must_use]
pub fn camera_speed(distance: f32, zoom_factor: f32, min_speed: f32, max_speed: f32) -> f32 {
    let speed = distance * zoom_factor;
    if speed.is_nan() {
        return min_speed;
    }
    speed.clamp(min_speed, max_speed)
}

/// Planar movement keys held during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    #[must_use]
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Displacement for one frame. Every held key contributes `speed * dt` along
/// its axis; diagonals are not normalised.
#[must_use]
pub fn displacement(keys: MoveKeys, basis: &ViewBasis, speed: f32, dt: f32) -> Vec3 {
    let step = speed * dt;
    let mut delta = Vec3::ZERO;
    if keys.forward {
        delta += basis.forward * step;
    }
    if keys.backward {
        delta -= basis.forward * step;
    }
    if keys.right {
        delta += basis.right * step;
    }
    if keys.left {
        delta -= basis.right * step;
    }
    delta
}

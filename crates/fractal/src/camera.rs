//! First-person camera rig.
//!
//! Orientation is stored as yaw and pitch only. The view basis is rebuilt from
//! those two angles on every query so it can never drift away from
//! orthonormal.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

/// Pitch stays strictly inside `(-PITCH_LIMIT, PITCH_LIMIT)`.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orthonormal camera frame.
///
/// `right × up = -forward`, so `{right, up, -forward}` is the usual
/// right-handed view frame looking down its local `-Z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl ViewBasis {
    /// Columns `(right, up, forward)` padded to `vec4` for a WGSL `mat3x3<f32>`.
    #[must_use]
    pub fn to_cols(&self) -> [[f32; 4]; 3] {
        [
            self.right.extend(0.0).to_array(),
            self.up.extend(0.0).to_array(),
            self.forward.extend(0.0).to_array(),
        ]
    }

    /// Direction of the ray through normalised screen coordinates `(u, v)`.
    #[must_use]
    pub fn ray_direction(&self, u: f32, v: f32) -> Vec3 {
        (self.right * u + self.up * v + self.forward).normalize()
    }
}

/// Position plus yaw/pitch orientation driven by pointer deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    sensitivity: f32,
    calibrated: bool,
}

impl CameraRig {
    #[must_use]
    pub fn new(position: Vec3, sensitivity: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            sensitivity,
            calibrated: false,
        }
    }

    /// Rig at `position` already turned towards `target`.
    #[must_use]
    pub fn looking_at(position: Vec3, target: Vec3, sensitivity: f32) -> Self {
        let mut rig = Self::new(position, sensitivity);
        rig.look_at(target);
        rig
    }

    /// Turns towards `target`. A target at the camera position is ignored.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.set_orientation(dir.x.atan2(dir.z), dir.y.clamp(-1.0, 1.0).asin());
    }

    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[must_use]
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        if yaw.is_finite() {
            self.yaw = wrap_angle(yaw);
        }
        if pitch.is_finite() {
            self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }

    /// Marks the pointer as freshly acquired; the next delta only calibrates.
    pub fn reacquire(&mut self) {
        self.calibrated = false;
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Applies a pointer delta in screen units. Returns whether the
    /// orientation changed.
    ///
    /// Screen-space `y` grows downwards, hence the sign flip on pitch.
    pub fn on_pointer_delta(&mut self, dx: f64, dy: f64) -> bool {
        if !self.calibrated {
            self.calibrated = true;
            return false;
        }
        if !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let yaw = self.yaw - dx as f32 * self.sensitivity;
        let pitch = self.pitch + (-dy) as f32 * self.sensitivity;
        self.set_orientation(yaw, pitch);
        true
    }

    #[must_use]
    pub fn basis(&self) -> ViewBasis {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let forward = Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        ViewBasis { forward, right, up }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_only_calibrates() {
        let mut rig = CameraRig::new(Vec3::ZERO, 0.002);
        assert!(!rig.is_calibrated());
        assert!(!rig.on_pointer_delta(500.0, -300.0));
        assert!(rig.is_calibrated());
        assert_eq!(rig.yaw(), 0.0);
        assert_eq!(rig.pitch(), 0.0);

        assert!(rig.on_pointer_delta(10.0, 0.0));
        assert!((rig.yaw() + 0.02).abs() < 1e-6);

        rig.reacquire();
        assert!(!rig.is_calibrated());
        assert!(!rig.on_pointer_delta(1000.0, 1000.0));
        assert!((rig.yaw() + 0.02).abs() < 1e-6);
    }

    #[test]
    fn moving_pointer_up_raises_pitch() {
        let mut rig = CameraRig::new(Vec3::ZERO, 0.01);
        rig.on_pointer_delta(0.0, 0.0);
        rig.on_pointer_delta(0.0, -10.0);
        assert!(rig.pitch() > 0.0);
    }

    #[test]
    fn default_orientation_looks_down_positive_z() {
        let basis = CameraRig::new(Vec3::ZERO, 0.002).basis();
        assert!((basis.forward - Vec3::Z).length() < 1e-6);
        assert!((basis.up - Vec3::Y).length() < 1e-6);
        assert!((basis.right + Vec3::X).length() < 1e-6);
        assert!((basis.right.cross(basis.up) + basis.forward).length() < 1e-6);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let rig = CameraRig::looking_at(Vec3::new(0.0, 0.0, -2.5), Vec3::ZERO, 0.002);
        assert!((rig.basis().forward - Vec3::Z).length() < 1e-5);

        let rig = CameraRig::looking_at(Vec3::new(3.0, 1.0, 2.0), Vec3::ZERO, 0.002);
        let expected = (Vec3::ZERO - Vec3::new(3.0, 1.0, 2.0)).normalize();
        assert!((rig.basis().forward - expected).length() < 1e-5);
    }

    #[test]
    fn non_finite_deltas_are_ignored() {
        let mut rig = CameraRig::new(Vec3::ZERO, 0.002);
        rig.on_pointer_delta(0.0, 0.0);
        assert!(!rig.on_pointer_delta(f64::NAN, 1.0));
        assert!(!rig.on_pointer_delta(1.0, f64::INFINITY));
        assert_eq!(rig.pitch(), 0.0);
    }

    #[test]
    fn basis_columns_are_padded() {
        let cols = CameraRig::new(Vec3::ZERO, 0.002).basis().to_cols();
        assert_eq!(cols[2], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(cols[0][3], 0.0);
    }
}

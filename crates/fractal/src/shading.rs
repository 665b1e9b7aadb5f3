//! Surface colouring for traced rays.

use glam::Vec3;

use crate::lod::LodParams;
use crate::tracer::{DistanceEstimator, TraceResult};

/// Colour of rays that escape.
pub const MISS_COLOR: Vec3 = Vec3::new(0.05, 0.1, 0.2);

/// Step count at which the occlusion proxy saturates.
pub const AO_STEPS: f32 = 128.0;

const PALETTE_OFFSET: Vec3 = Vec3::new(0.0, 0.6, 1.2);

#[must_use]
pub fn light_dir() -> Vec3 {
    Vec3::ONE.normalize()
}

#[must_use]
pub fn miss_color() -> Vec3 {
    MISS_COLOR
}

/// Gradient of the signed field by central differences. Returns zero instead
/// of NaN when the gradient vanishes or is not finite.
#[must_use]
pub fn estimate_normal<D>(de: &D, point: Vec3, eps: f32) -> Vec3
where
    D: DistanceEstimator + ?Sized,
{
    let dx = Vec3::new(eps, 0.0, 0.0);
    let dy = Vec3::new(0.0, eps, 0.0);
    let dz = Vec3::new(0.0, 0.0, eps);
    let gradient = Vec3::new(
        de.signed_distance(point + dx) - de.signed_distance(point - dx),
        de.signed_distance(point + dy) - de.signed_distance(point - dy),
        de.signed_distance(point + dz) - de.signed_distance(point - dz),
    );
    gradient.normalize_or_zero()
}

/// Cheap occlusion term: rays that needed many steps are darker.
#[must_use]
pub fn ambient_occlusion(steps: u32) -> f32 {
    1.0 - 0.5 * smoothstep(0.0, 1.0, steps as f32 / AO_STEPS)
}

/// Cosine palette keyed on world position and `lod`. `phase` shifts it over time.
#[must_use]
pub fn base_color(position: Vec3, lod: f32, phase: f32) -> Vec3 {
    let arg = position * (0.05 * (1.0 + 0.1 * lod)) + PALETTE_OFFSET + Vec3::splat(phase);
    Vec3::splat(0.5) + 0.5 * Vec3::new(arg.x.cos(), arg.y.cos(), arg.z.cos())
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// A shaded point on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

/// Lights a surface point. Output channels lie in `[0, 1]`.
#[must_use]
pub fn light(position: Vec3, normal: Vec3, steps: u32, lod: f32, phase: f32) -> Vec3 {
    let diffuse = normal.dot(light_dir()).max(0.0);
    let ao = ambient_occlusion(steps);
    let color = base_color(position, lod, phase) * (0.7 * diffuse + 0.3) * ao;
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Shades a trace result, returning `None` for rays that escaped.
#[must_use]
pub fn shade<D>(de: &D, result: &TraceResult, lod: &LodParams, phase: f32) -> Option<SurfacePoint>
where
    D: DistanceEstimator + ?Sized,
{
    if !result.outcome.is_surface() {
        return None;
    }
    let normal = estimate_normal(de, result.point, lod.normal_eps);
    Some(SurfacePoint {
        position: result.point,
        normal,
        color: light(result.point, normal, result.steps, lod.lod, phase),
    })
}

/// Final colour of a pixel whatever the outcome.
#[must_use]
pub fn pixel_color<D>(de: &D, result: &TraceResult, lod: &LodParams, phase: f32) -> Vec3
where
    D: DistanceEstimator + ?Sized,
{
    shade(de, result, lod, phase).map_or_else(miss_color, |surface| surface.color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod::derive;
    use crate::tracer::TraceOutcome;

    struct Sphere;

    impl DistanceEstimator for Sphere {
        fn distance(&self, point: Vec3) -> f32 {
            (point.length() - 1.0).max(0.0)
        }

        fn signed_distance(&self, point: Vec3) -> f32 {
            point.length() - 1.0
        }
    }

    struct Flat;

    impl DistanceEstimator for Flat {
        fn distance(&self, _point: Vec3) -> f32 {
            0.0
        }
    }

    fn result(outcome: TraceOutcome, point: Vec3, steps: u32) -> TraceResult {
        TraceResult {
            outcome,
            point,
            distance: 1.0,
            steps,
        }
    }

    #[test]
    fn sphere_normal_points_outwards() {
        let n = estimate_normal(&Sphere, Vec3::new(0.0, 1.0, 0.0), 1e-3);
        assert!((n - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn flat_field_gives_zero_normal() {
        assert_eq!(estimate_normal(&Flat, Vec3::ONE, 1e-4), Vec3::ZERO);
    }

    #[test]
    fn occlusion_darkens_with_steps() {
        assert_eq!(ambient_occlusion(0), 1.0);
        assert!(ambient_occlusion(64) < ambient_occlusion(10));
        assert!((ambient_occlusion(128) - 0.5).abs() < 1e-6);
        assert!((ambient_occlusion(10_000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn escaped_rays_use_the_background() {
        let lod = derive(1.0);
        let miss = result(TraceOutcome::Miss, Vec3::splat(100.0), 3);
        assert!(shade(&Sphere, &miss, &lod, 0.0).is_none());
        assert_eq!(pixel_color(&Sphere, &miss, &lod, 0.0), MISS_COLOR);
    }

    #[test]
    fn exhausted_rays_are_shaded() {
        let lod = derive(1.0);
        let exhausted = result(TraceOutcome::Exhausted, Vec3::new(0.0, 0.0, -1.0), 384);
        assert!(shade(&Sphere, &exhausted, &lod, 0.0).is_some());
    }

    #[test]
    fn colors_stay_in_unit_range() {
        let rng = fastrand::Rng::with_seed(11);
        for _ in 0..500 {
            let p = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5) * 200.0;
            let n = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5).normalize_or_zero();
            let c = light(p, n, rng.u32(0..5000), rng.f32() * 10.0, rng.f32() * 100.0);
            assert!(c.cmpge(Vec3::ZERO).all() && c.cmple(Vec3::ONE).all(), "{c}");
        }
    }
}

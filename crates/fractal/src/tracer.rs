//! Sphere tracing against a [`DistanceEstimator`].

use glam::Vec3;

use crate::lod::LodParams;

/// Rays that travel further than this are treated as escaping.
pub const MAX_DISTANCE: f32 = 100.0;

/// A conservative distance function.
pub trait DistanceEstimator {
    /// Lower bound on the distance from `point` to the surface.
    fn distance(&self, point: Vec3) -> f32;

    /// Signed variant used for gradients; defaults to [`Self::distance`].
    fn signed_distance(&self, point: Vec3) -> f32 {
        self.distance(point)
    }
}

/// Termination policy for one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchBudget {
    /// Convergence threshold.
    pub min_step: f32,
    /// Hard cap on DE evaluations.
    pub max_steps: u32,
    pub max_distance: f32,
}

impl MarchBudget {
    #[must_use]
    pub fn from_lod(lod: &LodParams, max_distance: f32) -> Self {
        Self {
            min_step: lod.min_step,
            max_steps: lod.max_steps,
            max_distance,
        }
    }
}

/// How a traced ray ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceOutcome {
    /// Converged below the minimum step.
    Hit,
    /// Left the distance budget, or the estimator stopped producing finite values.
    Miss,
    /// Ran out of steps while still inside the distance budget.
    Exhausted,
}

impl TraceOutcome {
    /// Whether the ray is shaded as surface. Exhausted rays count.
    #[must_use]
    pub fn is_surface(self) -> bool {
        matches!(self, Self::Hit | Self::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub outcome: TraceOutcome,
    /// Last point evaluated, or the clamped end point on a miss.
    pub point: Vec3,
    pub distance: f32,
    /// DE evaluations that advanced the ray.
    pub steps: u32,
}

impl TraceResult {
    #[must_use]
    pub fn hit(&self) -> bool {
        self.outcome == TraceOutcome::Hit
    }
}

/// Marches from `origin` along unit `direction`.
///
/// At most `budget.max_steps` evaluations are made whatever the estimator
/// returns, which is the only liveness guarantee of a frame.
#[must_use]
pub fn trace<D>(de: &D, origin: Vec3, direction: Vec3, budget: &MarchBudget) -> TraceResult
where
    D: DistanceEstimator + ?Sized,
{
    let mut traveled = 0.0_f32;
    let mut point = origin;
    let mut steps = 0;

    for _ in 0..budget.max_steps {
        point = origin + direction * traveled;
        let d = de.distance(point);

        if d < budget.min_step {
            return TraceResult {
                outcome: TraceOutcome::Hit,
                point,
                distance: traveled,
                steps,
            };
        }
        if !d.is_finite() {
            return miss(origin, direction, budget.max_distance, steps);
        }

        traveled += d;
        steps += 1;

        if traveled > budget.max_distance {
            return miss(origin, direction, budget.max_distance, steps);
        }
    }

    TraceResult {
        outcome: TraceOutcome::Exhausted,
        point,
        distance: traveled,
        steps,
    }
}

fn miss(origin: Vec3, direction: Vec3, max_distance: f32, steps: u32) -> TraceResult {
    TraceResult {
        outcome: TraceOutcome::Miss,
        point: origin + direction * max_distance,
        distance: max_distance,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plane {
        z: f32,
    }

    impl DistanceEstimator for Plane {
        fn distance(&self, point: Vec3) -> f32 {
            (self.z - point.z).abs()
        }
    }

    fn budget() -> MarchBudget {
        MarchBudget {
            min_step: 1e-3,
            max_steps: 64,
            max_distance: MAX_DISTANCE,
        }
    }

    #[test]
    fn converges_on_a_plane() {
        let result = trace(&Plane { z: 5.0 }, Vec3::ZERO, Vec3::Z, &budget());
        assert!(result.hit());
        assert!((result.distance - 5.0).abs() < 1e-3);
        assert!((result.point.z - 5.0).abs() < 1e-3);
    }

    #[test]
    fn escapes_past_max_distance() {
        let result = trace(&Plane { z: 500.0 }, Vec3::ZERO, Vec3::Z, &budget());
        assert_eq!(result.outcome, TraceOutcome::Miss);
        assert_eq!(result.distance, MAX_DISTANCE);
        assert_eq!(result.steps, 1);
    }

    struct Constant(f32);

    impl DistanceEstimator for Constant {
        fn distance(&self, _point: Vec3) -> f32 {
            self.0
        }
    }

    #[test]
    fn zero_distance_hits_without_stepping() {
        let result = trace(&Constant(0.0), Vec3::ZERO, Vec3::X, &budget());
        assert!(result.hit());
        assert_eq!(result.steps, 0);
        assert_eq!(result.point, Vec3::ZERO);
    }

    #[test]
    fn stalled_ray_exhausts_the_step_budget() {
        let result = trace(&Constant(2e-3), Vec3::ZERO, Vec3::X, &budget());
        assert_eq!(result.outcome, TraceOutcome::Exhausted);
        assert_eq!(result.steps, 64);
        assert!(result.outcome.is_surface());
    }

    #[test]
    fn non_finite_distance_counts_as_miss() {
        for d in [f32::NAN, f32::INFINITY] {
            let result = trace(&Constant(d), Vec3::ZERO, Vec3::X, &budget());
            assert_eq!(result.outcome, TraceOutcome::Miss);
            assert!(!result.outcome.is_surface());
            assert!(result.point.is_finite());
        }
    }

    #[test]
    fn random_estimators_respect_the_step_cap() {
        let rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let budget = MarchBudget {
                min_step: 1e-4,
                max_steps: rng.u32(0..256),
                max_distance: MAX_DISTANCE,
            };
            let de = Constant(rng.f32() * 0.01);
            let result = trace(&de, Vec3::ZERO, Vec3::Z, &budget);
            assert!(result.steps <= budget.max_steps);
            assert!(result.distance <= budget.max_distance);
        }
    }

    #[test]
    fn zero_steps_is_exhausted_at_origin() {
        let budget = MarchBudget { max_steps: 0, ..budget() };
        let result = trace(&Plane { z: 5.0 }, Vec3::ONE, Vec3::Z, &budget);
        assert_eq!(result.outcome, TraceOutcome::Exhausted);
        assert_eq!(result.point, Vec3::ONE);
        assert_eq!(result.steps, 0);
    }
}

//! GPU-compatible type definitions for rendering
//!
//! Layouts here mirror the `Frame` struct in `shaders/mandelbulb.wgsl` byte for
//! byte. All types must be Pod and follow uniform address space alignment.

use bytemuck::{Pod, Zeroable};
use fractal::{FrameParams, Precision};

/// Per-frame uniform consumed by the tracer kernel. 112 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    /// Viewport size in pixels
    pub resolution: [f32; 2],
    pub lod: f32,
    /// Palette phase in radians, i.e. palette speed times elapsed time
    pub time: f32,
    /// Camera position, `w` unused
    pub position: [f32; 4],
    /// Column-major `mat3x3<f32>`: right, up, forward, each padded to 16 bytes
    pub basis: [[f32; 4]; 3],
    pub power: f32,
    pub bailout: f32,
    pub min_step: f32,
    pub max_distance: f32,
    /// Finite difference step for normals
    pub normal_eps: f32,
    pub iterations: u32,
    pub max_steps: u32,
    /// Non-zero selects the high precision distance estimate
    pub high_precision: u32,
}

impl From<&FrameParams> for FrameUniform {
    fn from(frame: &FrameParams) -> Self {
        Self {
            resolution: [frame.viewport.width() as f32, frame.viewport.height() as f32],
            lod: frame.lod.lod,
            time: frame.palette_phase(),
            position: frame.position.extend(1.0).to_array(),
            basis: frame.basis.to_cols(),
            power: frame.fractal.power,
            bailout: frame.fractal.bailout,
            min_step: frame.lod.min_step,
            max_distance: frame.max_distance,
            normal_eps: frame.lod.normal_eps,
            iterations: frame.lod.iterations,
            max_steps: frame.lod.max_steps,
            high_precision: u32::from(frame.lod.precision == Precision::High),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal::{ExplorerState, Viewport};
    use std::mem::{offset_of, size_of};

    #[test]
    fn uniform_layout_matches_the_kernel() {
        assert_eq!(size_of::<FrameUniform>(), 112);
        assert_eq!(offset_of!(FrameUniform, position), 16);
        assert_eq!(offset_of!(FrameUniform, basis), 32);
        assert_eq!(offset_of!(FrameUniform, power), 80);
        assert_eq!(offset_of!(FrameUniform, normal_eps), 96);
        assert_eq!(offset_of!(FrameUniform, high_precision), 108);
    }

    #[test]
    fn uniform_mirrors_frame_params() {
        let mut state = ExplorerState::default();
        state.lod.set(3.0);
        let frame = state.frame_params(Viewport::new(640, 480));
        let uniform = FrameUniform::from(&frame);

        assert_eq!(uniform.resolution, [640.0, 480.0]);
        assert_eq!(uniform.iterations, 60);
        assert_eq!(uniform.high_precision, 1);
        assert_eq!(uniform.basis[2], frame.basis.forward.extend(0.0).to_array());
        assert_eq!(uniform.position[..3], frame.position.to_array());
        assert_eq!(bytemuck::bytes_of(&uniform).len(), 112);
    }
}

use glam::Vec3;
use rayon::prelude::*;

use crate::backend::{check_buffer, FrameBackend, Texel};
use crate::error::FractalError;
use crate::frame::FrameParams;

/// Reference renderer. Rows are traced in parallel on the rayon pool.
#[derive(Default, Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FrameBackend for CpuBackend {
    fn render(&self, frame: &FrameParams, pixels: &mut [Texel]) -> Result<(), FractalError> {
        check_buffer(frame, pixels)?;
        let width = frame.viewport.width() as usize;

        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, texel) in row.iter_mut().enumerate() {
                    *texel = encode_color(frame.render_pixel(x as u32, y as u32));
                }
            });

        tracing::debug!(
            width = frame.viewport.width(),
            height = frame.viewport.height(),
            lod = frame.lod.lod,
            "cpu frame rendered"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}

/// Quantises a `[0, 1]` colour to an opaque RGBA8 texel.
#[must_use]
pub fn encode_color(color: Vec3) -> Texel {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

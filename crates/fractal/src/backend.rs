use crate::error::FractalError;
use crate::frame::FrameParams;

/// An 8-bit RGBA texel. Colours are written unmodified, with no gamma curve.
pub type Texel = [u8; 4];

pub trait FrameBackend: Send + Sync {
    /// Renders one frame into `pixels`, row-major with row 0 at the top.
    ///
    /// Returns `FractalError::BufferSize` if `pixels` does not hold exactly
    /// `frame.viewport.pixel_count()` texels.
    fn render(&self, frame: &FrameParams, pixels: &mut [Texel]) -> Result<(), FractalError>;

    /// Human readable backend name for logs.
    fn name(&self) -> &'static str;

    /// Renders into a freshly allocated buffer.
    fn render_to_vec(&self, frame: &FrameParams) -> Result<Vec<Texel>, FractalError> {
        let mut pixels = vec![[0; 4]; frame.viewport.pixel_count()];
        self.render(frame, &mut pixels)?;
        Ok(pixels)
    }
}

/// Checks that `pixels` matches the frame viewport.
pub fn check_buffer(frame: &FrameParams, pixels: &[Texel]) -> Result<(), FractalError> {
    let expected = frame.viewport.pixel_count();
    if pixels.len() == expected {
        Ok(())
    } else {
        Err(FractalError::BufferSize {
            expected,
            actual: pixels.len(),
        })
    }
}

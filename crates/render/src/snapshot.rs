//! PNG snapshots of rendered frames.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fractal::{Texel, Viewport};

/// `dir/mandelbulb-<local timestamp>.png`.
#[must_use]
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    dir.join(format!("mandelbulb-{stamp}.png"))
}

/// Writes `pixels` (row-major, row 0 at the top) as an RGBA PNG.
pub fn save_png(path: &Path, viewport: Viewport, pixels: &[Texel]) -> Result<()> {
    let bytes: Vec<u8> = bytemuck::cast_slice(pixels).to_vec();
    let image = image::RgbaImage::from_raw(viewport.width(), viewport.height(), bytes)
        .context("pixel buffer does not match the viewport")?;
    image
        .save(path)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    tracing::info!(path = %path.display(), width = viewport.width(), height = viewport.height(), "snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_has_png_extension_and_prefix() {
        let path = timestamped_path(Path::new("shots"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("mandelbulb-"), "{name}");
        assert!(path.starts_with("shots"));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let path = std::env::temp_dir().join("mandelbulb-mismatch.png");
        let err = save_png(&path, Viewport::new(4, 4), &[[0; 4]; 3]);
        assert!(err.is_err());
    }

    #[test]
    fn png_round_trips_pixels() {
        let viewport = Viewport::new(3, 2);
        let pixels: Vec<Texel> = (0..6u8).map(|i| [i * 40, 255 - i * 40, i, 255]).collect();
        let path = std::env::temp_dir().join(format!("mandelbulb-roundtrip-{}.png", std::process::id()));
        save_png(&path, viewport, &pixels).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 0).0, pixels[1]);
        assert_eq!(decoded.get_pixel(2, 1).0, pixels[5]);
        let _ = std::fs::remove_file(path);
    }
}

//! Renders frames into a texture and reads them back.
//!
//! Used for `P` snapshots from the window and for GPU headless renders. The
//! target is `Rgba8Unorm`, so the bytes read back are exactly what the kernel
//! wrote, with no gamma curve applied.

use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use fractal::backend::check_buffer;
use fractal::{FractalError, FrameBackend, FrameParams, Texel};

use crate::gpu_types::FrameUniform;
use crate::pipeline;
use crate::shader::{KernelPrecision, ShaderSources};

pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct OffscreenRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad: wgpu::Buffer,
    precision: KernelPrecision,
}

impl OffscreenRenderer {
    /// Creates a renderer on its own headless device.
    pub async fn new(sources: &ShaderSources) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to get adapter")?;
        let (device, queue, precision) = pipeline::request_device(&adapter, "Offscreen Device").await?;
        Self::with_device(Arc::new(device), Arc::new(queue), precision, sources)
    }

    /// Shares an existing device, typically the window's.
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        precision: KernelPrecision,
        sources: &ShaderSources,
    ) -> Result<Self> {
        let source = sources.build(precision).context("tracer shader failed validation")?;
        let layout = pipeline::create_bind_group_layout(&device);
        let uniform_buffer = pipeline::create_uniform_buffer(&device);
        let bind_group = pipeline::create_bind_group(&device, &layout, &uniform_buffer);
        let pipeline = pipeline::try_create_render_pipeline(&device, &layout, TARGET_FORMAT, &source)?;
        let quad = pipeline::create_fullscreen_quad(&device);
        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            uniform_buffer,
            quad,
            precision,
        })
    }

    #[must_use]
    pub fn precision(&self) -> KernelPrecision {
        self.precision
    }
}

/// Bytes per texture row once padded to `COPY_BYTES_PER_ROW_ALIGNMENT`.
#[must_use]
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

impl FrameBackend for OffscreenRenderer {
    fn render(&self, frame: &FrameParams, pixels: &mut [Texel]) -> Result<(), FractalError> {
        check_buffer(frame, pixels)?;
        let width = frame.viewport.width();
        let height = frame.viewport.height();
        let max_edge = self.device.limits().max_texture_dimension_2d;
        if width > max_edge || height > max_edge {
            return Err(FractalError::Backend(format!(
                "{width}x{height} exceeds the device texture limit of {max_edge}"
            )));
        }
        let padded = padded_bytes_per_row(width);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Offscreen Readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let uniform = FrameUniform::from(frame);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("offscreen") });
        pipeline::encode_frame(&mut encoder, &view, &self.pipeline, &self.bind_group, &self.quad);
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| FractalError::Backend(format!("readback channel closed: {e}")))?
            .map_err(|e| FractalError::Backend(format!("failed to map readback buffer: {e}")))?;

        {
            let data = slice.get_mapped_range();
            let row_bytes = width as usize * 4;
            for (src, dst) in data
                .chunks_exact(padded as usize)
                .zip(pixels.chunks_exact_mut(width as usize))
            {
                bytemuck::cast_slice_mut::<Texel, u8>(dst).copy_from_slice(&src[..row_bytes]);
            }
        }
        readback.unmap();

        tracing::debug!(width, height, precision = ?self.precision, "offscreen frame rendered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(640), 2560);
    }
}

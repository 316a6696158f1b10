use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::{RenderError, Result};
use crate::util::BufferDimensions;

/// Offscreen color target that can be read back to the CPU.
pub struct Screenshoter {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    output_buffer: wgpu::Buffer,
    buffer_dimensions: BufferDimensions,
    format: wgpu::TextureFormat,
    counter: u32,
}

impl Screenshoter {
    /// Format used when there is no surface to match.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Whether frames in `format` can be read back as RGBA8.
    pub fn supports(format: wgpu::TextureFormat) -> bool {
        use wgpu::TextureFormat::*;
        matches!(format, Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb)
    }

    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("screen texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let buffer_dimensions = BufferDimensions::new::<u32>(width as usize, height as usize);
        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            size: buffer_dimensions.buffer_size(),
            usage: wgpu::BufferUsages::COPY_DST
                // this tells wpgu that we want to read this buffer from the cpu
                | wgpu::BufferUsages::MAP_READ,
            label: Some("screenshot buffer"),
            mapped_at_creation: false,
        });

        Self {
            texture,
            view,
            output_buffer,
            buffer_dimensions,
            format,
            counter: 0,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn get_view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.buffer_dimensions.width as u32
    }

    pub fn height(&self) -> u32 {
        self.buffer_dimensions.height as u32
    }

    pub fn copy_texture_to_buffer(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.buffer_dimensions.padded_bytes_per_row as u32),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: self.width(),
                height: self.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    /// Maps the output buffer once `submission_index` has completed and
    /// returns its pixels, top row first.
    pub fn read_image(
        &self,
        device: &wgpu::Device,
        submission_index: wgpu::SubmissionIndex,
    ) -> Result<RgbaImage> {
        let buffer_slice = self.output_buffer.slice(..);
        let (sender, receiver) = oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
            // the receiver only goes away if read_image already bailed out
            let _ = sender.send(v);
        });

        // We pass our submission index so we don't need to wait for any other possible submissions.
        device.poll(wgpu::Maintain::WaitForSubmissionIndex(submission_index));
        receiver
            .recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let mut pixels = {
            let data = buffer_slice.get_mapped_range();
            self.buffer_dimensions.unpad(&data)
        };
        self.output_buffer.unmap();

        match self.format {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
                for pixel in pixels.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
            }
            other => {
                return Err(RenderError::Readback(format!(
                    "cannot read back {other:?} frames"
                )))
            }
        }

        RgbaImage::from_raw(self.width(), self.height(), pixels)
            .ok_or_else(|| RenderError::Readback("mapped buffer is too small".into()))
    }

    /// Writes `screenshot_NNN.png` into `directory`, returning its path.
    pub fn save_png(
        &mut self,
        device: &wgpu::Device,
        submission_index: wgpu::SubmissionIndex,
        directory: &Path,
    ) -> Result<PathBuf> {
        let image = self.read_image(device, submission_index)?;
        let path = directory.join(format!("screenshot_{:03}.png", self.counter));
        image.save(&path)?;
        self.counter += 1;
        log::info!("saved {}", path.display());
        Ok(path)
    }
}

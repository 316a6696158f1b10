//! Windowless rendering into a readable texture.

use image::RgbaImage;

use crate::error::Result;
use crate::renderer::ColormapRenderer;
use crate::screenshot::Screenshoter;
use crate::settings::Settings;
use crate::texture::{Gradient, SamplerSettings, ScalarField};

/// A headless device with the colormap pipeline and a readback target of
/// `settings.width` x `settings.height`.
pub struct Offscreen {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: ColormapRenderer,
    screenshoter: Screenshoter,
    clear: wgpu::Color,
}

impl Offscreen {
    pub async fn new(
        settings: &Settings,
        field: &ScalarField,
        gradient: &Gradient,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&crate::instance_descriptor());
        let (_adapter, device, queue) = crate::request_device(&instance, settings, None).await?;

        let renderer = ColormapRenderer::new(
            &device,
            &queue,
            Screenshoter::FORMAT,
            settings,
            field,
            gradient,
        )?;
        let screenshoter = Screenshoter::new(
            &device,
            settings.width.max(1),
            settings.height.max(1),
            Screenshoter::FORMAT,
        );
        Ok(Self {
            device,
            queue,
            renderer,
            screenshoter,
            clear: settings.clear_color(),
        })
    }

    /// Sampler the field is actually read with on this device.
    pub fn field_sampler(&self) -> SamplerSettings {
        self.renderer.field_sampler()
    }

    pub fn set_field(&mut self, field: &ScalarField) -> Result<()> {
        self.renderer.set_field(&self.device, &self.queue, field)
    }

    pub fn set_gradient(&mut self, gradient: &Gradient) -> Result<()> {
        self.renderer.set_gradient(&self.device, &self.queue, gradient)
    }

    /// Draws one frame and reads it back, top row first.
    pub fn render(&self) -> Result<RgbaImage> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Encoder"),
            });
        self.renderer
            .draw(&mut encoder, self.screenshoter.get_view(), self.clear);
        self.screenshoter.copy_texture_to_buffer(&mut encoder);
        let submission_index = self.queue.submit(std::iter::once(encoder.finish()));
        self.screenshoter.read_image(&self.device, submission_index)
    }
}

/// Renders `field` through `gradient` without a window.
pub async fn render_offscreen(
    settings: &Settings,
    field: &ScalarField,
    gradient: &Gradient,
) -> Result<RgbaImage> {
    Offscreen::new(settings, field, gradient).await?.render()
}

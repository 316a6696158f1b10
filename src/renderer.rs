use crate::error::Result;
use crate::pipeline::{ColormapPipeline, QuadBuffer};
use crate::settings::Settings;
use crate::texture::{
    FieldTexture, FilterMode, Gradient, GradientTexture, SamplerSettings, ScalarField,
};
use crate::vertex::SCREEN_QUAD;

/// Features worth asking the adapter for, given the settings.
pub(crate) fn wanted_features(adapter: &wgpu::Adapter, settings: &Settings) -> wgpu::Features {
    let filterable = wgpu::Features::FLOAT32_FILTERABLE;
    if settings.field_sampler.filter == FilterMode::Linear {
        if adapter.features().contains(filterable) {
            return filterable;
        }
        log::warn!("adapter cannot filter R32Float, sampling the field with nearest");
    }
    wgpu::Features::empty()
}

/// Pipeline plus the resources bound to it: the full-screen quad, the field
/// (group 0) and the gradient (group 1).
pub struct ColormapRenderer {
    pipeline: ColormapPipeline,
    quad: QuadBuffer,
    field: FieldTexture,
    field_bind_group: wgpu::BindGroup,
    field_sampler: SamplerSettings,
    gradient: GradientTexture,
    gradient_bind_group: wgpu::BindGroup,
    gradient_sampler: SamplerSettings,
}

impl ColormapRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        settings: &Settings,
        field: &ScalarField,
        gradient: &Gradient,
    ) -> Result<Self> {
        let filterable = device
            .features()
            .contains(wgpu::Features::FLOAT32_FILTERABLE);
        let mut field_sampler = settings.field_sampler;
        if !filterable {
            field_sampler.filter = FilterMode::Nearest;
        }
        let pipeline = ColormapPipeline::new(device, color_format, filterable);
        let quad = QuadBuffer::new(device, &SCREEN_QUAD);

        let field = FieldTexture::new(device, queue, field, field_sampler)?;
        let field_bind_group = pipeline.create_field_bind_group(device, &field);
        let gradient_sampler = settings.gradient_sampler;
        let gradient = GradientTexture::new(device, queue, gradient, gradient_sampler)?;
        let gradient_bind_group = pipeline.create_gradient_bind_group(device, &gradient);

        Ok(Self {
            pipeline,
            quad,
            field,
            field_bind_group,
            field_sampler,
            gradient,
            gradient_bind_group,
            gradient_sampler,
        })
    }

    /// Sampler actually used for the field, after the filterability fallback.
    pub fn field_sampler(&self) -> SamplerSettings {
        self.field_sampler
    }

    pub fn gradient_sampler(&self) -> SamplerSettings {
        self.gradient_sampler
    }

    /// Replaces the field, reusing the texture when the size is unchanged.
    /// On error the previous field stays bound.
    pub fn set_field(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: &ScalarField,
    ) -> Result<()> {
        if self.field.fits(field) {
            self.field.write(queue, field);
            return Ok(());
        }
        self.field = FieldTexture::new(device, queue, field, self.field_sampler)?;
        self.field_bind_group = self.pipeline.create_field_bind_group(device, &self.field);
        Ok(())
    }

    /// On error the previous gradient stays bound.
    pub fn set_gradient(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        gradient: &Gradient,
    ) -> Result<()> {
        self.gradient = GradientTexture::new(device, queue, gradient, self.gradient_sampler)?;
        self.gradient_bind_group = self
            .pipeline
            .create_gradient_bind_group(device, &self.gradient);
        Ok(())
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        self.pipeline.render(
            render_pass,
            &self.field_bind_group,
            &self.gradient_bind_group,
            &self.quad,
        );
    }

    /// Clears `view` and draws into it.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Colormap Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.render(&mut render_pass);
    }
}

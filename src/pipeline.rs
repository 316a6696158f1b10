use wgpu::util::DeviceExt;

use crate::shader;
use crate::texture::{FieldTexture, GradientTexture};
use crate::vertex::{QuadVertex, Vertex};

/// Group 0: the scalar field and its sampler.
pub const FIELD_GROUP: u32 = 0;
/// Group 1: the gradient and its sampler.
pub const GRADIENT_GROUP: u32 = 1;

/// Draws a quad recolored through a log-scaled gradient lookup.
pub struct ColormapPipeline {
    pipeline: wgpu::RenderPipeline,
    field_bind_group_layout: wgpu::BindGroupLayout,
    gradient_bind_group_layout: wgpu::BindGroupLayout,
    filterable_field: bool,
}

impl ColormapPipeline {
    /// `filterable_field` must only be set when the device was created with
    /// `FLOAT32_FILTERABLE`, since the field texture is `R32Float`.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        filterable_field: bool,
    ) -> Self {
        let field_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float {
                                filterable: filterable_field,
                            },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        // This should match the filterable field of the
                        // corresponding Texture entry above.
                        ty: wgpu::BindingType::Sampler(if filterable_field {
                            wgpu::SamplerBindingType::Filtering
                        } else {
                            wgpu::SamplerBindingType::NonFiltering
                        }),
                        count: None,
                    },
                ],
                label: Some("field_bind_group_layout"),
            });

        let gradient_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D1,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("gradient_bind_group_layout"),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Colormap Pipeline Layout"),
            bind_group_layouts: &[&field_bind_group_layout, &gradient_bind_group_layout],
            push_constant_ranges: &[],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("colormap shader"),
            source: wgpu::ShaderSource::Wgsl(shader::get_shader().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("colormap render"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(shader::VERTEX_ENTRY),
                buffers: &[QuadVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(shader::FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            field_bind_group_layout,
            gradient_bind_group_layout,
            filterable_field,
        }
    }

    pub fn filterable_field(&self) -> bool {
        self.filterable_field
    }

    pub fn create_field_bind_group(
        &self,
        device: &wgpu::Device,
        field: &FieldTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.field_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&field.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&field.sampler),
                },
            ],
            label: Some("field_bind_group"),
        })
    }

    pub fn create_gradient_bind_group(
        &self,
        device: &wgpu::Device,
        gradient: &GradientTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.gradient_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gradient.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&gradient.sampler),
                },
            ],
            label: Some("gradient_bind_group"),
        })
    }

    /// Records one draw of every vertex in `vertices`.
    pub fn render<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        field: &'a wgpu::BindGroup,
        gradient: &'a wgpu::BindGroup,
        vertices: &'a QuadBuffer,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(FIELD_GROUP, field, &[]);
        render_pass.set_bind_group(GRADIENT_GROUP, gradient, &[]);
        render_pass.set_vertex_buffer(0, vertices.buffer.slice(..));
        render_pass.draw(0..vertices.count, 0..1);
    }
}

/// Caller-owned vertex buffer of [`QuadVertex`].
pub struct QuadBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl QuadBuffer {
    pub fn new(device: &wgpu::Device, vertices: &[QuadVertex]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            count: vertices.len() as u32,
        }
    }
}

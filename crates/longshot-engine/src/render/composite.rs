use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::NdcRect;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    linear_clamp_sampler, premul_alpha_blend, primitive_state, QuadVertex, QUAD_INDICES,
    QUAD_VERTICES,
};

/// One layer as seen by the composite pass.
pub struct CompositeLayer<'a> {
    pub rect: NdcRect,
    /// Opaque layers ignore texture alpha.
    pub opaque: bool,
    /// Created by [`CompositeRenderer::layer_bind_group`].
    pub bind_group: &'a wgpu::BindGroup,
}

/// Draws layer textures onto a target as NDC-placed quads, back to front.
///
/// Layers are linearly filtered, so a super-sampled layer is resolved down
/// to its on-screen size here.
#[derive(Default)]
pub struct CompositeRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    texture_bgl: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl CompositeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the bind group that exposes a layer's color view to the composite pass.
    ///
    /// Must be recreated whenever the layer's texture is recreated.
    pub fn layer_bind_group(
        &mut self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::BindGroup {
        let (bgl, sampler) = self.ensure_texture_layout(device);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Draws `layers` in slice order onto `target`, loading its contents.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        layers: &[CompositeLayer<'_>],
    ) {
        if layers.is_empty() {
            return;
        }

        self.ensure_pipeline(ctx, target.format);
        self.ensure_static_buffers(ctx);
        self.ensure_instance_capacity(ctx, layers.len());

        let raw: Vec<LayerInstance> = layers.iter().map(LayerInstance::from).collect();

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("longshot composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        // One draw per layer: each samples a different texture.
        for (i, layer) in layers.iter().enumerate() {
            let i = i as u32;
            rpass.set_bind_group(0, layer.bind_group, &[]);
            rpass.draw_indexed(0..6, 0, i..i + 1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_texture_layout(
        &mut self,
        device: &wgpu::Device,
    ) -> (&wgpu::BindGroupLayout, &wgpu::Sampler) {
        let bgl = self.texture_bgl.get_or_insert_with(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("longshot composite bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
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
            })
        });
        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_clamp_sampler(device, "longshot composite sampler"));
        (bgl, sampler)
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("longshot composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let (bgl, _) = self.ensure_texture_layout(ctx.device);

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("longshot composite pipeline layout"),
                bind_group_layouts: &[bgl],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("longshot composite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), LayerInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive_state(None),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("longshot composite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("longshot composite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(8);
        let new_size = (new_cap * std::mem::size_of::<LayerInstance>()) as u64;
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("longshot composite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (24 bytes):
///
///  offset  0  ndc_min  [f32; 2]   loc 1
///  offset  8  ndc_max  [f32; 2]   loc 2
///  offset 16  flags    [f32; 2]   loc 3  (.x = opaque)
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LayerInstance {
    ndc_min: [f32; 2],
    ndc_max: [f32; 2],
    flags: [f32; 2],
}

impl From<&CompositeLayer<'_>> for LayerInstance {
    fn from(layer: &CompositeLayer<'_>) -> Self {
        Self {
            ndc_min: layer.rect.min().to_array(),
            ndc_max: layer.rect.max().to_array(),
            flags: [if layer.opaque { 1.0 } else { 0.0 }, 0.0],
        }
    }
}

impl LayerInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x2, // ndc_min
        2 => Float32x2, // ndc_max
        3 => Float32x2  // flags
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LayerInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

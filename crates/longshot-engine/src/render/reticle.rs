//! Scope overlay: circular mask and procedural mil reticle.
//!
//! Both passes draw a fullscreen triangle over an existing layer target.
//! The reticle pass draws crosshair, mil ticks and housing ring
//! analytically in the fragment shader, so lines stay crisp at any layer
//! resolution. The mask pass then multiplies the layer by a coverage
//! texture so everything outside the eyepiece becomes transparent.

use bytemuck::{Pod, Zeroable};

use crate::coords::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    linear_clamp_sampler, multiply_by_src_alpha_blend, premul_alpha_blend, primitive_state,
    uniform_layout_entry,
};

/// Reticle geometry in milliradians, plus colors.
///
/// `mrad_per_unit` is the angle subtended by the full width of the target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReticleParams {
    pub mrad_per_unit: f32,
    pub major_spacing_mrad: f32,
    /// `0.0` disables minor ticks.
    pub minor_spacing_mrad: f32,
    pub major_tick_len_mrad: f32,
    pub minor_tick_len_mrad: f32,
    /// Ticks and crosshair stop at this distance from the centre.
    pub extent_mrad: f32,
    /// Line width as a fraction of the target width.
    pub line_width_uv: f32,
    /// Housing ring width as a fraction of the target width. `0.0` disables it.
    pub ring_width_uv: f32,
    pub color: Color,
    pub ring_color: Color,
}

impl Default for ReticleParams {
    fn default() -> Self {
        Self {
            mrad_per_unit: 40.0,
            major_spacing_mrad: 1.0,
            minor_spacing_mrad: 0.5,
            major_tick_len_mrad: 0.5,
            minor_tick_len_mrad: 0.25,
            extent_mrad: 10.0,
            line_width_uv: 0.003,
            ring_width_uv: 0.02,
            color: Color::black(),
            ring_color: Color::rgb(0.05, 0.05, 0.05),
        }
    }
}

/// Order of the two full-target draws. The mask must come last: it is the
/// only pass that can clear texels outside the eyepiece.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum OverlayPass {
    Reticle,
    Mask,
}

const PASS_ORDER: [OverlayPass; 2] = [OverlayPass::Reticle, OverlayPass::Mask];

/// Renders the scope reticle and mask into a layer target.
#[derive(Default)]
pub struct ReticleRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    mask_pipeline: Option<wgpu::RenderPipeline>,
    reticle_pipeline: Option<wgpu::RenderPipeline>,

    bgl: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    ubo: Option<wgpu::Buffer>,

    mask_view: Option<wgpu::TextureView>,
    mask_size: (u32, u32),

    /// Dropped whenever the mask texture changes.
    bind_group: Option<wgpu::BindGroup>,
}

impl ReticleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads an 8-bit coverage mask (row-major, top row first).
    ///
    /// Returns `false` and keeps the previous mask when `data` does not match
    /// `size`. Until a mask is set, the layer is left unmasked.
    pub fn set_mask(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: (u32, u32),
        data: &[u8],
    ) -> bool {
        let (w, h) = size;
        if w == 0 || h == 0 || data.len() != (w as usize) * (h as usize) {
            log::warn!(
                "ReticleRenderer: mask {}x{} does not match {} bytes; ignored",
                w,
                h,
                data.len()
            );
            return false;
        }

        let texture = create_mask_texture(device, w, h);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        self.mask_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.mask_size = size;
        self.bind_group = None;
        true
    }

    pub fn mask_size(&self) -> (u32, u32) {
        self.mask_size
    }

    /// Draws the reticle, then applies the mask, over `target`'s contents.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        params: &ReticleParams,
    ) {
        self.ensure_pipelines(ctx, target.format);
        self.ensure_bind_group(ctx);

        let Some(ubo) = self.ubo.as_ref() else { return };
        let uniform = ReticleUniform::from(params);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));

        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(mask_pipeline) = self.mask_pipeline.as_ref() else { return };
        let Some(reticle_pipeline) = self.reticle_pipeline.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("longshot reticle pass"),
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

        rpass.set_bind_group(0, bind_group, &[]);
        for pass in PASS_ORDER {
            rpass.set_pipeline(match pass {
                OverlayPass::Reticle => reticle_pipeline,
                OverlayPass::Mask => mask_pipeline,
            });
            rpass.draw(0..3, 0..1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_layout(&mut self, device: &wgpu::Device) -> &wgpu::BindGroupLayout {
        self.bgl.get_or_insert_with(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("longshot reticle bgl"),
                entries: &[
                    uniform_layout_entry::<ReticleUniform>(0, wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            })
        })
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format)
            && self.mask_pipeline.is_some()
            && self.reticle_pipeline.is_some()
        {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("longshot reticle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/reticle.wgsl").into()),
        });

        let bgl = self.ensure_layout(ctx.device);
        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("longshot reticle pipeline layout"),
                bind_group_layouts: &[bgl],
                immediate_size: 0,
            });

        let make = |label: &str, entry: &str, blend: wgpu::BlendState| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: primitive_state(None),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        self.mask_pipeline =
            Some(make("longshot scope mask pipeline", "fs_mask", multiply_by_src_alpha_blend()));
        self.reticle_pipeline =
            Some(make("longshot reticle pipeline", "fs_reticle", premul_alpha_blend()));
        self.pipeline_format = Some(format);
    }

    fn ensure_bind_group(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }

        if self.ubo.is_none() {
            self.ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("longshot reticle ubo"),
                size: std::mem::size_of::<ReticleUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if self.sampler.is_none() {
            self.sampler = Some(linear_clamp_sampler(ctx.device, "longshot reticle sampler"));
        }
        if self.mask_view.is_none() {
            // No mask yet: a single opaque texel leaves the layer untouched.
            self.set_mask(ctx.device, ctx.queue, (1, 1), &[255]);
        }

        self.ensure_layout(ctx.device);

        let (Some(bgl), Some(ubo), Some(sampler), Some(mask_view)) = (
            self.bgl.as_ref(),
            self.ubo.as_ref(),
            self.sampler.as_ref(),
            self.mask_view.as_ref(),
        ) else {
            return;
        };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("longshot reticle bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(mask_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
    }
}

fn create_mask_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("longshot scope mask"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Uniform layout (64 bytes):
///
///  offset  0  scale       vec4  (mrad_per_unit, major, minor, extent)
///  offset 16  ticks       vec4  (major_len, minor_len, line_width_uv, ring_width_uv)
///  offset 32  color       vec4  premultiplied
///  offset 48  ring_color  vec4  premultiplied
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ReticleUniform {
    scale: [f32; 4],
    ticks: [f32; 4],
    color: [f32; 4],
    ring_color: [f32; 4],
}

impl From<&ReticleParams> for ReticleUniform {
    fn from(p: &ReticleParams) -> Self {
        Self {
            scale: [
                p.mrad_per_unit.max(f32::EPSILON),
                p.major_spacing_mrad.max(0.0),
                p.minor_spacing_mrad.max(0.0),
                p.extent_mrad.max(0.0),
            ],
            ticks: [
                p.major_tick_len_mrad.max(0.0),
                p.minor_tick_len_mrad.max(0.0),
                p.line_width_uv.max(0.0),
                p.ring_width_uv.max(0.0),
            ],
            color: p.color.premultiplied(),
            ring_color: p.ring_color.premultiplied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-function result of one pass on a premultiplied texel.
    fn blend(pass: OverlayPass, dst: [f32; 4], src: [f32; 4]) -> [f32; 4] {
        match pass {
            OverlayPass::Reticle => std::array::from_fn(|i| src[i] + dst[i] * (1.0 - src[3])),
            OverlayPass::Mask => dst.map(|c| c * src[3]),
        }
    }

    fn overlay(dst: [f32; 4], reticle: [f32; 4], mask: f32) -> [f32; 4] {
        PASS_ORDER.iter().fold(dst, |acc, &pass| match pass {
            OverlayPass::Reticle => blend(pass, acc, reticle),
            OverlayPass::Mask => blend(pass, acc, [0.0, 0.0, 0.0, mask]),
        })
    }

    // ── pass order ────────────────────────────────────────────────────────

    #[test]
    fn mask_pass_runs_last() {
        assert_eq!(PASS_ORDER.last(), Some(&OverlayPass::Mask));
        assert_eq!(PASS_ORDER.iter().filter(|&&p| p == OverlayPass::Mask).count(), 1);
    }

    #[test]
    fn masked_corner_ends_transparent_under_opaque_ring() {
        let sky = [0.3, 0.5, 0.8, 1.0];
        let ring = ReticleUniform::from(&ReticleParams::default()).ring_color;
        assert_eq!(overlay(sky, ring, 0.0), [0.0; 4]);
    }

    #[test]
    fn reticle_survives_inside_eyepiece() {
        let sky = [0.3, 0.5, 0.8, 1.0];
        let line = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(overlay(sky, line, 1.0), line);
        assert_eq!(overlay(sky, [0.0; 4], 1.0), sky);
    }

    // ── uniform ───────────────────────────────────────────────────────────

    #[test]
    fn uniform_is_64_bytes() {
        assert_eq!(std::mem::size_of::<ReticleUniform>(), 64);
    }

    #[test]
    fn uniform_premultiplies_colors() {
        let params = ReticleParams {
            color: Color::new(1.0, 0.0, 0.0, 0.5),
            ..ReticleParams::default()
        };
        let u = ReticleUniform::from(&params);
        assert_eq!(u.color, [0.5, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn uniform_clamps_negative_spacing() {
        let params = ReticleParams { minor_spacing_mrad: -1.0, ..ReticleParams::default() };
        let u = ReticleUniform::from(&params);
        assert_eq!(u.scale[2], 0.0);
    }
}

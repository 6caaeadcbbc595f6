use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::coords::Color;
use crate::render::{RenderCtx, RenderTarget, DEPTH_FORMAT};

use super::common::{primitive_state, uniform_layout_entry};

// ── CPU mesh ──────────────────────────────────────────────────────────────

/// Vertex layout consumed by [`MeshRenderer`] (40 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x4  // color
    ];

    #[inline]
    pub fn new(position: Vec3, normal: Vec3, color: Color) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
        }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list on the CPU. Counter-clockwise front faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends `other`, rebasing its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Pushes a flat-shaded quad `a, b, c, d` (counter-clockwise seen from the front).
    pub fn push_quad(&mut self, corners: [Vec3; 4], color: Color) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or(Vec3::Y);
        let base = self.vertices.len() as u32;
        for c in corners {
            self.vertices.push(MeshVertex::new(c, normal, color));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Pushes an axis-aligned box with outward-facing, flat-shaded sides.
    pub fn push_box(&mut self, center: Vec3, half: Vec3, color: Color) {
        let c = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * half;
        let faces = [
            [c(-1., -1., 1.), c(1., -1., 1.), c(1., 1., 1.), c(-1., 1., 1.)],     // +Z
            [c(1., -1., -1.), c(-1., -1., -1.), c(-1., 1., -1.), c(1., 1., -1.)], // -Z
            [c(1., -1., 1.), c(1., -1., -1.), c(1., 1., -1.), c(1., 1., 1.)],     // +X
            [c(-1., -1., -1.), c(-1., -1., 1.), c(-1., 1., 1.), c(-1., 1., -1.)], // -X
            [c(-1., 1., 1.), c(1., 1., 1.), c(1., 1., -1.), c(-1., 1., -1.)],     // +Y
            [c(-1., -1., -1.), c(1., -1., -1.), c(1., -1., 1.), c(-1., -1., 1.)], // -Y
        ];
        for face in faces {
            self.push_quad(face, color);
        }
    }

    /// Replaces every normal with the area-weighted average of its adjacent faces.
    ///
    /// Vertices referenced by no triangle (or only degenerate ones) get +Y.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(a), Some(b), Some(c)) =
                (self.vertices.get(i0), self.vertices.get(i1), self.vertices.get(i2))
            else {
                continue;
            };
            let a = Vec3::from_array(a.position);
            let n = (Vec3::from_array(b.position) - a).cross(Vec3::from_array(c.position) - a);
            acc[i0] += n;
            acc[i1] += n;
            acc[i2] += n;
        }

        for (v, n) in self.vertices.iter_mut().zip(acc) {
            v.normal = n.normalize_or(Vec3::Y).to_array();
        }
    }
}

// ── GPU mesh ──────────────────────────────────────────────────────────────

/// Vertex + index buffers for one [`MeshData`].
pub struct GpuMesh {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    vertex_count: usize,
    index_count: u32,
}

impl GpuMesh {
    /// Uploads `mesh`. Returns `None` for an empty mesh.
    pub fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(Self {
            vbo,
            ibo,
            vertex_count: mesh.vertices.len(),
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Rewrites vertex data in place.
    ///
    /// Topology is fixed at upload; returns `false` (and writes nothing) when
    /// the vertex count differs.
    pub fn update_vertices(&self, queue: &wgpu::Queue, mesh: &MeshData) -> bool {
        if mesh.vertices.len() != self.vertex_count {
            return false;
        }
        queue.write_buffer(&self.vbo, 0, bytemuck::cast_slice(&mesh.vertices));
        true
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Per-view camera and lighting inputs.
#[derive(Debug, Copy, Clone)]
pub struct MeshCamera {
    pub view_proj: Mat4,
    pub eye: Vec3,
    /// Direction the light travels (world space).
    pub light_dir: Vec3,
    pub ambient: f32,
    pub fog_color: Color,
    /// Exponential fog density per metre. 0 disables fog.
    pub fog_density: f32,
}

/// Lit, depth-tested renderer for opaque [`GpuMesh`]es.
///
/// Holds a single camera uniform; use one renderer per camera that draws in
/// the same frame, since queued uniform writes land before the submit.
#[derive(Default)]
pub struct MeshRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    warned_no_depth: bool,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `meshes` into `target`, loading existing color and depth.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        camera: &MeshCamera,
        meshes: &[&GpuMesh],
    ) {
        let Some(depth_view) = target.depth_view else {
            if !self.warned_no_depth {
                log::warn!("mesh renderer needs a depth attachment; skipping draw");
                self.warned_no_depth = true;
            }
            return;
        };
        if meshes.is_empty() {
            return;
        }

        self.ensure_pipeline(ctx, target.format);
        self.ensure_bindings(ctx);
        self.write_camera_uniform(ctx, camera);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("longshot mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);

        for mesh in meshes {
            rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
            rpass.set_index_buffer(mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("longshot mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("longshot mesh bgl"),
                entries: &[uniform_layout_entry::<CameraUniform>(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
            });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("longshot mesh pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("longshot mesh pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // Thin plates and the flag are seen from both sides.
            primitive: primitive_state(None),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("longshot mesh camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("longshot mesh bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_camera_uniform(&self, ctx: &RenderCtx<'_>, camera: &MeshCamera) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&CameraUniform::from(camera)));
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Uniform layout (112 bytes):
///
///  offset  0  view_proj   mat4x4<f32>
///  offset 64  eye_fog     vec4  (.xyz = eye, .w = fog density)
///  offset 80  light       vec4  (.xyz = light direction, .w = ambient)
///  offset 96  fog_color   vec4
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    eye_fog: [f32; 4],
    light: [f32; 4],
    fog_color: [f32; 4],
}

impl From<&MeshCamera> for CameraUniform {
    fn from(c: &MeshCamera) -> Self {
        let light = c.light_dir.normalize_or(Vec3::NEG_Y);
        Self {
            view_proj: c.view_proj.to_cols_array_2d(),
            eye_fog: [c.eye.x, c.eye.y, c.eye.z, c.fog_density.max(0.0)],
            light: [light.x, light.y, light.z, c.ambient.clamp(0.0, 1.0)],
            fog_color: c.fog_color.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> MeshData {
        let mut m = MeshData::new();
        m.push_quad(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, -1.0),
            ],
            Color::black(),
        );
        m
    }

    #[test]
    fn vertex_is_forty_bytes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 40);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 112);
    }

    #[test]
    fn push_quad_faces_winding_normal() {
        let m = unit_quad();
        assert_eq!(m.vertices.len(), 4);
        assert_eq!(m.triangle_count(), 2);
        for v in &m.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = unit_quad();
        a.append(&unit_quad());
        assert_eq!(a.vertices.len(), 8);
        assert_eq!(&a.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn push_box_faces_outward() {
        let mut m = MeshData::new();
        let center = Vec3::new(1.0, 2.0, 3.0);
        m.push_box(center, Vec3::splat(0.5), Color::black());
        assert_eq!(m.triangle_count(), 12);
        for quad in m.vertices.chunks_exact(4) {
            let n = Vec3::from_array(quad[0].normal);
            let mid = quad
                .iter()
                .map(|v| Vec3::from_array(v.position))
                .fold(Vec3::ZERO, |a, p| a + p)
                / 4.0;
            assert!((mid - center).dot(n) > 0.0);
        }
    }

    #[test]
    fn recompute_normals_matches_flat_quad() {
        let mut m = unit_quad();
        for v in &mut m.vertices {
            v.normal = [1.0, 0.0, 0.0];
        }
        m.recompute_normals();
        for v in &m.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn recompute_normals_unreferenced_vertex_defaults_up() {
        let mut m = unit_quad();
        m.vertices.push(MeshVertex::default());
        m.recompute_normals();
        assert_eq!(m.vertices[4].normal, [0.0, 1.0, 0.0]);
    }
}

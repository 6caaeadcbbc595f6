use glam::Vec3;

use longshot_engine::compositor::{Compositor, LayerDesc, LayerError, LayerId};
use longshot_engine::coords::{Color, NdcRect, Viewport};
use longshot_engine::core::{App, AppControl, FrameCtx};
use longshot_engine::render::mesh::{GpuMesh, MeshCamera, MeshRenderer};
use longshot_engine::render::reticle::ReticleRenderer;
use longshot_engine::render::{RenderCtx, RenderTarget};
use longshot_range::camera::PerspectiveCamera;
use longshot_range::config::RangeConfig;
use longshot_range::scene::RangeScene;
use longshot_range::scope::circular_mask;
use longshot_range::units::m_to_yards;

const WORLD_Z: i32 = 0;
const SCOPE_Z: i32 = 10;

struct Layers {
    world: LayerId,
    scope: LayerId,
}

/// Per-device resources, built on the first frame.
struct GpuResources {
    static_mesh: Option<GpuMesh>,
    flag_mesh: Option<GpuMesh>,
    /// One renderer per camera: each holds its own camera uniform.
    world_meshes: MeshRenderer,
    scope_meshes: MeshRenderer,
    reticle: ReticleRenderer,
}

/// Draws the range into a full-screen world layer and the magnified view
/// into a round scope layer on top of it.
pub struct RangeApp {
    config: RangeConfig,
    scene: RangeScene,
    compositor: Compositor,
    viewport: Viewport,
    layers: Option<Layers>,
    gpu: Option<GpuResources>,
    aimed: Option<usize>,
    minor_ticks: Option<bool>,
}

impl RangeApp {
    pub fn new(config: RangeConfig) -> Self {
        let scene = RangeScene::new(&config);
        let viewport = Viewport::new(config.window_width as f32, config.window_height as f32);
        let aimed = scene.aimed_target();
        Self {
            config,
            scene,
            compositor: Compositor::new(viewport),
            viewport,
            layers: None,
            gpu: None,
            aimed,
            minor_ticks: None,
        }
    }

    fn sky() -> Color {
        Color::from_srgb_u8(150, 190, 228, 255)
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_valid() || viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.compositor.resize(viewport);
        self.scene.set_aspect(viewport.aspect());

        if let Some(layers) = &self.layers {
            let rect = self.scene.scope.ndc_rect(viewport);
            if let Err(e) = self.compositor.set_layer_rect(layers.scope, rect) {
                log::warn!("RangeApp: scope rect not updated: {e}");
            }
        }
        log::debug!("RangeApp: canvas {}x{}", viewport.width, viewport.height);
    }

    fn create_layers(&mut self) -> Result<Layers, LayerError> {
        let world = self.compositor.add_layer(
            LayerDesc::new("world", NdcRect::FULL).with_z(WORLD_Z),
        )?;
        let scope = self.compositor.add_layer(
            LayerDesc::new("scope", self.scene.scope.ndc_rect(self.viewport))
                .with_z(SCOPE_Z)
                .transparent(true)
                .with_supersample(self.config.scope.supersample),
        )?;
        Ok(Layers { world, scope })
    }

    fn create_gpu_resources(&self, ctx: &RenderCtx<'_>) -> GpuResources {
        let statics = self.scene.static_meshes();
        log::info!(
            "RangeApp: static geometry {} triangles",
            statics.triangle_count()
        );

        GpuResources {
            static_mesh: GpuMesh::upload(ctx.device, &statics, "range static"),
            flag_mesh: GpuMesh::upload(ctx.device, &self.scene.flag_mesh(), "range flag"),
            world_meshes: MeshRenderer::new(),
            scope_meshes: MeshRenderer::new(),
            reticle: ReticleRenderer::new(),
        }
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.apply_viewport(ctx.viewport);

        if self.layers.is_none() {
            match self.create_layers() {
                Ok(layers) => self.layers = Some(layers),
                Err(e) => {
                    log::error!("RangeApp: failed to create layers: {e}");
                    return;
                }
            }
        }
        if self.gpu.is_none() {
            self.gpu = Some(self.create_gpu_resources(ctx));
        }

        if let Err(e) = self.render_layers(ctx, target) {
            log::error!("RangeApp: layer render failed: {e}");
        }
        self.compositor.composite(ctx, target);
    }

    fn render_layers(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), LayerError> {
        let Self { config, scene, compositor, layers, gpu, minor_ticks, .. } = self;
        let (Some(layers), Some(gpu)) = (layers.as_ref(), gpu.as_mut()) else {
            return Ok(());
        };

        if let Some(flag) = &gpu.flag_mesh {
            flag.update_vertices(ctx.queue, &scene.flag_mesh());
        }

        // The mask follows the scope layer's pixel buffer.
        let (w, h) = compositor.layer_size(layers.scope)?;
        let side = w.max(h);
        if gpu.reticle.mask_size() != (side, side) {
            let feather = config.scope.mask_feather_px * config.scope.supersample;
            gpu.reticle
                .set_mask(ctx.device, ctx.queue, (side, side), &circular_mask(side, feather));
        }

        // Reticle line widths and tick gaps are in screen pixels.
        let scope_px = compositor.table().pixel_rect(layers.scope)?.size.x;
        let layout = scene.scope.reticle_layout(scope_px);
        if *minor_ticks != Some(layout.minor_visible()) {
            *minor_ticks = Some(layout.minor_visible());
            log::debug!(
                "RangeApp: minor ticks {} at {:.1}x",
                if layout.minor_visible() { "shown" } else { "hidden" },
                scene.scope.magnification()
            );
        }
        let reticle = layout.params();

        let meshes: Vec<&GpuMesh> = [gpu.static_mesh.as_ref(), gpu.flag_mesh.as_ref()]
            .into_iter()
            .flatten()
            .collect();

        let encoder = &mut *target.encoder;

        compositor.clear_layer(ctx.device, encoder, layers.world, Self::sky())?;
        {
            let mut world = compositor.layer_target(ctx.device, encoder, layers.world)?;
            gpu.world_meshes.render(ctx, &mut world, &mesh_camera(&scene.camera), &meshes);
        }

        compositor.clear_layer(ctx.device, encoder, layers.scope, Self::sky())?;
        {
            let mut view = compositor.layer_target(ctx.device, encoder, layers.scope)?;
            gpu.scope_meshes.render(ctx, &mut view, &mesh_camera(&scene.scope_camera()), &meshes);
            gpu.reticle.render(ctx, &mut view, &reticle);
        }

        Ok(())
    }

    fn report_aim(&mut self) {
        let aimed = self.scene.aimed_target();
        if aimed == self.aimed {
            return;
        }
        self.aimed = aimed;

        match aimed.and_then(|i| self.scene.targets.get(i).map(|t| (i, t))) {
            Some((i, t)) => {
                let distance = (t.position - self.scene.camera.position).length();
                log::info!(
                    "on target {} at {:.0} yd ({:.1}x)",
                    i,
                    m_to_yards(distance),
                    self.scene.scope.magnification()
                );
            }
            None => log::debug!("reticle off target"),
        }
    }
}

impl App for RangeApp {
    fn on_resize(&mut self, viewport: Viewport) {
        self.apply_viewport(viewport);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.scene.update(ctx.time.dt);
        self.report_aim();

        ctx.render(Color::black(), |rctx, target| self.draw(rctx, target))
    }
}

fn mesh_camera(camera: &PerspectiveCamera) -> MeshCamera {
    MeshCamera {
        view_proj: camera.view_projection(),
        eye: camera.position,
        light_dir: Vec3::new(-0.35, -1.0, -0.45).normalize(),
        ambient: 0.35,
        fog_color: RangeApp::sky(),
        fog_density: 0.0004,
    }
}

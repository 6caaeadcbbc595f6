use glam::{Vec2, Vec3};

use longshot_engine::render::mesh::MeshData;

use crate::camera::PerspectiveCamera;
use crate::config::RangeConfig;
use crate::flag::{FlagParams, WindFlag};
use crate::scope::Scope;
use crate::target::SteelTarget;
use crate::terrain::Terrain;
use crate::units::yards_to_m;
use crate::wind::WindGenerator;

/// The whole range: static ground and steel, the animated flag, and the
/// shooter's view through the scope.
///
/// Without input, the demo sweeps the rifle from target to target and
/// cycles the zoom. The flag follows the gusting wind at its pole.
#[derive(Debug, Clone)]
pub struct RangeScene {
    pub terrain: Terrain,
    pub targets: Vec<SteelTarget>,
    pub flag: WindFlag,
    pub camera: PerspectiveCamera,
    pub scope: Scope,
    pub wind: WindGenerator,

    turn_rate: f32,
    dwell_s: f32,

    aim_index: usize,
    on_target_for: f32,
    elapsed: f32,
    aimed: Option<usize>,
}

impl RangeScene {
    pub fn new(config: &RangeConfig) -> Self {
        let length = config.range_length_m();
        let terrain = Terrain::new(length, config.lane_width);

        let targets: Vec<SteelTarget> = config
            .targets
            .iter()
            .map(|t| SteelTarget::on_range(&terrain, t))
            .collect();

        let (flag_x_yd, flag_d_yd) = config.flag_position_yd;
        let flag_base = terrain.ground_point(yards_to_m(flag_x_yd), -yards_to_m(flag_d_yd));
        let flag = WindFlag::new(
            FlagParams::default(),
            flag_base + Vec3::Y * config.flag_pole_height,
        );

        let eye = terrain.ground_point(0.0, 0.0) + Vec3::Y * config.eye_height;
        let aspect = (config.window_width / config.window_height) as f32;
        let mut camera = PerspectiveCamera::new(eye, config.main_fov_deg, aspect);
        camera.far = length + 1000.0;
        if let Some(first) = targets.first() {
            camera.aim_at(first.position);
        }

        let mut scope = Scope::new(config.scope, config.reticle);
        scope.zoom_cycle(0.0);

        let wind = WindGenerator::from_config(&config.wind, length, config.lane_width);
        log::info!(
            "RangeScene: {} targets out to {:.0} m, {} wind (seed {})",
            targets.len(),
            length,
            config.wind.preset.name(),
            config.wind.seed
        );

        let mut scene = Self {
            terrain,
            targets,
            flag,
            camera,
            scope,
            wind,
            turn_rate: config.aim.turn_rate_deg_s.to_radians(),
            dwell_s: config.aim.dwell_s,
            aim_index: 0,
            on_target_for: 0.0,
            elapsed: 0.0,
            aimed: None,
        };
        scene.aimed = scene.target_under_crosshair();
        scene
    }

    /// Ground, plates, stands and the flag pole, merged into one mesh.
    pub fn static_meshes(&self) -> MeshData {
        let mut mesh = MeshData::new();
        for m in self.terrain.meshes() {
            mesh.append(&m);
        }
        for t in &self.targets {
            mesh.append(&t.mesh());
            mesh.append(&t.stand_mesh());
        }
        let p = self.flag.position();
        mesh.append(&self.flag.pole_mesh(self.terrain.height_at(p.x, p.z)));
        mesh
    }

    pub fn flag_mesh(&self) -> MeshData {
        self.flag.mesh()
    }

    pub fn scope_camera(&self) -> PerspectiveCamera {
        self.scope.camera(&self.camera)
    }

    /// Main camera aspect, from the canvas size.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Target index the aim sweep is heading for or resting on.
    #[inline]
    pub fn aim_index(&self) -> usize {
        self.aim_index
    }

    /// Wind at the flag, m/s.
    pub fn flag_wind(&self) -> Vec3 {
        self.wind.sample(self.flag.position())
    }

    /// Advances the wind, the flag, the aim sweep and the zoom sweep by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        self.wind.advance_time(self.elapsed);
        let wind = self.flag_wind();
        self.flag.update(dt, wind);

        if let Some(target) = self.targets.get(self.aim_index) {
            if self.camera.aim_towards(target.position, self.turn_rate, dt) {
                self.on_target_for += dt;
                if self.on_target_for >= self.dwell_s {
                    self.on_target_for = 0.0;
                    self.aim_index = (self.aim_index + 1) % self.targets.len();
                    log::debug!("RangeScene: aim switched to target {}", self.aim_index);
                }
            }
        }

        self.scope.zoom_cycle(self.elapsed);
        self.aimed = self.target_under_crosshair();
    }

    /// Index of the nearest plate under the reticle centre.
    #[inline]
    pub fn aimed_target(&self) -> Option<usize> {
        self.aimed
    }

    fn target_under_crosshair(&self) -> Option<usize> {
        let ray = self.camera.ray(Vec2::ZERO);
        self.targets
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.intersect_ray(&ray).map(|hit| (i, hit.distance)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> RangeScene {
        RangeScene::new(&RangeConfig::default())
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn builds_one_plate_per_config_entry() {
        let s = scene();
        assert_eq!(s.targets.len(), RangeConfig::default().targets.len());
    }

    #[test]
    fn starts_aimed_at_first_target() {
        let s = scene();
        assert_eq!(s.aimed_target(), Some(0));
    }

    #[test]
    fn static_mesh_contains_everything() {
        let s = scene();
        let mesh = s.static_meshes();
        let expected: usize = s.terrain.meshes().iter().map(|m| m.triangle_count()).sum::<usize>()
            + s.targets
                .iter()
                .map(|t| t.mesh().triangle_count() + t.stand_mesh().triangle_count())
                .sum::<usize>()
            + 12;
        assert_eq!(mesh.triangle_count(), expected);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn eye_is_above_ground() {
        let s = scene();
        assert!((s.camera.position.y - (s.terrain.height_at(0.0, 0.0) + 1.2)).abs() < 1e-5);
    }

    // ── animation ─────────────────────────────────────────────────────────

    #[test]
    fn sweep_moves_on_after_dwell() {
        let mut s = scene();
        // Already on target 0; dwell is 3 s.
        for _ in 0..31 {
            s.update(0.1);
        }
        assert_eq!(s.aim_index(), 1);
    }

    #[test]
    fn sweep_reaches_next_target() {
        let mut s = scene();
        for _ in 0..400 {
            s.update(0.05);
            if s.aim_index() == 1 && s.aimed_target() == Some(1) {
                return;
            }
        }
        panic!("never settled on target 1");
    }

    #[test]
    fn zoom_follows_elapsed_time() {
        let mut s = scene();
        let start = s.scope.magnification();
        s.update(s.scope.config.zoom_period_s * 0.5);
        assert!(s.scope.magnification() > start);
        assert!(s.scope_camera().fov_deg < s.camera.fov_deg);
    }

    #[test]
    fn wind_follows_elapsed_time() {
        let mut a = scene();
        let mut b = scene();
        for _ in 0..50 {
            a.update(0.1);
            b.update(0.1);
        }
        assert_eq!(a.wind.time(), a.elapsed());
        assert_eq!(a.flag_wind(), b.flag_wind());
        assert_eq!(a.flag_wind().y, 0.0);
    }

    #[test]
    fn flag_is_driven_by_sampled_wind() {
        let mut s = scene();
        let heading = s.flag.direction();
        for _ in 0..100 {
            s.update(0.1);
        }
        assert_ne!(s.flag_wind(), Vec3::ZERO);
        assert_ne!(s.flag.direction(), heading);
    }

    #[test]
    fn flag_mesh_keeps_topology_across_updates() {
        let mut s = scene();
        let before = s.flag_mesh();
        s.update(0.5);
        let after = s.flag_mesh();
        assert_eq!(before.vertices.len(), after.vertices.len());
        assert_ne!(before.vertices, after.vertices);
    }
}

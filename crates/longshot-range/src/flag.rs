//! Range wind flag.
//!
//! A tapered banner hanging from a pole top. Its droop angle follows the
//! horizontal wind speed through a saturating response curve, and it turns
//! to face downwind. It also flaps with a travelling wave whose frequency
//! rises with the wind. The banner's width runs vertically; `t` runs from
//! the pole (0) to the tip (1).

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use longshot_engine::coords::Color;
use longshot_engine::render::mesh::{MeshData, MeshVertex};

use crate::units::{inches_to_m, mps_to_mph, yards_to_m};

/// Shape and response parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlagParams {
    pub base_width: f32,
    pub tip_width: f32,
    pub length: f32,
    pub thickness: f32,
    /// Cross-sections along the length, at least 2.
    pub segments: usize,
    /// Droop from vertical in calm air, degrees.
    pub min_angle_deg: f32,
    /// Droop from vertical in a gale, degrees.
    pub max_angle_deg: f32,
    /// `k` in `min + span·(1 − exp(−k·v²))`, with `v` in mph.
    pub angle_response_k: f32,
    /// Degrees per second.
    pub angle_speed: f32,
    /// Radians per second.
    pub direction_speed: f32,
    /// Flap frequency in still air, Hz.
    pub flap_frequency_base: f32,
    /// Additional Hz per mph.
    pub flap_frequency_scale: f32,
    pub flap_amplitude: f32,
    /// Waves along the banner.
    pub wave_length: f32,
}

impl Default for FlagParams {
    fn default() -> Self {
        Self {
            base_width: inches_to_m(60.0),
            tip_width: inches_to_m(24.0),
            length: yards_to_m(16.0 / 3.0),
            thickness: yards_to_m(0.05),
            segments: 10,
            min_angle_deg: 1.0,
            max_angle_deg: 90.0,
            angle_response_k: 0.0205,
            angle_speed: 30.0,
            direction_speed: 1.0,
            flap_frequency_base: 0.5,
            flap_frequency_scale: 0.25,
            flap_amplitude: yards_to_m(0.3),
            wave_length: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindFlag {
    params: FlagParams,
    /// Attachment point at the pole top.
    position: Vec3,
    angle_deg: f32,
    /// Heading of the banner on the ground plane, measured from +X towards downrange.
    direction: f32,
    flap_phase: f32,
}

impl WindFlag {
    pub fn new(params: FlagParams, position: Vec3) -> Self {
        let params = FlagParams { segments: params.segments.max(2), ..params };
        Self {
            angle_deg: params.min_angle_deg,
            params,
            position,
            direction: 0.0,
            flap_phase: 0.0,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn params(&self) -> &FlagParams {
        &self.params
    }

    #[inline]
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    #[inline]
    pub fn direction(&self) -> f32 {
        self.direction
    }

    #[inline]
    pub fn flap_phase(&self) -> f32 {
        self.flap_phase
    }

    /// Droop angle the flag settles at for a horizontal wind of `speed_mph`.
    pub fn target_angle_deg(&self, speed_mph: f32) -> f32 {
        let p = &self.params;
        let span = p.max_angle_deg - p.min_angle_deg;
        p.min_angle_deg + span * (1.0 - (-p.angle_response_k * speed_mph * speed_mph).exp())
    }

    /// Advances the flag by `dt` seconds in `wind` (world m/s; only the
    /// horizontal part matters).
    pub fn update(&mut self, dt: f32, wind: Vec3) {
        let dt = dt.max(0.0);
        let crossrange = wind.x;
        let downrange = -wind.z;
        let speed_mps = (crossrange * crossrange + downrange * downrange).sqrt();
        let speed_mph = mps_to_mph(speed_mps);

        let target_angle = self.target_angle_deg(speed_mph);
        self.angle_deg += step_towards(target_angle - self.angle_deg, self.params.angle_speed * dt);

        // Calm air keeps the last heading.
        if speed_mps > 1e-6 {
            let target_dir = downrange.atan2(crossrange);
            let diff = (target_dir - self.direction + PI).rem_euclid(TAU) - PI;
            self.direction += step_towards(diff, self.params.direction_speed * dt);
        }

        let frequency = self.params.flap_frequency_base + speed_mph * self.params.flap_frequency_scale;
        self.flap_phase = (self.flap_phase + frequency * TAU * dt).rem_euclid(TAU);
    }

    /// Centre of cross-section `i` relative to the attachment point, and its half width.
    pub fn segment(&self, i: usize) -> (Vec3, f32) {
        let p = &self.params;
        let t = i as f32 / (p.segments - 1) as f32;
        let half_width = (p.base_width + (p.tip_width - p.base_width) * t) * 0.5;

        let (sin_dir, cos_dir) = self.direction.sin_cos();
        let (sin_pitch, cos_pitch) = self.angle_deg.to_radians().sin_cos();
        let reach = p.length * t;

        // Travelling wave, pinned at the pole, perpendicular to the heading.
        let wave = (self.flap_phase + t * p.wave_length * TAU).sin() * p.flap_amplitude * t;

        let offset = Vec3::new(
            cos_dir * sin_pitch * reach + sin_dir * wave,
            -cos_pitch * reach,
            -sin_dir * sin_pitch * reach + cos_dir * wave,
        );
        (offset, half_width)
    }

    /// World-space tip centre.
    pub fn tip(&self) -> Vec3 {
        self.position + self.segment(self.params.segments - 1).0
    }

    /// The banner: front, back and edge faces, red over yellow, smoothed normals.
    ///
    /// The vertex count only depends on `segments`, so the mesh can be
    /// rewritten in place every frame.
    pub fn mesh(&self) -> MeshData {
        let red = Color::from_srgb_u8(200, 30, 30, 255);
        let yellow = Color::from_srgb_u8(235, 200, 40, 255);
        let ht = self.params.thickness * 0.5;
        let n = self.params.segments;

        let mut mesh = MeshData::new();
        mesh.vertices.reserve(n * 4);
        for i in 0..n {
            let (offset, hw) = self.segment(i);
            let c = self.position + offset;
            // top-front, bottom-front, top-back, bottom-back
            for (dy, dz, color) in [(hw, ht, red), (-hw, ht, yellow), (hw, -ht, red), (-hw, -ht, yellow)] {
                mesh.vertices
                    .push(MeshVertex::new(c + Vec3::new(0.0, dy, dz), Vec3::Y, color));
            }
        }

        for i in 0..(n as u32 - 1) {
            let k = i * 4;
            mesh.indices.extend_from_slice(&[
                // front
                k, k + 1, k + 4, k + 1, k + 5, k + 4,
                // back
                k + 2, k + 6, k + 3, k + 3, k + 6, k + 7,
                // top edge
                k, k + 4, k + 2, k + 2, k + 4, k + 6,
                // bottom edge
                k + 1, k + 3, k + 5, k + 3, k + 7, k + 5,
            ]);
        }

        mesh.recompute_normals();
        mesh
    }

    /// Pole from `ground_y` up to the attachment point.
    pub fn pole_mesh(&self, ground_y: f32) -> MeshData {
        let top = self.position.y;
        let half = Vec3::new(0.04, ((top - ground_y) * 0.5).max(0.0), 0.04);
        let center = Vec3::new(self.position.x, ground_y + half.y, self.position.z);
        let mut mesh = MeshData::new();
        mesh.push_box(center, half, Color::from_srgb_u8(180, 180, 185, 255));
        mesh
    }
}

/// `diff` limited to `max_step` in magnitude, keeping its sign.
fn step_towards(diff: f32, max_step: f32) -> f32 {
    diff.abs().min(max_step).copysign(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::mph_to_mps;

    fn flag() -> WindFlag {
        WindFlag::new(FlagParams::default(), Vec3::new(0.0, 6.0, -40.0))
    }

    // ── response ──────────────────────────────────────────────────────────

    #[test]
    fn calm_air_hangs_at_min_angle() {
        let mut f = flag();
        for _ in 0..100 {
            f.update(0.1, Vec3::ZERO);
        }
        assert!((f.angle_deg() - 1.0).abs() < 1e-4);
        assert_eq!(f.direction(), 0.0);
    }

    #[test]
    fn target_angle_saturates() {
        let f = flag();
        assert!((f.target_angle_deg(0.0) - 1.0).abs() < 1e-6);
        assert!(f.target_angle_deg(10.0) > 50.0);
        assert!(f.target_angle_deg(40.0) > 89.9);
    }

    #[test]
    fn angle_change_is_rate_limited() {
        let mut f = flag();
        f.update(1.0, Vec3::new(mph_to_mps(20.0), 0.0, 0.0));
        assert!((f.angle_deg() - 31.0).abs() < 1e-3);
    }

    #[test]
    fn downrange_wind_turns_flag_downrange() {
        let mut f = flag();
        for _ in 0..200 {
            f.update(0.1, Vec3::new(0.0, 0.0, -5.0));
        }
        assert!((f.direction() - PI / 2.0).abs() < 1e-3);
        // Tip lies downrange (more negative Z) of the pole.
        let (offset, _) = f.segment(f.params().segments - 1);
        assert!(offset.z < -1.0);
    }

    #[test]
    fn direction_takes_shortest_arc() {
        let mut f = flag();
        f.direction = 3.0;
        // Heading of wind blowing towards -X and slightly up-range: atan2 ≈ -3.0.
        let wind = Vec3::new(-5.0 * 3.0f32.cos().abs(), 0.0, 5.0 * 3.0f32.sin());
        f.update(0.01, wind);
        assert!(f.direction() > 3.0);
    }

    #[test]
    fn flap_phase_wraps() {
        let mut f = flag();
        for _ in 0..1000 {
            f.update(0.37, Vec3::new(8.0, 0.0, 0.0));
            assert!((0.0..TAU).contains(&f.flap_phase()));
        }
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn first_segment_sits_at_pole() {
        let f = flag();
        let (offset, hw) = f.segment(0);
        assert_eq!(offset, Vec3::ZERO);
        assert!((hw - inches_to_m(30.0)).abs() < 1e-6);
    }

    #[test]
    fn crossrange_wind_extends_along_x() {
        let mut f = flag();
        for _ in 0..100 {
            f.update(0.1, Vec3::new(mph_to_mps(15.0), 0.0, 0.0));
        }
        assert!(f.tip().x - f.position().x > 3.0);
    }

    #[test]
    fn mesh_topology_is_stable() {
        let mut f = flag();
        let before = f.mesh();
        f.update(0.5, Vec3::new(6.0, 0.0, -2.0));
        let after = f.mesh();

        let n = f.params().segments;
        assert_eq!(before.vertices.len(), n * 4);
        assert_eq!(after.vertices.len(), before.vertices.len());
        assert_eq!(after.indices, before.indices);
        assert_eq!(after.triangle_count(), (n - 1) * 8);
    }

    #[test]
    fn pole_reaches_attachment_point() {
        let f = flag();
        let m = f.pole_mesh(0.0);
        let top = m.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let bottom = m.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!((top - 6.0).abs() < 1e-5);
        assert!(bottom.abs() < 1e-5);
    }
}

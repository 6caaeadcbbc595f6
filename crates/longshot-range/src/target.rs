use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use longshot_engine::coords::Color;
use longshot_engine::render::mesh::{MeshData, MeshVertex};

use crate::camera::Ray;
use crate::config::TargetConfig;
use crate::terrain::Terrain;
use crate::units::{inches_to_m, yards_to_m};

/// Plate thickness for AR500 steel (3/8").
pub const PLATE_THICKNESS: f32 = 0.375 * 0.0254;
/// Gap between the ground and the bottom edge of a plate.
pub const STAND_HEIGHT: f32 = 0.6;

const OVAL_SEGMENTS: usize = 32;
const POST_SIZE: f32 = 0.05;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetShape {
    Rectangle,
    Oval,
}

/// Where a ray met a plate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TargetHit {
    pub point: Vec3,
    /// Plate normal on the side the ray came from.
    pub normal: Vec3,
    /// Distance along the ray.
    pub distance: f32,
}

/// A hanging steel plate.
///
/// Local frame: X along the width, Y along the height, Z along `normal`,
/// origin at the plate centre.
#[derive(Debug, Clone, PartialEq)]
pub struct SteelTarget {
    pub width: f32,
    pub height: f32,
    pub thickness: f32,
    pub shape: TargetShape,
    /// Plate centre.
    pub position: Vec3,
    /// Unit normal of the front face.
    pub normal: Vec3,
    pub paint: Color,
    pub stand_height: f32,
}

impl SteelTarget {
    /// Places a plate downrange on `terrain`, facing the firing line.
    pub fn on_range(terrain: &Terrain, config: &TargetConfig) -> Self {
        let width = inches_to_m(config.width_in).max(0.01);
        let height = inches_to_m(config.height_in).max(0.01);
        let x = yards_to_m(config.crossrange_yd);
        let z = -yards_to_m(config.distance_yd);
        let ground = terrain.height_at(x, z);

        Self {
            width,
            height,
            thickness: PLATE_THICKNESS,
            shape: config.shape,
            position: Vec3::new(x, ground + STAND_HEIGHT + height * 0.5, z),
            normal: Vec3::Z,
            paint: config.paint,
            stand_height: STAND_HEIGHT,
        }
    }

    /// Local width axis in world space.
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.normal).normalize_or(Vec3::X)
    }

    /// Local height axis in world space.
    pub fn up(&self) -> Vec3 {
        self.normal.cross(self.right())
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.local_dir_to_world(local)
    }

    fn local_dir_to_world(&self, local: Vec3) -> Vec3 {
        self.right() * local.x + self.up() * local.y + self.normal * local.z
    }

    /// Plate outline in local XY, counter-clockwise seen from the front.
    fn outline(&self) -> Vec<Vec2> {
        let (hw, hh) = (self.width * 0.5, self.height * 0.5);
        match self.shape {
            TargetShape::Rectangle => vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            TargetShape::Oval => (0..OVAL_SEGMENTS)
                .map(|i| {
                    let a = i as f32 / OVAL_SEGMENTS as f32 * TAU;
                    Vec2::new(a.cos() * hw, a.sin() * hh)
                })
                .collect(),
        }
    }

    /// The plate as an extruded outline: painted front, bare steel back and edges.
    pub fn mesh(&self) -> MeshData {
        let outline = self.outline();
        let ht = self.thickness * 0.5;
        let steel = Color::from_srgb_u8(96, 96, 100, 255);
        let mut mesh = MeshData::new();

        // Front and back caps as fans around the centre.
        for (z, n, color) in [(ht, Vec3::Z, self.paint), (-ht, Vec3::NEG_Z, steel)] {
            let world_n = self.local_dir_to_world(n);
            let base = mesh.vertices.len() as u32;
            let center = self.local_to_world(Vec3::new(0.0, 0.0, z));
            mesh.vertices.push(MeshVertex::new(center, world_n, color));
            for p in &outline {
                let v = self.local_to_world(p.extend(z));
                mesh.vertices.push(MeshVertex::new(v, world_n, color));
            }
            let count = outline.len() as u32;
            for i in 0..count {
                let (a, b) = (base + 1 + i, base + 1 + (i + 1) % count);
                if z > 0.0 {
                    mesh.indices.extend_from_slice(&[base, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[base, b, a]);
                }
            }
        }

        // Edge strip.
        for (i, p) in outline.iter().enumerate() {
            let q = outline[(i + 1) % outline.len()];
            mesh.push_quad(
                [
                    self.local_to_world(p.extend(-ht)),
                    self.local_to_world(q.extend(-ht)),
                    self.local_to_world(q.extend(ht)),
                    self.local_to_world(p.extend(ht)),
                ],
                steel,
            );
        }

        mesh
    }

    /// Two posts from the ground up to the plate's bottom edge, behind the plate.
    pub fn stand_mesh(&self) -> MeshData {
        let color = Color::from_srgb_u8(70, 56, 40, 255);
        let bottom = self.position.y - self.height * 0.5;
        let ground = bottom - self.stand_height;
        let mut mesh = MeshData::new();

        for side in [-1.0, 1.0] {
            let foot = self.local_to_world(Vec3::new(
                side * self.width * 0.35,
                0.0,
                -(self.thickness + POST_SIZE),
            ));
            let center = Vec3::new(foot.x, (ground + bottom) * 0.5, foot.z);
            let half = Vec3::new(POST_SIZE * 0.5, (bottom - ground) * 0.5, POST_SIZE * 0.5);
            mesh.push_box(center, half, color);
        }
        mesh
    }

    /// Ray test against the plate's mid-plane, clipped to its outline.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<TargetHit> {
        let denom = ray.dir.dot(self.normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (self.position - ray.origin).dot(self.normal) / denom;
        if !t.is_finite() || t < 0.0 {
            return None;
        }

        let point = ray.at(t);
        let d = point - self.position;
        let local = Vec2::new(d.dot(self.right()), d.dot(self.up()));
        let (hw, hh) = (self.width * 0.5, self.height * 0.5);

        let inside = match self.shape {
            TargetShape::Rectangle => local.x.abs() <= hw && local.y.abs() <= hh,
            TargetShape::Oval => (local.x / hw).powi(2) + (local.y / hh).powi(2) <= 1.0,
        };
        if !inside {
            return None;
        }

        let normal = if denom < 0.0 { self.normal } else { -self.normal };
        Some(TargetHit { point, normal, distance: t })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(shape: TargetShape) -> TargetConfig {
        TargetConfig {
            distance_yd: 100.0,
            crossrange_yd: 2.0,
            width_in: 12.0,
            height_in: 18.0,
            shape,
            paint: Color::rgb(0.9, 0.9, 0.9),
        }
    }

    fn target(shape: TargetShape) -> SteelTarget {
        SteelTarget::on_range(&Terrain::new(500.0, 20.0), &config(shape))
    }

    fn shot_at(point: Vec3) -> Ray {
        let origin = Vec3::new(0.0, 1.5, 0.0);
        Ray::new(origin, point - origin)
    }

    // ── placement ─────────────────────────────────────────────────────────

    #[test]
    fn placed_downrange_facing_shooter() {
        let t = target(TargetShape::Rectangle);
        let terrain = Terrain::new(500.0, 20.0);
        assert!((t.position.z + 91.44).abs() < 1e-3);
        assert!((t.position.x - 1.8288).abs() < 1e-4);
        let bottom = t.position.y - t.height * 0.5;
        let ground = terrain.height_at(t.position.x, t.position.z);
        assert!((bottom - ground - STAND_HEIGHT).abs() < 1e-4);
        assert_eq!(t.normal, Vec3::Z);
    }

    #[test]
    fn local_frame_matches_world_axes() {
        let t = target(TargetShape::Rectangle);
        assert!((t.right() - Vec3::X).length() < 1e-6);
        assert!((t.up() - Vec3::Y).length() < 1e-6);
        let corner = t.local_to_world(Vec3::new(t.width * 0.5, t.height * 0.5, 0.0));
        assert!((corner - (t.position + Vec3::new(t.width * 0.5, t.height * 0.5, 0.0))).length() < 1e-5);
    }

    // ── ray hits ──────────────────────────────────────────────────────────

    #[test]
    fn centre_shot_hits() {
        let t = target(TargetShape::Rectangle);
        let hit = t.intersect_ray(&shot_at(t.position)).unwrap();
        assert!((hit.point - t.position).length() < 1e-3);
        assert_eq!(hit.normal, Vec3::Z);
        assert!(hit.distance > 90.0);
    }

    #[test]
    fn corner_hits_rectangle_but_misses_oval() {
        let rect = target(TargetShape::Rectangle);
        let corner = rect.local_to_world(Vec3::new(rect.width * 0.45, rect.height * 0.45, 0.0));
        assert!(rect.intersect_ray(&shot_at(corner)).is_some());

        let oval = target(TargetShape::Oval);
        assert!(oval.intersect_ray(&shot_at(corner)).is_none());
    }

    #[test]
    fn shot_beside_plate_misses() {
        let t = target(TargetShape::Oval);
        let beside = t.position + Vec3::new(t.width, 0.0, 0.0);
        assert!(t.intersect_ray(&shot_at(beside)).is_none());
    }

    #[test]
    fn plate_behind_ray_is_missed() {
        let t = target(TargetShape::Rectangle);
        let away = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::Z);
        assert!(t.intersect_ray(&away).is_none());
    }

    // ── meshes ────────────────────────────────────────────────────────────

    #[test]
    fn rectangle_mesh_is_a_box() {
        let m = target(TargetShape::Rectangle).mesh();
        // Two 4-triangle fans plus four edge quads.
        assert_eq!(m.triangle_count(), 4 + 4 + 4 * 2);
    }

    #[test]
    fn oval_mesh_is_segmented() {
        let m = target(TargetShape::Oval).mesh();
        assert_eq!(m.triangle_count(), OVAL_SEGMENTS * 4);
    }

    #[test]
    fn front_face_is_painted_and_faces_shooter() {
        let t = target(TargetShape::Oval);
        let m = t.mesh();
        let front = &m.vertices[0];
        assert_eq!(front.normal, [0.0, 0.0, 1.0]);
        assert_eq!(front.color, t.paint.to_array());
    }

    #[test]
    fn stand_reaches_ground() {
        let t = target(TargetShape::Rectangle);
        let m = t.stand_mesh();
        assert_eq!(m.triangle_count(), 2 * 6 * 2);
        let lowest = m.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let ground = t.position.y - t.height * 0.5 - t.stand_height;
        assert!((lowest - ground).abs() < 1e-4);
    }
}

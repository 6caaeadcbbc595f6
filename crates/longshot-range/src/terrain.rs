use glam::{Vec2, Vec3};

use longshot_engine::coords::Color;
use longshot_engine::render::mesh::MeshData;

/// Horizontal rectangle of ground at a fixed height.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GroundPlane {
    /// Centre on the XZ plane.
    pub center_xz: Vec2,
    /// Full extent along X and Z.
    pub size_xz: Vec2,
    pub height: f32,
    pub color: Color,
}

impl GroundPlane {
    /// Closed containment test on the XZ plane.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.size_xz * 0.5;
        (x - self.center_xz.x).abs() <= half.x && (z - self.center_xz.y).abs() <= half.y
    }

    /// Flat quad facing +Y.
    pub fn mesh(&self) -> MeshData {
        let half = self.size_xz * 0.5;
        let (x0, x1) = (self.center_xz.x - half.x, self.center_xz.x + half.x);
        let (z0, z1) = (self.center_xz.y - half.y, self.center_xz.y + half.y);
        let h = self.height;

        let mut mesh = MeshData::new();
        mesh.push_quad(
            [
                Vec3::new(x0, h, z1),
                Vec3::new(x1, h, z1),
                Vec3::new(x1, h, z0),
                Vec3::new(x0, h, z0),
            ],
            self.color,
        );
        mesh
    }
}

/// Static ground: a wide field and a mowed lane running downrange.
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    pub field: GroundPlane,
    pub lane: GroundPlane,
}

/// The lane sits just above the field so the two never z-fight.
const LANE_LIFT: f32 = 0.02;

impl Terrain {
    /// Terrain for a range `length` metres deep with a `lane_width` metre lane.
    ///
    /// The firing line is at `z = 0`; the field extends a little behind it
    /// and well past the furthest target.
    pub fn new(length: f32, lane_width: f32) -> Self {
        let length = length.max(1.0);
        let lane_width = lane_width.max(0.1);

        let behind = 50.0;
        let beyond = length * 0.5 + 200.0;
        let depth = behind + length + beyond;
        let field_center_z = behind - depth * 0.5;

        let field = GroundPlane {
            center_xz: Vec2::new(0.0, field_center_z),
            size_xz: Vec2::new((length * 1.5).max(400.0), depth),
            height: 0.0,
            color: Color::from_srgb_u8(86, 112, 58, 255),
        };
        let lane = GroundPlane {
            center_xz: Vec2::new(0.0, -length * 0.5 + 5.0),
            size_xz: Vec2::new(lane_width, length + 10.0),
            height: LANE_LIFT,
            color: Color::from_srgb_u8(122, 150, 78, 255),
        };

        Self { field, lane }
    }

    pub fn planes(&self) -> [&GroundPlane; 2] {
        [&self.field, &self.lane]
    }

    /// Height of the highest plane containing `(x, z)`; the field height outside every plane.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.planes()
            .into_iter()
            .filter(|p| p.contains(x, z))
            .map(|p| p.height)
            .fold(None, |acc: Option<f32>, h| Some(acc.map_or(h, |a| a.max(h))))
            .unwrap_or(self.field.height)
    }

    pub fn ground_point(&self, x: f32, z: f32) -> Vec3 {
        Vec3::new(x, self.height_at(x, z), z)
    }

    /// One flat mesh per plane, field first.
    pub fn meshes(&self) -> Vec<MeshData> {
        self.planes().into_iter().map(GroundPlane::mesh).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain() -> Terrain {
        Terrain::new(1000.0, 20.0)
    }

    // ── height queries ────────────────────────────────────────────────────

    #[test]
    fn lane_is_above_field() {
        let t = terrain();
        assert!(t.lane.height > t.field.height);
        assert_eq!(t.height_at(0.0, -500.0), t.lane.height);
    }

    #[test]
    fn off_lane_uses_field() {
        let t = terrain();
        assert_eq!(t.height_at(100.0, -500.0), t.field.height);
    }

    #[test]
    fn outside_everything_falls_back_to_field() {
        let t = terrain();
        assert_eq!(t.height_at(1.0e6, 1.0e6), t.field.height);
    }

    #[test]
    fn ground_point_sits_on_surface() {
        let t = terrain();
        let p = t.ground_point(2.0, -300.0);
        assert_eq!(p, Vec3::new(2.0, t.lane.height, -300.0));
    }

    #[test]
    fn field_covers_firing_line_and_targets() {
        let t = terrain();
        assert!(t.field.contains(0.0, 10.0));
        assert!(t.field.contains(0.0, -1000.0));
        assert!(t.lane.contains(0.0, -1000.0));
    }

    // ── meshes ────────────────────────────────────────────────────────────

    #[test]
    fn one_upward_quad_per_plane() {
        let meshes = terrain().meshes();
        assert_eq!(meshes.len(), 2);
        for m in &meshes {
            assert_eq!(m.triangle_count(), 2);
            assert!(m.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        }
    }
}

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

/// Pitch stays short of straight up/down so the view basis never degenerates.
const MAX_PITCH: f32 = 89.0 * PI / 180.0;

/// A world-space ray with a unit direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir: dir.normalize_or(Vec3::NEG_Z) }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Yaw/pitch perspective camera.
///
/// `yaw = 0, pitch = 0` looks downrange (-Z). Positive yaw turns right
/// (towards +X), positive pitch looks up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, fov_deg: f32, aspect: f32) -> Self {
        Self { position, fov_deg, aspect, ..Self::default() }
    }

    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cp * sy, sp, -cp * cy)
    }

    /// Horizontal right vector.
    pub fn right(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(cy, 0.0, sy)
    }

    /// Points the camera at `point`. No-op when `point` is the camera position.
    pub fn aim_at(&mut self, point: Vec3) {
        if let Some((yaw, pitch)) = self.angles_to(point) {
            self.yaw = yaw;
            self.pitch = pitch;
        }
    }

    /// Turns towards `point` at no more than `max_rate` rad/s on each axis.
    ///
    /// Returns `true` once the camera is on target.
    pub fn aim_towards(&mut self, point: Vec3, max_rate: f32, dt: f32) -> bool {
        let Some((yaw, pitch)) = self.angles_to(point) else {
            return true;
        };
        let max_step = (max_rate * dt).max(0.0);

        let d_yaw = wrap_angle(yaw - self.yaw);
        let d_pitch = pitch - self.pitch;

        self.yaw = wrap_angle(self.yaw + d_yaw.clamp(-max_step, max_step));
        self.pitch += d_pitch.clamp(-max_step, max_step);

        d_yaw.abs() <= max_step && d_pitch.abs() <= max_step
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    /// Right-handed projection with wgpu's 0..1 depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_deg.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn with_fov(mut self, fov_deg: f32) -> Self {
        self.fov_deg = fov_deg;
        self
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// World ray through an NDC point (`(0, 0)` is the view centre).
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(self.position, far - near)
    }

    fn angles_to(&self, point: Vec3) -> Option<(f32, f32)> {
        let d = point - self.position;
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        if horizontal < 1e-6 && d.y.abs() < 1e-6 {
            return None;
        }
        let yaw = if horizontal < 1e-6 { self.yaw } else { d.x.atan2(-d.z) };
        let pitch = d.y.atan2(horizontal).clamp(-MAX_PITCH, MAX_PITCH);
        Some((yaw, pitch))
    }
}

/// Wraps an angle to `[-PI, PI)`.
fn wrap_angle(a: f32) -> f32 {
    (a + PI).rem_euclid(TAU) - PI
}

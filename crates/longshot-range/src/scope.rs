use std::f32::consts::TAU;

use longshot_engine::coords::{NdcRect, Vec2, Viewport};

use crate::camera::PerspectiveCamera;
use crate::reticle::{ReticleConfig, ReticleLayout};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScopeConfig {
    /// Vertical field of view at 1× magnification, degrees.
    pub base_fov_deg: f32,
    pub min_magnification: f32,
    pub max_magnification: f32,
    /// On-screen diameter in NDC height units (`2.0` is the full canvas height).
    pub diameter: f32,
    /// Scope layer supersample factor.
    pub supersample: f32,
    /// Width of the soft edge of the eyepiece mask, in layer pixels.
    pub mask_feather_px: f32,
    /// Duration of one full zoom in/out sweep in the demo.
    pub zoom_period_s: f32,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            base_fov_deg: 30.0,
            min_magnification: 4.0,
            max_magnification: 25.0,
            diameter: 1.6,
            supersample: 2.0,
            mask_feather_px: 2.0,
            zoom_period_s: 24.0,
        }
    }
}

/// Variable-power riflescope.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub config: ScopeConfig,
    pub reticle: ReticleConfig,
    magnification: f32,
}

impl Scope {
    pub fn new(config: ScopeConfig, reticle: ReticleConfig) -> Self {
        let (lo, _) = magnification_bounds(&config);
        Self { magnification: lo, config, reticle }
    }

    #[inline]
    pub fn magnification(&self) -> f32 {
        self.magnification
    }

    /// Clamped to the configured range; NaN selects the minimum.
    pub fn set_magnification(&mut self, magnification: f32) {
        let (lo, hi) = magnification_bounds(&self.config);
        self.magnification = if magnification.is_nan() { lo } else { magnification.clamp(lo, hi) };
    }

    /// Vertical field of view at the current magnification, degrees.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.config.base_fov_deg / self.magnification
    }

    /// Deterministic zoom sweep: min → max → min over `zoom_period_s`,
    /// easing at both ends and interpolating geometrically so each power
    /// step feels alike. Returns the new magnification.
    pub fn zoom_cycle(&mut self, t: f32) -> f32 {
        let (lo, hi) = magnification_bounds(&self.config);
        let period = self.config.zoom_period_s.max(f32::EPSILON);
        let s = 0.5 - 0.5 * (t / period * TAU).cos();
        self.set_magnification(lo * (hi / lo).powf(s));
        self.magnification
    }

    /// The view through the scope: same pose as `main`, narrower FOV, square.
    pub fn camera(&self, main: &PerspectiveCamera) -> PerspectiveCamera {
        PerspectiveCamera { aspect: 1.0, ..main.with_fov(self.fov()) }
    }

    /// Centred on-screen square, `diameter` NDC-height units tall.
    pub fn ndc_rect(&self, viewport: Viewport) -> NdcRect {
        let h = self.config.diameter;
        let w = h / viewport.aspect();
        NdcRect::from_center(Vec2::zero(), Vec2::new(w, h))
    }

    pub fn reticle_layout(&self, scope_px: f32) -> ReticleLayout {
        ReticleLayout::new(self.reticle, self.fov(), scope_px)
    }
}

/// `(min, max)` magnification with `0 < min <= max`, whatever the config holds.
fn magnification_bounds(config: &ScopeConfig) -> (f32, f32) {
    let lo = config.min_magnification;
    let lo = if lo.is_finite() && lo > 0.0 { lo } else { 1.0 };
    let hi = config.max_magnification;
    let hi = if hi.is_finite() { hi.max(lo) } else { lo };
    (lo, hi)
}

/// Square R8 eyepiece mask: 255 inside the circle, 0 outside, with a linear
/// ramp `feather_px` wide just inside the edge. Rows are top to bottom.
pub fn circular_mask(size_px: u32, feather_px: f32) -> Vec<u8> {
    let size = size_px.max(1);
    let radius = size as f32 * 0.5;
    let feather = feather_px.max(0.0);
    let mut out = Vec::with_capacity(size as usize * size as usize);

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            let inside = radius - (dx * dx + dy * dy).sqrt();
            let coverage = if feather > 0.0 {
                (inside / feather).clamp(0.0, 1.0)
            } else if inside >= 0.0 {
                1.0
            } else {
                0.0
            };
            out.push((coverage * 255.0).round() as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn scope() -> Scope {
        Scope::new(ScopeConfig::default(), ReticleConfig::default())
    }

    // ── magnification ─────────────────────────────────────────────────────

    #[test]
    fn fov_divides_by_magnification() {
        let mut s = scope();
        s.set_magnification(10.0);
        assert!((s.fov() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn magnification_is_clamped() {
        let mut s = scope();
        s.set_magnification(100.0);
        assert_eq!(s.magnification(), 25.0);
        s.set_magnification(0.5);
        assert_eq!(s.magnification(), 4.0);
        s.set_magnification(f32::NAN);
        assert_eq!(s.magnification(), 4.0);
    }

    #[test]
    fn reversed_bounds_do_not_panic() {
        let config = ScopeConfig { min_magnification: 20.0, max_magnification: 5.0, ..ScopeConfig::default() };
        let mut s = Scope::new(config, ReticleConfig::default());
        assert_eq!(s.zoom_cycle(1.0), 20.0);
        s.set_magnification(3.0);
        assert_eq!(s.magnification(), 20.0);
    }

    #[test]
    fn non_positive_minimum_keeps_fov_finite() {
        let config = ScopeConfig { min_magnification: 0.0, max_magnification: f32::NAN, ..ScopeConfig::default() };
        let mut s = Scope::new(config, ReticleConfig::default());
        s.zoom_cycle(3.0);
        assert_eq!(s.magnification(), 1.0);
        assert!(s.fov().is_finite());
    }

    #[test]
    fn zoom_cycle_sweeps_full_range() {
        let mut s = scope();
        let period = s.config.zoom_period_s;
        assert!((s.zoom_cycle(0.0) - 4.0).abs() < 1e-4);
        assert!((s.zoom_cycle(period * 0.5) - 25.0).abs() < 1e-3);
        assert!((s.zoom_cycle(period) - 4.0).abs() < 1e-3);
        let quarter = s.zoom_cycle(period * 0.25);
        assert!((quarter - 10.0).abs() < 1e-3); // geometric midpoint of 4..25
    }

    // ── camera ────────────────────────────────────────────────────────────

    #[test]
    fn scope_camera_shares_pose() {
        let mut s = scope();
        s.set_magnification(12.0);
        let mut main = PerspectiveCamera::new(Vec3::new(0.0, 1.2, 0.0), 60.0, 16.0 / 9.0);
        main.aim_at(Vec3::new(5.0, 1.0, -300.0));

        let cam = s.camera(&main);
        assert_eq!(cam.position, main.position);
        assert_eq!(cam.forward(), main.forward());
        assert_eq!(cam.aspect, 1.0);
        assert!((cam.fov_deg - 2.5).abs() < 1e-6);
    }

    // ── screen placement ──────────────────────────────────────────────────

    #[test]
    fn ndc_rect_is_square_on_screen() {
        let s = scope();
        let vp = Viewport::new(1600.0, 900.0);
        let r = s.ndc_rect(vp).to_pixel_rect(vp);
        assert!((r.size.x - r.size.y).abs() < 1e-3);
        assert!((r.size.y - 720.0).abs() < 1e-3);
        assert!((r.center().x - 800.0).abs() < 1e-3);
    }

    #[test]
    fn ndc_rect_follows_resize() {
        let s = scope();
        let a = s.ndc_rect(Viewport::new(1600.0, 900.0));
        let b = s.ndc_rect(Viewport::new(900.0, 900.0));
        assert!(b.size.x > a.size.x);
        assert_eq!(a.size.y, b.size.y);
    }

    // ── mask ──────────────────────────────────────────────────────────────

    #[test]
    fn mask_is_opaque_inside_and_clear_outside() {
        let size = 64;
        let m = circular_mask(size, 2.0);
        assert_eq!(m.len(), 64 * 64);
        assert_eq!(m[32 * 64 + 32], 255);
        assert_eq!(m[0], 0);
        assert_eq!(m[64 * 64 - 1], 0);
    }

    #[test]
    fn mask_feathers_edge() {
        let size = 64;
        let m = circular_mask(size, 4.0);
        // Row through the centre: the ramp crosses intermediate values.
        let row = &m[32 * 64..33 * 64];
        assert!(row.iter().any(|&v| v > 0 && v < 255));
    }

    #[test]
    fn hard_mask_has_no_ramp() {
        let m = circular_mask(32, 0.0);
        assert!(m.iter().all(|&v| v == 0 || v == 255));
    }
}

use glam::Vec3;

use longshot_engine::compositor::{SUPERSAMPLE_MAX, SUPERSAMPLE_MIN};
use longshot_engine::coords::Color;

use crate::reticle::ReticleConfig;
use crate::scope::ScopeConfig;
use crate::target::TargetShape;
use crate::wind::WindConfig;

/// One steel plate, in shooter's units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TargetConfig {
    pub distance_yd: f32,
    /// Positive to the right of the lane centre.
    pub crossrange_yd: f32,
    pub width_in: f32,
    pub height_in: f32,
    pub shape: TargetShape,
    pub paint: Color,
}

/// How the demo sweeps the rifle across the targets.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AimConfig {
    pub turn_rate_deg_s: f32,
    /// Time spent on each target before moving on.
    pub dwell_s: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self { turn_rate_deg_s: 4.0, dwell_s: 3.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    pub title: String,
    pub window_width: f64,
    pub window_height: f64,

    /// Eye height above the ground at the firing line, metres.
    pub eye_height: f32,
    /// Vertical field of view of the unmagnified view, degrees.
    pub main_fov_deg: f32,
    pub lane_width: f32,

    pub targets: Vec<TargetConfig>,
    pub wind: WindConfig,
    /// Flag pole placement: `(crossrange, downrange)` in yards.
    pub flag_position_yd: (f32, f32),
    pub flag_pole_height: f32,

    pub aim: AimConfig,
    pub scope: ScopeConfig,
    pub reticle: ReticleConfig,
}

impl Default for RangeConfig {
    fn default() -> Self {
        let white = Color::from_srgb_u8(235, 235, 230, 255);
        let orange = Color::from_srgb_u8(240, 110, 20, 255);
        let plate = |distance_yd: f32,
                     crossrange_yd: f32,
                     width_in: f32,
                     height_in: f32,
                     shape: TargetShape,
                     paint: Color| TargetConfig {
            distance_yd,
            crossrange_yd,
            width_in,
            height_in,
            shape,
            paint,
        };

        Self {
            title: "longshot".to_string(),
            window_width: 1280.0,
            window_height: 720.0,
            eye_height: 1.2,
            main_fov_deg: 50.0,
            lane_width: 24.0,
            targets: vec![
                plate(100.0, -2.0, 12.0, 18.0, TargetShape::Rectangle, white),
                plate(200.0, 3.0, 12.0, 12.0, TargetShape::Oval, orange),
                plate(300.0, -4.0, 18.0, 30.0, TargetShape::Rectangle, white),
                plate(500.0, 5.0, 18.0, 24.0, TargetShape::Oval, orange),
                plate(800.0, 0.0, 24.0, 36.0, TargetShape::Rectangle, white),
            ],
            wind: WindConfig::default(),
            flag_position_yd: (-12.0, 150.0),
            flag_pole_height: 6.0,
            aim: AimConfig::default(),
            scope: ScopeConfig::default(),
            reticle: ReticleConfig::default(),
        }
    }
}

impl RangeConfig {
    /// Clamps out-of-range values, logging a warning for each one changed.
    pub fn validated(mut self) -> Self {
        self.window_width = clamp_f64("window_width", self.window_width, 1.0, 16384.0);
        self.window_height = clamp_f64("window_height", self.window_height, 1.0, 16384.0);
        self.eye_height = clamp("eye_height", self.eye_height, 0.1, 10.0);
        self.main_fov_deg = clamp("main_fov_deg", self.main_fov_deg, 10.0, 120.0);
        self.lane_width = clamp("lane_width", self.lane_width, 1.0, 500.0);
        self.flag_pole_height = clamp("flag_pole_height", self.flag_pole_height, 1.0, 30.0);

        for (i, t) in self.targets.iter_mut().enumerate() {
            t.distance_yd = clamp(&format!("targets[{i}].distance_yd"), t.distance_yd, 10.0, 3000.0);
            t.width_in = clamp(&format!("targets[{i}].width_in"), t.width_in, 1.0, 120.0);
            t.height_in = clamp(&format!("targets[{i}].height_in"), t.height_in, 1.0, 120.0);
        }

        let w = &mut self.wind;
        if !w.steady.is_finite() {
            log::warn!("config: wind.steady {:?} is not finite; using calm air", w.steady);
            w.steady = Vec3::ZERO;
        }
        w.advection_gain = clamp("wind.advection_gain", w.advection_gain, 0.0, 100.0);
        w.advection_alpha = clamp("wind.advection_alpha", w.advection_alpha, 0.0, 1.0);

        self.aim.turn_rate_deg_s = clamp("aim.turn_rate_deg_s", self.aim.turn_rate_deg_s, 0.1, 360.0);
        self.aim.dwell_s = clamp("aim.dwell_s", self.aim.dwell_s, 0.0, 60.0);

        let s = &mut self.scope;
        s.base_fov_deg = clamp("scope.base_fov_deg", s.base_fov_deg, 1.0, 120.0);
        s.min_magnification = clamp("scope.min_magnification", s.min_magnification, 1.0, 100.0);
        s.max_magnification =
            clamp("scope.max_magnification", s.max_magnification, s.min_magnification, 100.0);
        s.diameter = clamp("scope.diameter", s.diameter, 0.1, 2.0);
        s.supersample =
            clamp("scope.supersample", s.supersample, SUPERSAMPLE_MIN, SUPERSAMPLE_MAX);
        s.mask_feather_px = clamp("scope.mask_feather_px", s.mask_feather_px, 0.0, 64.0);
        s.zoom_period_s = clamp("scope.zoom_period_s", s.zoom_period_s, 1.0, 3600.0);

        let r = &mut self.reticle;
        r.major_spacing_mrad = clamp("reticle.major_spacing_mrad", r.major_spacing_mrad, 0.1, 100.0);
        r.minor_spacing_mrad = clamp("reticle.minor_spacing_mrad", r.minor_spacing_mrad, 0.0, 100.0);
        r.extent_mrad = clamp("reticle.extent_mrad", r.extent_mrad, 0.0, 1000.0);
        r.line_width_px = clamp("reticle.line_width_px", r.line_width_px, 0.5, 16.0);

        self
    }

    /// Furthest target distance in metres, or a 100 m default for an empty range.
    pub fn range_length_m(&self) -> f32 {
        self.targets
            .iter()
            .map(|t| crate::units::yards_to_m(t.distance_yd))
            .fold(100.0, f32::max)
    }
}

/// Clamps `value` to `[min, max]`; NaN becomes `min`.
fn clamp(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        log::warn!("config: {name} = {value} out of range [{min}, {max}]; using {clamped}");
    }
    clamped
}

fn clamp_f64(name: &str, value: f64, min: f64, max: f64) -> f64 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        log::warn!("config: {name} = {value} out of range [{min}, {max}]; using {clamped}");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_already_valid() {
        let config = RangeConfig::default();
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn magnification_range_is_ordered() {
        let mut config = RangeConfig::default();
        config.scope.min_magnification = 20.0;
        config.scope.max_magnification = 5.0;
        let v = config.validated();
        assert_eq!(v.scope.min_magnification, 20.0);
        assert_eq!(v.scope.max_magnification, 20.0);
    }

    #[test]
    fn supersample_clamped_to_compositor_range() {
        let mut config = RangeConfig::default();
        config.scope.supersample = 10.0;
        assert_eq!(config.validated().scope.supersample, SUPERSAMPLE_MAX);
    }

    #[test]
    fn non_positive_sizes_are_raised() {
        let mut config = RangeConfig::default();
        config.targets[0].width_in = 0.0;
        config.targets[1].height_in = -3.0;
        config.scope.diameter = 0.0;
        let v = config.validated();
        assert_eq!(v.targets[0].width_in, 1.0);
        assert_eq!(v.targets[1].height_in, 1.0);
        assert_eq!(v.scope.diameter, 0.1);
    }

    #[test]
    fn nan_falls_back_to_minimum() {
        let mut config = RangeConfig::default();
        config.main_fov_deg = f32::NAN;
        config.wind.steady = Vec3::new(f32::NAN, 0.0, 0.0);
        config.wind.advection_alpha = f32::NAN;
        let v = config.validated();
        assert_eq!(v.main_fov_deg, 10.0);
        assert_eq!(v.wind.steady, Vec3::ZERO);
        assert_eq!(v.wind.advection_alpha, 0.0);
    }

    #[test]
    fn range_length_uses_furthest_target() {
        let config = RangeConfig::default();
        assert!((config.range_length_m() - 800.0 * 0.9144).abs() < 1e-3);
        let empty = RangeConfig { targets: Vec::new(), ..RangeConfig::default() };
        assert_eq!(empty.range_length_m(), 100.0);
    }
}

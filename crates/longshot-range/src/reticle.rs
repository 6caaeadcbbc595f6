//! Mil reticle layout.
//!
//! The reticle lives in the scope's focal plane, so its marks scale with
//! magnification: the angle covered by the scope texture is tied to the
//! scope's field of view by [`mrad_per_unit`], and ticks sit at fixed
//! milliradian intervals inside it. When zoomed far out the minor ticks
//! would crowd together, so they are dropped below a minimum pixel gap.

use longshot_engine::coords::Color;
use longshot_engine::render::reticle::ReticleParams;

/// Milliradians spanned by one full scope texture width at `fov_deg`.
#[inline]
pub fn mrad_per_unit(fov_deg: f32) -> f32 {
    fov_deg * 1000.0 / 60.0
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReticleConfig {
    pub major_spacing_mrad: f32,
    /// `0.0` disables minor ticks.
    pub minor_spacing_mrad: f32,
    pub major_tick_len_mrad: f32,
    pub minor_tick_len_mrad: f32,
    /// Ticks and crosshair stop this far from the centre.
    pub extent_mrad: f32,
    /// Minor ticks closer than this on screen are hidden.
    pub min_minor_gap_px: f32,
    /// Line width on screen.
    pub line_width_px: f32,
    /// Housing ring width as a fraction of the scope width.
    pub ring_width_uv: f32,
    pub color: Color,
    pub ring_color: Color,
}

impl Default for ReticleConfig {
    fn default() -> Self {
        Self {
            major_spacing_mrad: 1.0,
            minor_spacing_mrad: 0.5,
            major_tick_len_mrad: 0.6,
            minor_tick_len_mrad: 0.3,
            extent_mrad: 10.0,
            min_minor_gap_px: 6.0,
            line_width_px: 1.5,
            ring_width_uv: 0.02,
            color: Color::black(),
            ring_color: Color::rgb(0.02, 0.02, 0.02),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickKind {
    Major,
    Minor,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tick {
    pub axis: TickAxis,
    /// Signed angular offset from the centre: right / up positive.
    pub mrad: f32,
    /// Texture coordinate along the axis (`0.5` is the centre; V grows downward).
    pub uv: f32,
    pub kind: TickKind,
}

/// Reticle geometry resolved for one zoom level and scope size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReticleLayout {
    config: ReticleConfig,
    mrad_per_unit: f32,
    scope_px: f32,
    minor_visible: bool,
}

impl ReticleLayout {
    pub fn new(config: ReticleConfig, fov_deg: f32, scope_px: f32) -> Self {
        let mrad_per_unit = mrad_per_unit(fov_deg).max(f32::EPSILON);
        let scope_px = scope_px.max(1.0);
        let minor_gap_px = config.minor_spacing_mrad * scope_px / mrad_per_unit;
        let minor_visible =
            config.minor_spacing_mrad > 0.0 && minor_gap_px >= config.min_minor_gap_px;

        Self { config, mrad_per_unit, scope_px, minor_visible }
    }

    #[inline]
    pub fn mrad_per_unit(&self) -> f32 {
        self.mrad_per_unit
    }

    #[inline]
    pub fn minor_visible(&self) -> bool {
        self.minor_visible
    }

    /// Screen pixels per milliradian.
    #[inline]
    pub fn px_per_mrad(&self) -> f32 {
        self.scope_px / self.mrad_per_unit
    }

    /// Every visible tick on both axes, excluding the centre.
    ///
    /// Minor ticks that coincide with a major tick are omitted.
    pub fn ticks(&self) -> Vec<Tick> {
        let mut out = Vec::new();
        let c = &self.config;

        let mut tier = |spacing: f32, kind: TickKind, skip_every: Option<f32>| {
            if spacing <= 0.0 {
                return;
            }
            let count = (c.extent_mrad / spacing + 1e-4).floor() as i32;
            for k in 1..=count {
                let m = k as f32 * spacing;
                if let Some(major) = skip_every {
                    let r = m / major;
                    if (r - r.round()).abs() < 1e-4 {
                        continue;
                    }
                }
                for signed in [m, -m] {
                    for axis in [TickAxis::Horizontal, TickAxis::Vertical] {
                        let along = signed / self.mrad_per_unit;
                        let uv = match axis {
                            TickAxis::Horizontal => 0.5 + along,
                            TickAxis::Vertical => 0.5 - along,
                        };
                        out.push(Tick { axis, mrad: signed, uv, kind });
                    }
                }
            }
        };

        tier(c.major_spacing_mrad, TickKind::Major, None);
        if self.minor_visible {
            let skip = (c.major_spacing_mrad > 0.0).then_some(c.major_spacing_mrad);
            tier(c.minor_spacing_mrad, TickKind::Minor, skip);
        }
        out
    }

    /// Shader parameters for [`ReticleRenderer`](longshot_engine::render::reticle::ReticleRenderer).
    pub fn params(&self) -> ReticleParams {
        let c = &self.config;
        ReticleParams {
            mrad_per_unit: self.mrad_per_unit,
            major_spacing_mrad: c.major_spacing_mrad,
            minor_spacing_mrad: if self.minor_visible { c.minor_spacing_mrad } else { 0.0 },
            major_tick_len_mrad: c.major_tick_len_mrad,
            minor_tick_len_mrad: c.minor_tick_len_mrad,
            extent_mrad: c.extent_mrad,
            line_width_uv: c.line_width_px / self.scope_px,
            ring_width_uv: c.ring_width_uv,
            color: c.color,
            ring_color: c.ring_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(fov_deg: f32, scope_px: f32) -> ReticleLayout {
        ReticleLayout::new(ReticleConfig::default(), fov_deg, scope_px)
    }

    // ── scaling ───────────────────────────────────────────────────────────

    #[test]
    fn mrad_per_unit_formula() {
        assert_eq!(mrad_per_unit(60.0), 1000.0);
        assert_eq!(mrad_per_unit(6.0), 100.0);
        assert!((mrad_per_unit(1.5) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn first_major_tick_position() {
        let l = layout(1.5, 400.0);
        let right = l
            .ticks()
            .into_iter()
            .find(|t| t.axis == TickAxis::Horizontal && t.kind == TickKind::Major && t.mrad == 1.0)
            .unwrap();
        assert!((right.uv - 0.54).abs() < 1e-5);
    }

    #[test]
    fn vertical_ticks_grow_upwards() {
        let l = layout(1.5, 400.0);
        let up = l
            .ticks()
            .into_iter()
            .find(|t| t.axis == TickAxis::Vertical && t.mrad == 2.0)
            .unwrap();
        assert!(up.uv < 0.5);
    }

    // ── zoom dependence ───────────────────────────────────────────────────

    #[test]
    fn zoomed_in_shows_minor_ticks() {
        // 25 mrad across 400 px = 16 px/mrad, minor gap 8 px.
        let l = layout(1.5, 400.0);
        assert!(l.minor_visible());
        let ticks = l.ticks();
        let majors = ticks.iter().filter(|t| t.kind == TickKind::Major).count();
        let minors = ticks.iter().filter(|t| t.kind == TickKind::Minor).count();
        assert_eq!(majors, 10 * 4);
        assert_eq!(minors, 10 * 4);
        assert!(ticks.iter().all(|t| t.kind == TickKind::Major || t.mrad.fract() != 0.0));
    }

    #[test]
    fn zoomed_out_drops_minor_ticks() {
        // 50 mrad across 400 px = 8 px/mrad, minor gap 4 px.
        let l = layout(3.0, 400.0);
        assert!(!l.minor_visible());
        assert!(l.ticks().iter().all(|t| t.kind == TickKind::Major));
        assert_eq!(l.params().minor_spacing_mrad, 0.0);
    }

    #[test]
    fn zero_minor_spacing_disables_tier() {
        let config = ReticleConfig { minor_spacing_mrad: 0.0, ..ReticleConfig::default() };
        let l = ReticleLayout::new(config, 0.5, 1000.0);
        assert!(!l.minor_visible());
    }

    // ── shader params ─────────────────────────────────────────────────────

    #[test]
    fn params_carry_layout() {
        let l = layout(1.5, 400.0);
        let p = l.params();
        assert!((p.mrad_per_unit - 25.0).abs() < 1e-5);
        assert!((p.line_width_uv - 1.5 / 400.0).abs() < 1e-7);
        assert_eq!(p.minor_spacing_mrad, 0.5);
        assert_eq!(p.extent_mrad, 10.0);
    }
}

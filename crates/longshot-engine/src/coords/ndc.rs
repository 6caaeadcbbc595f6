use super::{Rect, Vec2, Viewport};

/// Rectangle in normalized device coordinates.
///
/// `origin` is the bottom-left corner, +Y up. The whole canvas is
/// `origin = (-1, -1), size = (2, 2)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NdcRect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Default for NdcRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl NdcRect {
    /// The whole canvas.
    pub const FULL: NdcRect = NdcRect {
        origin: Vec2::new(-1.0, -1.0),
        size: Vec2::new(2.0, 2.0),
    };

    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self { origin: center - size * 0.5, size }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Finite with a strictly positive size.
    ///
    /// A layer may extend past the canvas edge; only its size is constrained.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.origin.is_finite() && self.size.is_finite() && self.size.x > 0.0 && self.size.y > 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// Maps this rect to canvas pixels (top-left origin, +Y down).
    pub fn to_pixel_rect(self, viewport: Viewport) -> Rect {
        let w = self.size.x * 0.5 * viewport.width;
        let h = self.size.y * 0.5 * viewport.height;
        let x = (self.origin.x + 1.0) * 0.5 * viewport.width;
        // Top edge in NDC is origin.y + size.y; pixel Y grows downward.
        let y = (1.0 - (self.origin.y + self.size.y)) * 0.5 * viewport.height;
        Rect::new(x, y, w, h)
    }
}

/// Maps an NDC point to canvas pixels.
#[inline]
pub fn ndc_to_pixel(p: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (p.x + 1.0) * 0.5 * viewport.width,
        (1.0 - p.y) * 0.5 * viewport.height,
    )
}

/// Maps a canvas pixel position to NDC. Inverse of [`ndc_to_pixel`].
///
/// Returns the NDC origin for a degenerate viewport.
#[inline]
pub fn pixel_to_ndc(p: Vec2, viewport: Viewport) -> Vec2 {
    if !viewport.is_valid() {
        return Vec2::zero();
    }
    Vec2::new(
        p.x / viewport.width * 2.0 - 1.0,
        1.0 - p.y / viewport.height * 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport::new(1280.0, 720.0);

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    // ── point mapping ─────────────────────────────────────────────────────

    #[test]
    fn ndc_origin_is_canvas_center() {
        assert_eq!(ndc_to_pixel(Vec2::zero(), VP), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn ndc_top_left_is_pixel_origin() {
        assert_eq!(ndc_to_pixel(Vec2::new(-1.0, 1.0), VP), Vec2::zero());
    }

    #[test]
    fn pixel_to_ndc_inverts_ndc_to_pixel() {
        let p = Vec2::new(0.25, -0.6);
        assert!(approx(pixel_to_ndc(ndc_to_pixel(p, VP), VP), p));
    }

    #[test]
    fn pixel_to_ndc_degenerate_viewport() {
        assert_eq!(pixel_to_ndc(Vec2::new(3.0, 4.0), Viewport::new(0.0, 0.0)), Vec2::zero());
    }

    // ── rect mapping ──────────────────────────────────────────────────────

    #[test]
    fn full_rect_covers_canvas() {
        assert_eq!(NdcRect::FULL.to_pixel_rect(VP), Rect::new(0.0, 0.0, 1280.0, 720.0));
    }

    #[test]
    fn upper_right_quadrant_maps_to_top_right_pixels() {
        let r = NdcRect::new(0.0, 0.0, 1.0, 1.0).to_pixel_rect(VP);
        assert_eq!(r, Rect::new(640.0, 0.0, 640.0, 360.0));
    }

    #[test]
    fn centered_rect_stays_centered() {
        let r = NdcRect::from_center(Vec2::zero(), Vec2::new(0.5, 0.5)).to_pixel_rect(VP);
        assert!(approx(r.center(), Vec2::new(640.0, 360.0)));
        assert!(approx(r.size, Vec2::new(320.0, 180.0)));
    }

    // ── validity ──────────────────────────────────────────────────────────

    #[test]
    fn zero_or_nan_size_is_invalid() {
        assert!(!NdcRect::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!NdcRect::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(NdcRect::new(0.5, 0.5, 1.0, 1.0).is_valid());
    }

    #[test]
    fn contains_is_half_open() {
        assert!(NdcRect::FULL.contains(Vec2::new(-1.0, -1.0)));
        assert!(!NdcRect::FULL.contains(Vec2::new(1.0, 0.0)));
    }
}

/// Linear straight-alpha RGBA color.
///
/// Renderers that blend with premultiplied alpha call [`Color::premultiplied`]
/// right before upload.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Creates a linear color from sRGB bytes (`0`–`255`).
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
            a as f32 / 255.0,
        )
    }

    /// Returns `[r*a, g*a, b*a, a]` with every channel clamped to [0, 1].
    #[inline]
    pub fn premultiplied(self) -> [f32; 4] {
        let a = self.a.clamp(0.0, 1.0);
        [
            self.r.clamp(0.0, 1.0) * a,
            self.g.clamp(0.0, 1.0) * a,
            self.b.clamp(0.0, 1.0) * a,
            a,
        ]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_endpoints_are_exact() {
        let c = Color::from_srgb_u8(0, 255, 0, 255);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 1.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn srgb_midpoint_is_darker_in_linear() {
        let c = Color::from_srgb_u8(128, 128, 128, 255);
        assert!(c.r > 0.2 && c.r < 0.23);
    }

    #[test]
    fn premultiplied_scales_rgb_by_alpha() {
        let p = Color::new(1.0, 0.5, 0.0, 0.5).premultiplied();
        assert_eq!(p, [0.5, 0.25, 0.0, 0.5]);
    }

    #[test]
    fn premultiplied_clamps_out_of_range() {
        let p = Color::new(2.0, -1.0, 0.5, 1.5).premultiplied();
        assert_eq!(p, [1.0, 0.0, 0.5, 1.0]);
    }
}

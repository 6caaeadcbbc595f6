//! Unit conversions. Everything internal is SI (metres, m/s, radians).

use std::f32::consts::PI;

pub const METRES_PER_YARD: f32 = 0.9144;
pub const METRES_PER_INCH: f32 = 0.0254;
pub const MPS_PER_MPH: f32 = 0.44704;
/// 1 mrad = 3.43775 MOA.
pub const MOA_PER_MRAD: f32 = 3.43775;

#[inline]
pub fn yards_to_m(yards: f32) -> f32 {
    yards * METRES_PER_YARD
}

#[inline]
pub fn m_to_yards(metres: f32) -> f32 {
    metres / METRES_PER_YARD
}

#[inline]
pub fn inches_to_m(inches: f32) -> f32 {
    inches * METRES_PER_INCH
}

#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.0
}

#[inline]
pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / PI
}

#[inline]
pub fn mrad_to_rad(mrad: f32) -> f32 {
    mrad * 0.001
}

#[inline]
pub fn rad_to_mrad(rad: f32) -> f32 {
    rad * 1000.0
}

#[inline]
pub fn mrad_to_moa(mrad: f32) -> f32 {
    mrad * MOA_PER_MRAD
}

#[inline]
pub fn moa_to_mrad(moa: f32) -> f32 {
    moa / MOA_PER_MRAD
}

#[inline]
pub fn mph_to_mps(mph: f32) -> f32 {
    mph * MPS_PER_MPH
}

#[inline]
pub fn mps_to_mph(mps: f32) -> f32 {
    mps / MPS_PER_MPH
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn hundred_yards_in_metres() {
        assert!(close(yards_to_m(100.0), 91.44, 1e-4));
        assert!(close(m_to_yards(91.44), 100.0, 1e-3));
    }

    #[test]
    fn inch_is_exact() {
        assert!(close(inches_to_m(36.0), yards_to_m(1.0), 1e-6));
    }

    #[test]
    fn one_mrad_subtends_ten_cm_at_100m() {
        assert!(close(mrad_to_rad(1.0).tan() * 100.0, 0.1, 1e-5));
    }

    #[test]
    fn moa_and_mrad() {
        assert!(close(mrad_to_moa(1.0), 3.43775, 1e-5));
        assert!(close(moa_to_mrad(3.43775), 1.0, 1e-5));
    }

    #[test]
    fn degrees_round_trip() {
        assert!(close(rad_to_deg(deg_to_rad(37.5)), 37.5, 1e-4));
        assert!(close(rad_to_mrad(deg_to_rad(1.0)), 17.453, 1e-3));
    }

    #[test]
    fn ten_mph() {
        assert!(close(mph_to_mps(10.0), 4.4704, 1e-5));
        assert!(close(mps_to_mph(4.4704), 10.0, 1e-4));
    }
}

use crate::coords::NdcRect;

use super::ZIndex;

pub const SUPERSAMPLE_MIN: f32 = 0.25;
pub const SUPERSAMPLE_MAX: f32 = 4.0;

/// Handle to a compositor layer.
///
/// Issued by [`LayerTable::add`](super::LayerTable::add) and never reused,
/// so a stale handle fails with `UnknownLayer` instead of aliasing a newer layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LayerId(u32);

impl LayerId {
    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Placement and blending of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDesc {
    pub label: String,
    pub rect: NdcRect,
    pub z: ZIndex,
    /// Transparent layers keep their alpha when composited; opaque ones cover what is below.
    pub transparent: bool,
    /// Pixel buffer scale relative to the layer's on-screen size.
    pub supersample: f32,
    pub visible: bool,
}

impl Default for LayerDesc {
    fn default() -> Self {
        Self {
            label: String::from("layer"),
            rect: NdcRect::FULL,
            z: ZIndex::default(),
            transparent: false,
            supersample: 1.0,
            visible: true,
        }
    }
}

impl LayerDesc {
    pub fn new(label: impl Into<String>, rect: NdcRect) -> Self {
        Self { label: label.into(), rect, ..Self::default() }
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = ZIndex(z);
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_supersample(mut self, supersample: f32) -> Self {
        self.supersample = supersample;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

#[inline]
pub(crate) fn supersample_is_valid(ss: f32) -> bool {
    (SUPERSAMPLE_MIN..=SUPERSAMPLE_MAX).contains(&ss)
}

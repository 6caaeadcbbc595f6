use std::fmt;

use crate::coords::NdcRect;

use super::LayerId;

/// Error returned by layer table and compositor operations.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerError {
    /// The handle was never issued, or the layer was removed.
    UnknownLayer(LayerId),
    /// Non-finite rect, or a non-positive width/height.
    InvalidRect(NdcRect),
    /// Outside [`SUPERSAMPLE_MIN`](super::SUPERSAMPLE_MIN)..=[`SUPERSAMPLE_MAX`](super::SUPERSAMPLE_MAX), or NaN.
    InvalidSupersample(f32),
    /// Every `u32` handle has been issued.
    HandlesExhausted,
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::UnknownLayer(id) => write!(f, "unknown layer {}", id.raw()),
            LayerError::InvalidRect(r) => write!(
                f,
                "invalid layer rect: origin ({}, {}), size ({}, {})",
                r.origin.x, r.origin.y, r.size.x, r.size.y
            ),
            LayerError::InvalidSupersample(ss) => write!(
                f,
                "invalid supersample factor {} (expected {}..={})",
                ss,
                super::SUPERSAMPLE_MIN,
                super::SUPERSAMPLE_MAX
            ),
            LayerError::HandlesExhausted => write!(f, "no layer handles left"),
        }
    }
}

impl std::error::Error for LayerError {}

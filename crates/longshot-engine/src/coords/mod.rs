//! Coordinate and geometry types shared by the compositor and renderers.
//!
//! Two 2D spaces are in play:
//! - pixel space: origin top-left, +X right, +Y down (canvas / render targets)
//! - NDC: origin at the canvas centre, +X right, +Y up, canvas spans [-1, 1]
//!
//! Layers are placed in NDC so that they keep their relative placement across
//! resizes; pixel buffers are derived from NDC on demand.

mod color;
mod ndc;
mod rect;
mod vec2;
mod viewport;

pub use color::Color;
pub use ndc::{ndc_to_pixel, pixel_to_ndc, NdcRect};
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;

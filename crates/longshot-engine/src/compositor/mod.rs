//! Layer compositor.
//!
//! Layers are offscreen render targets placed on the canvas by an NDC rect.
//! Each frame the app draws into whichever layers it likes and then
//! composites all visible layers onto the surface in paint order.
//!
//! [`LayerTable`] holds the CPU-side bookkeeping (placement, z-order, pixel
//! buffer sizes); [`Compositor`] adds the GPU targets and the composite pass.

mod compositor;
mod error;
mod key;
mod layer;
mod table;
mod z_index;

pub use compositor::Compositor;
pub use error::LayerError;
pub use layer::{LayerDesc, LayerId, SUPERSAMPLE_MAX, SUPERSAMPLE_MIN};
pub use table::{DEFAULT_MAX_DIMENSION, LayerTable};
pub use z_index::ZIndex;

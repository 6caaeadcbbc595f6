//! GPU rendering subsystem.
//!
//! Each renderer owns its GPU resources (pipelines, buffers, bind groups) and
//! creates them lazily for the format of the target it is asked to draw into.
//!
//! Convention:
//! - 3D geometry is in metres, +Y up, -Z downrange (see `longshot-range`).
//! - Layer textures use [`LAYER_FORMAT`] and hold premultiplied alpha.

mod common;
mod ctx;
mod target;

pub mod composite;
pub mod mesh;
pub mod reticle;

pub use ctx::{RenderCtx, RenderTarget};
pub use target::{OffscreenTarget, DEPTH_FORMAT, LAYER_FORMAT};

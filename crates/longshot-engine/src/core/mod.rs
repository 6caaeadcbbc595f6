//! Contract between the runtime loop and the application.
//!
//! The runtime owns the window and GPU; the application only sees them
//! through [`FrameCtx`] for the duration of a frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};

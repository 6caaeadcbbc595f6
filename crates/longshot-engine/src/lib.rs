//! Longshot engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the range:
//! window loop, device, coordinate mapping, layer compositing and renderers.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod compositor;
pub mod render;

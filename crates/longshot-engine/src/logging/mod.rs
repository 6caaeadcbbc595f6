//! Logging utilities.
//!
//! Logger initialization lives here so every binary in the workspace sets up
//! the `log` facade the same way.

mod init;

pub use init::{init_logging, LoggingConfig};

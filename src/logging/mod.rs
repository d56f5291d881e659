//! Logger initialization.
//!
//! The crate logs through the `log` facade; hosts that already install their
//! own logger can skip this module entirely.

mod init;

pub use init::{init_logging, LoggingConfig};

//! Utilities for logging setup

/// Logger initialization
pub mod logger;

pub use logger::setup_logger;

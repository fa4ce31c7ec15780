//! Infrastructure layer providing configuration loading and state reporting
//!
//! This module contains the components that sit around the domain layer:
//! JSON configuration parsing and read-only state exports for external
//! monitoring systems.

/// Protocol configuration parsing
pub mod config;
/// State snapshot exports
pub mod reporting;

pub use config::{load_config, parse_config};
pub use reporting::StateReport;

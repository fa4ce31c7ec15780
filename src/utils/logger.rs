use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Resolves a `LOGLEVEL`-style string to a tracing level, defaulting to INFO
fn parse_level(raw: &str) -> Level {
    match raw.to_uppercase().as_str() {
        "DEBUG" => Level::DEBUG,
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Sets up the global tracing subscriber, once per process.
///
/// Environment variables:
/// - LOGLEVEL: Sets the log level (DEBUG, INFO, WARN, ERROR, TRACE)
pub fn setup_logger() -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let level = parse_level(&env::var("LOGLEVEL").unwrap_or_else(|_| "INFO".to_string()));

        let registry = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()));

        registry.init();
        tracing::debug!("Log level set to: {}", level);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_known_values() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("ERROR"), Level::ERROR);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("INFO"), Level::INFO);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("Warn"), Level::WARN);
    }

    #[test]
    fn test_parse_level_invalid_defaults_to_info() {
        assert_eq!(parse_level("VERBOSE"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_setup_logger_is_idempotent() {
        assert!(setup_logger().is_ok());
        assert!(setup_logger().is_ok());
    }
}

use crate::domain::protocol::{ProtocolConfig, UndistributedYieldPolicy};
use crate::domain::types::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Raw configuration file layout
#[derive(Debug, Deserialize)]
struct RawProtocolConfig {
    default_fee_bps: u32,
    #[serde(default)]
    undistributed_yield: Option<String>,
}

/// Parse protocol configuration from a JSON string
pub fn parse_config(json_str: &str) -> TokenizerResult<ProtocolConfig> {
    let raw: RawProtocolConfig = serde_json::from_str(json_str)?;

    if raw.default_fee_bps as u128 >= FeeBps::DENOMINATOR {
        return Err(TokenizerError::ParseError(format!(
            "default_fee_bps must be below {}, got {}",
            FeeBps::DENOMINATOR,
            raw.default_fee_bps
        )));
    }

    let undistributed_yield = match raw.undistributed_yield.as_deref() {
        None | Some("reject") => UndistributedYieldPolicy::Reject,
        Some("carry") => UndistributedYieldPolicy::Carry,
        Some(other) => {
            return Err(TokenizerError::ParseError(format!(
                "Unknown undistributed_yield policy: {other}"
            )))
        }
    };

    Ok(ProtocolConfig {
        default_fee_bps: FeeBps(raw.default_fee_bps),
        undistributed_yield,
    })
}

/// Load protocol configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> TokenizerResult<ProtocolConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(r#"{"default_fee_bps": 30}"#).unwrap();
        assert_eq!(config.default_fee_bps, FeeBps(30));
        assert_eq!(
            config.undistributed_yield,
            UndistributedYieldPolicy::Reject
        );
    }

    #[test]
    fn test_parse_carry_policy() {
        let config =
            parse_config(r#"{"default_fee_bps": 5, "undistributed_yield": "carry"}"#).unwrap();
        assert_eq!(config.default_fee_bps, FeeBps(5));
        assert_eq!(config.undistributed_yield, UndistributedYieldPolicy::Carry);
    }

    #[test]
    fn test_parse_unknown_policy() {
        let err = parse_config(r#"{"default_fee_bps": 30, "undistributed_yield": "burn"}"#)
            .unwrap_err();
        assert!(matches!(err, TokenizerError::ParseError(_)));
    }

    #[test]
    fn test_parse_fee_out_of_range() {
        let err = parse_config(r#"{"default_fee_bps": 10000}"#).unwrap_err();
        assert!(matches!(err, TokenizerError::ParseError(_)));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_config("not json").unwrap_err();
        assert!(matches!(err, TokenizerError::JsonError(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"default_fee_bps": 100, "undistributed_yield": "reject"}}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.default_fee_bps, FeeBps(100));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, TokenizerError::IoError(_)));
    }
}

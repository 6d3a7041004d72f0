//! Payload decoding for orchestrator-driven invocations.
//!
//! Every actuator command receives its parameters as a single serialized
//! payload on the command line: JSON, base64-encoded by default so the
//! orchestrator never has to worry about shell quoting. With `--rollback` the
//! same payload carries a serialized rollback ledger instead of parameters.

use base64::Engine;
use clap::ValueEnum;
use serde::de::DeserializeOwned;

use crate::error::{ActuatorError, Result};

/// Encoding of the `--payload` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadFormat {
    /// Base64-encoded JSON (default; quoting-safe across orchestrators)
    Base64,
    /// Raw JSON
    Raw,
}

/// Decode the payload into its JSON text form.
pub fn decode(raw: &str, format: PayloadFormat) -> Result<String> {
    match format {
        PayloadFormat::Raw => Ok(raw.to_string()),
        PayloadFormat::Base64 => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(raw.trim())
                .map_err(|e| ActuatorError::payload(format!("invalid base64 payload: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| ActuatorError::payload(format!("payload is not valid UTF-8: {e}")))
        }
    }
}

/// Decode and parse the payload into a typed value.
pub fn parse<T: DeserializeOwned>(raw: &str, format: PayloadFormat) -> Result<T> {
    let json = decode(raw, format)?;
    serde_json::from_str(&json)
        .map_err(|e| ActuatorError::validation(format!("malformed payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Params {
        port: u16,
        name: String,
    }

    #[test]
    fn test_decode_raw_passthrough() {
        let json = r#"{"port":9200,"name":"es1"}"#;
        assert_eq!(decode(json, PayloadFormat::Raw).unwrap(), json);
    }

    #[test]
    fn test_parse_base64_payload() {
        let json = r#"{"port":9200,"name":"es1"}"#;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let params: Params = parse(&encoded, PayloadFormat::Base64).unwrap();
        assert_eq!(
            params,
            Params {
                port: 9200,
                name: "es1".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_base64_is_payload_error() {
        let err = decode("not&&base64!!", PayloadFormat::Base64).unwrap_err();
        assert!(matches!(err, ActuatorError::Payload(_)));
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let err = parse::<Params>(r#"{"port":"#, PayloadFormat::Raw).unwrap_err();
        assert!(matches!(err, ActuatorError::Validation(_)));
    }
}

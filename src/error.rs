//! Error taxonomy for the mismatch sweep.
//!
//! Configuration problems surface as [`SimError::InvalidParameter`] before any
//! trial runs. A trial that produces non-finite numbers surfaces as
//! [`SimError::NumericalAnomaly`] and is isolated to its own sweep point.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("numerical anomaly: {0}")]
    NumericalAnomaly(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config format error: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn anomaly(msg: impl Into<String>) -> Self {
        SimError::NumericalAnomaly(msg.into())
    }

    /// True for errors raised while validating configuration.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, SimError::InvalidParameter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_the_field() {
        let err = SimError::invalid("coherence_width", "must be positive, got -1");
        let msg = err.to_string();
        assert!(msg.contains("coherence_width"), "message was {}", msg);
        assert!(msg.contains("must be positive"));
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn anomaly_is_not_a_parameter_error() {
        let err = SimError::anomaly("waveform sample 3 is NaN");
        assert!(!err.is_invalid_parameter());
        assert_eq!(err.to_string(), "numerical anomaly: waveform sample 3 is NaN");
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: SimError = parse.unwrap_err().into();
        assert!(matches!(err, SimError::ConfigFormat(_)));
    }
}

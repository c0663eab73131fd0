//! Error types for Aria Metrics

use thiserror::Error;

/// Errors that can occur while building a session or computing metrics
///
/// Missing optional signals (heart rate, position) are not errors; they are
/// reported through [`crate::types::MetricValue::Unavailable`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse recording: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Stable machine-readable code, used in batch failure entries and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            AnalysisError::InvalidSession(_) => "INVALID_SESSION",
            AnalysisError::InvalidConfig(_) => "INVALID_CONFIG",
            AnalysisError::ParseError(_) => "PARSE_ERROR",
            AnalysisError::JsonError(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_per_variant() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cases = [
            (AnalysisError::InsufficientData { required: 2, actual: 0 }, "INSUFFICIENT_DATA"),
            (AnalysisError::InvalidSession("x".into()), "INVALID_SESSION"),
            (AnalysisError::InvalidConfig("x".into()), "INVALID_CONFIG"),
            (AnalysisError::ParseError("x".into()), "PARSE_ERROR"),
            (AnalysisError::from(json_error), "JSON_ERROR"),
        ];
        for (error, code) in cases {
            assert_eq!(error.code(), code);
        }
    }
}

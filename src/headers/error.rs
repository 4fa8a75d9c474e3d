//! Validation error taxonomy.
//!
//! Validation failures are data, not `Err` values: callers get a
//! [`ValidationOutcome`] per header and decide the response code themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest raw value echoed back inside a [`ValidationError`].
const MAX_ECHOED_VALUE: usize = 128;

/// Closed set of validation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingHeader,
    UnknownHeader,
    InvalidFormat,
    OutOfRange,
    ReservedBitsSet,
    ChecksumMismatch,
    InvalidToken,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::MissingHeader,
        ErrorCode::UnknownHeader,
        ErrorCode::InvalidFormat,
        ErrorCode::OutOfRange,
        ErrorCode::ReservedBitsSet,
        ErrorCode::ChecksumMismatch,
        ErrorCode::InvalidToken,
    ];

    /// Wire name of the code, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingHeader => "MISSING_HEADER",
            ErrorCode::UnknownHeader => "UNKNOWN_HEADER",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::ReservedBitsSet => "RESERVED_BITS_SET",
            ErrorCode::ChecksumMismatch => "CHECKSUM_MISMATCH",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
        }
    }

    /// True when the failure concerns client credentials rather than
    /// request shape (maps to 401 instead of 400 at the HTTP layer).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ErrorCode::InvalidToken)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single header validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{header} [{code}]: {message}")]
pub struct ValidationError {
    pub code: ErrorCode,
    pub header: String,
    pub value: String,
    pub message: String,
}

impl ValidationError {
    /// Build an error, truncating the echoed value.
    pub fn new(
        code: ErrorCode,
        header: impl Into<String>,
        value: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            header: header.into(),
            value: truncate(value),
            message: message.into(),
        }
    }

    /// Error for a required header that was not sent.
    pub fn missing(header: &str) -> Self {
        Self::new(
            ErrorCode::MissingHeader,
            header,
            "",
            format!("required header {} is missing", header),
        )
    }

    /// Error for a header name the header table does not know.
    pub fn unknown(header: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::UnknownHeader,
            header,
            value,
            format!("header {} is not recognized", header),
        )
    }

    /// Replace the echoed value, e.g. to keep credentials out of responses.
    pub fn redacted(mut self) -> Self {
        self.value = "<redacted>".to_string();
        self
    }
}

fn truncate(value: &str) -> String {
    match value.char_indices().nth(MAX_ECHOED_VALUE) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// Result of validating one header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn failed(error: ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    /// Error code of a failed outcome.
    pub fn code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

impl From<Result<(), ValidationError>> for ValidationOutcome {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = "a".repeat(500);
        let err = ValidationError::new(ErrorCode::InvalidFormat, "Config-Dump", &long, "bad");
        assert_eq!(err.value.len(), MAX_ECHOED_VALUE + 3);
        assert!(err.value.ends_with("..."));
    }

    #[test]
    fn test_outcome_invariant() {
        let ok = ValidationOutcome::ok();
        assert!(ok.valid && ok.error.is_none());

        let failed = ValidationOutcome::from(Err(ValidationError::missing("Config-Version")));
        assert!(!failed.valid);
        assert_eq!(failed.code(), Some(ErrorCode::MissingHeader));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::missing("Proxy-Token");
        assert_eq!(
            err.to_string(),
            "Proxy-Token [MISSING_HEADER]: required header Proxy-Token is missing"
        );
        let as_error: &dyn std::error::Error = &err;
        assert!(as_error.source().is_none());
    }
}

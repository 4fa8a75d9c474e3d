//! Single-header validation.

use std::sync::Arc;
use std::time::Instant;

use crate::headers::error::{ValidationError, ValidationOutcome};
use crate::headers::spec::HeaderSpecTable;
use crate::observability::metrics::{self, MetricsCollector};

/// Applies the header table to individual header values.
///
/// Pure apart from the timing sample pushed into the shared collector.
#[derive(Debug, Clone)]
pub struct HeaderValidator {
    table: &'static HeaderSpecTable,
    metrics: Arc<MetricsCollector>,
}

impl HeaderValidator {
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self::with_table(HeaderSpecTable::current(), metrics)
    }

    pub fn with_table(table: &'static HeaderSpecTable, metrics: Arc<MetricsCollector>) -> Self {
        Self { table, metrics }
    }

    pub fn table(&self) -> &'static HeaderSpecTable {
        self.table
    }

    /// Decode and validate `raw` as header `name`.
    pub fn validate_header(&self, name: &str, raw: &str) -> ValidationOutcome {
        let start = Instant::now();
        let result = self.check(name, raw);
        let elapsed = start.elapsed().as_nanos() as u64;

        self.metrics.record(elapsed, result.is_err());
        if let Err(e) = &result {
            metrics::record_validation_error(e.code);
            tracing::debug!(header = %e.header, code = %e.code, "Header rejected");
        }

        result.into()
    }

    fn check(&self, name: &str, raw: &str) -> Result<(), ValidationError> {
        let Some(spec) = self.table.lookup(name) else {
            return Err(ValidationError::unknown(name, raw));
        };

        let value = raw.trim_matches(|c: char| c.is_ascii_whitespace());
        spec.format
            .decode(spec.name, value)
            .and_then(|decoded| spec.format.validate(spec.name, value, &decoded))
            .map_err(|e| if spec.sensitive { e.redacted() } else { e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::error::ErrorCode;
    use crate::headers::spec::{CONFIG_VERSION, FEATURE_FLAGS, PROXY_TOKEN};

    fn validator() -> (HeaderValidator, Arc<MetricsCollector>) {
        let metrics = Arc::new(MetricsCollector::new());
        (HeaderValidator::new(metrics.clone()), metrics)
    }

    #[test]
    fn test_known_headers() {
        let (v, _) = validator();
        assert!(v.validate_header(CONFIG_VERSION, "1").valid);
        assert!(v.validate_header("config-version", " 1 ").valid);
        assert_eq!(
            v.validate_header(FEATURE_FLAGS, "0x00000800").code(),
            Some(ErrorCode::ReservedBitsSet)
        );
        assert_eq!(
            v.validate_header(CONFIG_VERSION, "256").code(),
            Some(ErrorCode::OutOfRange)
        );
    }

    #[test]
    fn test_unknown_header() {
        let (v, _) = validator();
        let outcome = v.validate_header("X-Custom", "anything");
        assert!(!outcome.valid);
        let err = outcome.error.unwrap();
        assert_eq!(err.code, ErrorCode::UnknownHeader);
        assert_eq!(err.header, "X-Custom");
    }

    #[test]
    fn test_errors_use_canonical_name() {
        let (v, _) = validator();
        let err = v.validate_header("feature-flags", "bogus").error.unwrap();
        assert_eq!(err.header, FEATURE_FLAGS);
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_token_value_never_echoed() {
        let (v, _) = validator();
        let err = v.validate_header(PROXY_TOKEN, "secret-but-broken").error.unwrap();
        assert_eq!(err.code, ErrorCode::InvalidToken);
        assert!(!err.value.contains("secret"));
    }

    #[test]
    fn test_every_call_is_recorded() {
        let (v, metrics) = validator();
        v.validate_header(CONFIG_VERSION, "1");
        v.validate_header(CONFIG_VERSION, "2");
        v.validate_header("Nope", "x");

        let stats = metrics.stats();
        assert_eq!(stats.total_validations, 3);
        assert_eq!(stats.total_errors, 2);
    }
}

//! Whole-header-set validation.
//!
//! Every header is checked and every failure is reported, so a client can fix
//! all of its headers after a single rejected request.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::headers::error::{ErrorCode, ValidationError, ValidationOutcome};
use crate::headers::validator::HeaderValidator;

/// Outcome of validating a full header set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Keyed by canonical header name (or the required name as given).
    pub per_header: BTreeMap<String, ValidationOutcome>,
}

impl AggregateResult {
    /// True when any error is a credential failure.
    pub fn has_auth_failure(&self) -> bool {
        self.errors.iter().any(|e| e.code.is_auth_failure())
    }

    /// Errors carrying `code`.
    pub fn errors_with(&self, code: ErrorCode) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.code == code)
    }
}

/// Validates header sets against a required-header list.
#[derive(Debug, Clone)]
pub struct AggregateValidator {
    validator: HeaderValidator,
}

impl AggregateValidator {
    pub fn new(validator: HeaderValidator) -> Self {
        Self { validator }
    }

    pub fn header_validator(&self) -> &HeaderValidator {
        &self.validator
    }

    /// Validate `headers` (name/value pairs, in arrival order).
    ///
    /// Missing required headers are reported first, once each and under their
    /// canonical name, then failures of present headers in input order. Present headers unknown to the header table are
    /// ignored unless they are listed in `required`.
    pub fn validate_all<'a, I, R>(&self, headers: I, required: &[R]) -> AggregateResult
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        R: AsRef<str>,
    {
        let headers: Vec<(&str, &str)> = headers.into_iter().collect();
        let present: HashSet<String> = headers
            .iter()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect();

        let table = self.validator.table();
        let mut errors = Vec::new();
        let mut per_header = BTreeMap::new();
        let mut checked = HashSet::new();

        for name in required {
            let name = name.as_ref();
            let lowered = name.to_ascii_lowercase();
            // One report per header, however often or in whatever case it is listed.
            if !checked.insert(lowered.clone()) || present.contains(&lowered) {
                continue;
            }
            let key = table.lookup(name).map_or(name, |spec| spec.name);
            let error = ValidationError::missing(key);
            errors.push(error.clone());
            per_header.insert(key.to_string(), ValidationOutcome::failed(error));
        }

        for (name, value) in headers {
            let key = match table.lookup(name) {
                Some(spec) => spec.name.to_string(),
                None if required.iter().any(|r| r.as_ref().eq_ignore_ascii_case(name)) => {
                    name.to_string()
                }
                None => continue,
            };

            let outcome = self.validator.validate_header(name, value);
            if let Some(error) = &outcome.error {
                errors.push(error.clone());
            }
            // A repeated header must not mask an earlier failure.
            match per_header.get(&key) {
                Some(existing) if !existing.valid => {}
                _ => {
                    per_header.insert(key, outcome);
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(error_count = errors.len(), "Header set rejected");
        }

        AggregateResult {
            valid: errors.is_empty(),
            errors,
            per_header,
        }
    }
}

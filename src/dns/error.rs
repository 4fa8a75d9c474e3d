//! DNS resolution errors.

use thiserror::Error;

/// Errors from cache warmup, lookups and URL rewriting.
///
/// None of these are ever cached: the next attempt performs a fresh lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// The resolver returned an error for the host.
    #[error("lookup for {host} failed: {reason}")]
    LookupFailed { host: String, reason: String },

    /// The resolver answered with no usable address.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// The lookup did not finish in time.
    #[error("lookup for {host} timed out after {timeout_ms} ms")]
    Timeout { host: String, timeout_ms: u64 },

    /// The proxy target is not a valid URL.
    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The proxy target has no host to resolve.
    #[error("proxy URL '{0}' has no host")]
    MissingHost(String),

    /// The warmup seed is not a `0x`-prefixed 32-bit hex value.
    #[error("invalid warmup seed '{0}'")]
    InvalidSeed(String),

    /// No warmup hostname sets are configured.
    #[error("no warmup sets configured")]
    NoWarmupSets,
}

impl DnsError {
    /// True for failures of the lookup itself, as opposed to bad input.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            DnsError::LookupFailed { .. } | DnsError::NoAddress(_) | DnsError::Timeout { .. }
        )
    }
}

/// Result type for DNS operations.
pub type DnsResult<T> = Result<T, DnsError>;

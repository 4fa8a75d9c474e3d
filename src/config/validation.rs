//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check required headers exist in the header table
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GuardConfig;
use crate::dns::cache::MAX_TTL;
use crate::headers::spec::HeaderSpecTable;

/// Longest accepted DNS cache TTL, in seconds.
pub const MAX_DNS_TTL_SECS: u64 = MAX_TTL.as_secs();

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "listener.bind_address '{}' is not a socket address",
            config.listener.bind_address
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(format!(
            "observability.metrics_address '{}' is not a socket address",
            config.observability.metrics_address
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push("timeouts.request_secs must be greater than 0".to_string());
    }

    let dns = &config.dns;
    if dns.ttl_secs == 0 {
        errors.push("dns.ttl_secs must be greater than 0".to_string());
    } else if dns.ttl_secs > MAX_DNS_TTL_SECS {
        errors.push(format!(
            "dns.ttl_secs must be at most {} (got {})",
            MAX_DNS_TTL_SECS, dns.ttl_secs
        ));
    }
    if dns.sweep_threshold == 0 {
        errors.push("dns.sweep_threshold must be greater than 0".to_string());
    }
    if dns.lookup_timeout_ms == 0 {
        errors.push("dns.lookup_timeout_ms must be greater than 0".to_string());
    }
    for (i, set) in dns.warmup_sets.iter().enumerate() {
        if set.is_empty() {
            errors.push(format!("dns.warmup_sets[{}] is empty", i));
        }
        if set.iter().any(|h| h.trim().is_empty()) {
            errors.push(format!("dns.warmup_sets[{}] contains an empty hostname", i));
        }
    }
    if dns.warmup_seed.is_some() && dns.warmup_sets.is_empty() {
        errors.push("dns.warmup_seed is set but dns.warmup_sets is empty".to_string());
    }

    let table = HeaderSpecTable::current();
    let mut seen = HashSet::new();
    for name in &config.headers.required {
        if !table.is_recognized(name) {
            errors.push(format!("headers.required contains unknown header '{}'", name));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(format!("headers.required lists '{}' more than once", name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

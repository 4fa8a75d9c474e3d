//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the guard and warm its DNS cache
//!
//! # Design Decisions
//! - Fail fast on configuration errors
//! - A failed warmup is logged, never fatal

use std::path::Path;
use std::sync::Arc;

use crate::config::{loader, ConfigError, GuardConfig};
use crate::guard::ProxyGuard;

/// Load `path` when given, otherwise validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GuardConfig, ConfigError> {
    match path {
        Some(path) => loader::load_config(path),
        None => loader::parse_config(""),
    }
}

/// Warm the guard's cache from the configured seed, if any.
pub async fn warm_cache(guard: &Arc<ProxyGuard>) {
    let Some(seed) = guard.config().dns.warmup_seed.clone() else {
        tracing::debug!("No warmup seed configured, skipping DNS warmup");
        return;
    };

    match guard.warmup(&seed).await {
        Ok(report) => tracing::info!(
            set_index = report.set_index,
            resolved = report.resolved.len(),
            failed = report.failed.len(),
            "DNS warmup finished"
        ),
        Err(e) => tracing::warn!(seed = %seed, error = %e, "DNS warmup skipped"),
    }
}

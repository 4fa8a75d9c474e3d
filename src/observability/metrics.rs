//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count header validations, failures and cumulative latency
//! - Count DNS resolutions (live lookups), failures and latency
//! - Mirror every sample into the `metrics` facade for Prometheus scraping
//!
//! # Metrics
//! - `guard_header_validations_total` (counter)
//! - `guard_header_validation_errors_total` (counter, label `code`)
//! - `guard_header_validation_duration_seconds` (histogram)
//! - `guard_dns_lookups_total` (counter, label `result`: hit, miss, failure)
//! - `guard_dns_lookup_duration_seconds` (histogram)
//! - `guard_dns_cache_size` (gauge)
//!
//! # Design Decisions
//! - Snapshot counters are plain atomics with relaxed ordering; a snapshot
//!   taken during concurrent writes may mix counts from different instants
//! - No locks on the record path

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::headers::error::ErrorCode;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record one header validation error by code.
pub fn record_validation_error(code: ErrorCode) {
    counter!("guard_header_validation_errors_total", "code" => code.as_str()).increment(1);
}

/// Record a DNS cache lookup result ("hit", "miss" or "failure").
pub fn record_dns_lookup(result: &'static str) {
    counter!("guard_dns_lookups_total", "result" => result).increment(1);
}

/// Record the current DNS cache size.
pub fn record_dns_cache_size(size: usize) {
    gauge!("guard_dns_cache_size").set(size as f64);
}

/// Point-in-time view of validation counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationMetricsSnapshot {
    pub total_validations: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    pub avg_time_ns: u64,
}

/// Point-in-time view of live DNS lookup counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionMetricsSnapshot {
    pub total_resolutions: u64,
    pub total_failures: u64,
    pub failure_rate: f64,
    pub avg_time_ns: u64,
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicU64,
    failures: AtomicU64,
    total_ns: AtomicU64,
}

impl Counters {
    fn record(&self, duration_ns: u64, failed: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.total_ns.fetch_add(duration_ns, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns (calls, failures, failure rate, average ns).
    fn read(&self) -> (u64, u64, f64, u64) {
        let calls = self.calls.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let total_ns = self.total_ns.load(Ordering::Relaxed);
        if calls == 0 {
            return (0, failures, 0.0, 0);
        }
        (calls, failures, failures as f64 / calls as f64, total_ns / calls)
    }

    fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_ns.store(0, Ordering::Relaxed);
    }
}

/// Shared collector for validation and resolution statistics.
///
/// Construct one per [`ProxyGuard`](crate::guard::ProxyGuard) and share it
/// through `Arc`; tests get isolated counters by building their own.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    validation: Counters,
    resolution: Counters,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one header validation.
    pub fn record(&self, duration_ns: u64, failed: bool) {
        self.validation.record(duration_ns, failed);
        counter!("guard_header_validations_total").increment(1);
        histogram!("guard_header_validation_duration_seconds").record(duration_ns as f64 / 1e9);
    }

    /// Record one live DNS lookup (cache misses and warmup lookups).
    pub fn record_resolution(&self, duration_ns: u64, failed: bool) {
        self.resolution.record(duration_ns, failed);
        histogram!("guard_dns_lookup_duration_seconds").record(duration_ns as f64 / 1e9);
    }

    pub fn stats(&self) -> ValidationMetricsSnapshot {
        let (total_validations, total_errors, error_rate, avg_time_ns) = self.validation.read();
        ValidationMetricsSnapshot {
            total_validations,
            total_errors,
            error_rate,
            avg_time_ns,
        }
    }

    pub fn resolution_stats(&self) -> ResolutionMetricsSnapshot {
        let (total_resolutions, total_failures, failure_rate, avg_time_ns) = self.resolution.read();
        ResolutionMetricsSnapshot {
            total_resolutions,
            total_failures,
            failure_rate,
            avg_time_ns,
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.validation.reset();
        self.resolution.reset();
    }
}

//! The guard: one owned instance of every core component.
//!
//! # Lifecycle
//! ```text
//! ProxyGuard::new(config)      → table, validators, metrics, empty cache
//!     → warmup(seed).await     → selected hostname set cached
//!     → validate_* / resolve_* → request handling (shared via Arc)
//!     → shutdown()             → final stats logged, cache dropped
//! ```
//! There is no process-wide state; every instance is isolated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::GuardConfig;
use crate::dns::{DnsResult, DnsStats, ProxyUrlResolver, Resolve, SystemResolver, WarmupReport};
use crate::headers::{AggregateResult, AggregateValidator, HeaderValidator, ValidationOutcome};
use crate::observability::metrics::{
    MetricsCollector, ResolutionMetricsSnapshot, ValidationMetricsSnapshot,
};

pub struct ProxyGuard {
    config: GuardConfig,
    metrics: Arc<MetricsCollector>,
    validator: AggregateValidator,
    resolver: ProxyUrlResolver,
    shut_down: AtomicBool,
}

impl ProxyGuard {
    /// Create a guard that resolves through the system resolver.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    /// Create a guard with a custom live resolver.
    pub fn with_resolver(config: GuardConfig, resolver: Arc<dyn Resolve>) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let validator = AggregateValidator::new(HeaderValidator::new(metrics.clone()));
        let resolver = ProxyUrlResolver::from_config(&config.dns, resolver, metrics.clone());

        tracing::info!(
            required_headers = ?config.headers.required,
            dns_ttl_secs = config.dns.ttl_secs,
            lookup_timeout_ms = config.dns.lookup_timeout_ms,
            "Proxy guard initialized"
        );

        Self {
            config,
            metrics,
            validator,
            resolver,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Validate one header value.
    pub fn validate_header(&self, name: &str, value: &str) -> ValidationOutcome {
        self.validator.header_validator().validate_header(name, value)
    }

    /// Validate a header set against an explicit required list.
    pub fn validate_all<'a, I, R>(&self, headers: I, required: &[R]) -> AggregateResult
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        R: AsRef<str>,
    {
        self.validator.validate_all(headers, required)
    }

    /// Validate a header set against the configured required list.
    pub fn validate_request<'a, I>(&self, headers: I) -> AggregateResult
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.validator.validate_all(headers, self.config.headers.required.as_slice())
    }

    pub fn validation_stats(&self) -> ValidationMetricsSnapshot {
        self.metrics.stats()
    }

    pub fn resolution_stats(&self) -> ResolutionMetricsSnapshot {
        self.metrics.resolution_stats()
    }

    /// Pre-resolve the hostname set selected by `seed` (a registry hash).
    pub async fn warmup(&self, seed: &str) -> DnsResult<WarmupReport> {
        self.resolver.warmup(seed, &self.config.dns.warmup_sets).await
    }

    /// Rewrite a proxy URL's host into its resolved address.
    pub async fn resolve_proxy_url(&self, url: &str) -> DnsResult<String> {
        self.resolver.resolve_proxy_url(url).await
    }

    pub fn dns_stats(&self) -> DnsStats {
        self.resolver.cache().stats()
    }

    /// Log final statistics and drop cached resolutions. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let validation = self.validation_stats();
        let dns = self.dns_stats();
        tracing::info!(
            total_validations = validation.total_validations,
            error_rate = validation.error_rate,
            avg_time_ns = validation.avg_time_ns,
            dns_hits = dns.hits,
            dns_misses = dns.misses,
            dns_cache_size = dns.size,
            "Proxy guard shutting down"
        );
        self.resolver.cache().clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ProxyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyGuard")
            .field("resolver", &self.resolver)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

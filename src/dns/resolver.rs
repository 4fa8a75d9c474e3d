//! Proxy target resolution through the DNS cache.
//!
//! # Responsibilities
//! - Serve hostnames from the cache while their entry is fresh
//! - Fall back to a live lookup (with timeout) on miss and cache the answer
//! - Rewrite proxy URLs so the host segment is the resolved address
//! - Pre-resolve a warmup set at startup
//!
//! # Design Decisions
//! - Failed lookups are never cached; the next request retries
//! - Concurrent misses for the same host each look up; last insert wins
//! - The live resolver is a trait object so tests can inject answers

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use url::{Host, Url};

use crate::config::DnsConfig;
use crate::dns::cache::DnsCache;
use crate::dns::error::{DnsError, DnsResult};
use crate::dns::warmup::{select_warmup_set, WarmupReport};
use crate::observability::metrics::{self, MetricsCollector};

/// A live name resolver.
#[async_trait]
pub trait Resolve: Send + Sync + 'static {
    /// Resolve `host` to every address it has.
    async fn lookup(&self, host: &str) -> DnsResult<Vec<IpAddr>>;
}

/// Resolver backed by the operating system via `tokio::net::lookup_host`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup(&self, host: &str) -> DnsResult<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| DnsError::LookupFailed {
                host: host.to_string(),
                reason: e.to_string(),
            })?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Resolves proxy targets through a shared [`DnsCache`].
#[derive(Clone)]
pub struct ProxyUrlResolver {
    cache: Arc<DnsCache>,
    resolver: Arc<dyn Resolve>,
    metrics: Arc<MetricsCollector>,
    lookup_timeout: Duration,
    prefer_ipv4: bool,
}

impl ProxyUrlResolver {
    pub fn new(
        cache: Arc<DnsCache>,
        resolver: Arc<dyn Resolve>,
        metrics: Arc<MetricsCollector>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            resolver,
            metrics,
            lookup_timeout,
            prefer_ipv4: true,
        }
    }

    /// Build from configuration with a fresh cache.
    pub fn from_config(
        config: &DnsConfig,
        resolver: Arc<dyn Resolve>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let cache = Arc::new(DnsCache::with_sweep_threshold(
            Duration::from_secs(config.ttl_secs),
            config.sweep_threshold,
        ));
        Self::new(
            cache,
            resolver,
            metrics,
            Duration::from_millis(config.lookup_timeout_ms),
        )
        .with_prefer_ipv4(config.prefer_ipv4)
    }

    pub fn with_prefer_ipv4(mut self, prefer_ipv4: bool) -> Self {
        self.prefer_ipv4 = prefer_ipv4;
        self
    }

    pub fn cache(&self) -> &Arc<DnsCache> {
        &self.cache
    }

    /// Resolve a hostname, serving fresh cache entries first.
    pub async fn resolve(&self, host: &str) -> DnsResult<IpAddr> {
        if let Some(entry) = self.cache.lookup(host) {
            return Ok(entry.address);
        }

        let address = self.live_lookup(host).await?;
        self.cache.insert(host, address);
        tracing::debug!(host = %host, address = %address, "DNS cache refreshed");
        Ok(address)
    }

    /// Replace the host of `raw_url` with its resolved address.
    ///
    /// Scheme, credentials, port, path, query and fragment are preserved.
    /// IP-literal hosts are returned unchanged without a lookup.
    pub async fn resolve_proxy_url(&self, raw_url: &str) -> DnsResult<String> {
        let mut url = Url::parse(raw_url).map_err(|e| DnsError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => return Ok(url.into()),
            _ => return Err(DnsError::MissingHost(raw_url.to_string())),
        };

        let address = self.resolve(&host).await?;
        url.set_ip_host(address).map_err(|()| DnsError::InvalidUrl {
            url: raw_url.to_string(),
            reason: "host cannot be replaced".to_string(),
        })?;
        Ok(url.into())
    }

    /// Pre-resolve the hostname set selected by `seed`.
    ///
    /// Lookups run concurrently. Failures are logged and left uncached; they
    /// do not fail the warmup. Hit/miss counters are not touched.
    pub async fn warmup(&self, seed: &str, sets: &[Vec<String>]) -> DnsResult<WarmupReport> {
        let (set_index, hosts) = select_warmup_set(seed, sets)?;
        tracing::info!(set_index, hosts = hosts.len(), "Warming DNS cache");

        let mut tasks = JoinSet::new();
        for host in hosts {
            let this = self.clone();
            let host = host.clone();
            tasks.spawn(async move {
                let result = this.live_lookup(&host).await;
                (host, result)
            });
        }

        let mut report = WarmupReport {
            set_index,
            ..WarmupReport::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, Ok(address))) => {
                    self.cache.insert(&host, address);
                    report.resolved.push(host);
                }
                Ok((host, Err(_))) => report.failed.push(host),
                Err(e) => tracing::error!(error = %e, "Warmup lookup task failed"),
            }
        }
        report.resolved.sort();
        report.failed.sort();

        tracing::info!(
            set_index,
            resolved = report.resolved.len(),
            failed = report.failed.len(),
            "DNS cache warmup finished"
        );
        Ok(report)
    }

    async fn live_lookup(&self, host: &str) -> DnsResult<IpAddr> {
        let start = Instant::now();
        let result = match timeout(self.lookup_timeout, self.resolver.lookup(host)).await {
            Ok(Ok(addrs)) => {
                pick_address(&addrs, self.prefer_ipv4).ok_or_else(|| DnsError::NoAddress(host.to_string()))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DnsError::Timeout {
                host: host.to_string(),
                timeout_ms: self.lookup_timeout.as_millis() as u64,
            }),
        };

        self.metrics
            .record_resolution(start.elapsed().as_nanos() as u64, result.is_err());
        if let Err(e) = &result {
            metrics::record_dns_lookup("failure");
            tracing::warn!(host = %host, error = %e, "DNS lookup failed");
        }
        result
    }
}

impl std::fmt::Debug for ProxyUrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyUrlResolver")
            .field("cache_size", &self.cache.len())
            .field("ttl", &self.cache.ttl())
            .field("lookup_timeout", &self.lookup_timeout)
            .field("prefer_ipv4", &self.prefer_ipv4)
            .finish()
    }
}

fn pick_address(addrs: &[IpAddr], prefer_ipv4: bool) -> Option<IpAddr> {
    if prefer_ipv4 {
        if let Some(v4) = addrs.iter().find(|a| a.is_ipv4()) {
            return Some(*v4);
        }
    }
    addrs.first().copied()
}

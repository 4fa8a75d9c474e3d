//! TTL-bounded hostname → address cache.
//!
//! # Entry lifecycle
//! ```text
//! absent → resolving → cached → expired → absent
//! ```
//! Entries are immutable and replaced whole. An expired entry is dropped the
//! next time it is looked up, which then counts as a miss. Hosts that are
//! never looked up again are dropped by a sweep that runs on insert once the
//! cache grows past its sweep threshold.
//!
//! There is intentionally no way to evict a live entry from outside: the TTL
//! alone bounds how long a bad answer can be served.

use dashmap::DashMap;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// A cached resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsCacheEntry {
    pub hostname: String,
    pub address: IpAddr,
    pub resolved_at: Instant,
    pub expires_at: Instant,
}

impl DnsCacheEntry {
    /// True while `now` has not passed the expiry instant.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Cache counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DnsStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Longest TTL a cache accepts; longer values are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(86_400);

/// Entry count at which an insert first sweeps expired entries.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Concurrent DNS cache with hit/miss accounting.
#[derive(Debug)]
pub struct DnsCache {
    entries: DashMap<String, Arc<DnsCacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    sweep_threshold: usize,
    /// Size that triggers the next sweep; doubles while live entries dominate.
    next_sweep: AtomicUsize,
}

/// Cache key for a hostname: lowercase, no trailing root dot.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_sweep_threshold(ttl, DEFAULT_SWEEP_THRESHOLD)
    }

    pub fn with_sweep_threshold(ttl: Duration, sweep_threshold: usize) -> Self {
        let sweep_threshold = sweep_threshold.max(1);
        Self {
            entries: DashMap::new(),
            ttl: ttl.min(MAX_TTL),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweep_threshold,
            next_sweep: AtomicUsize::new(sweep_threshold),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a fresh entry for `host`, counting a hit or a miss.
    pub fn lookup(&self, host: &str) -> Option<Arc<DnsCacheEntry>> {
        let key = normalize_host(host);
        let now = Instant::now();

        // Clone the Arc so the shard guard is released before any removal.
        let cached = self.entries.get(&key).map(|e| Arc::clone(e.value()));
        if let Some(entry) = cached {
            if entry.is_fresh_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_dns_lookup("hit");
                return Some(entry);
            }
            // Only drop the entry we saw; a concurrent refresh wins.
            self.entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry));
            tracing::debug!(host = %key, "DNS cache entry expired");
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_dns_lookup("miss");
        None
    }

    /// Read an entry without touching counters or expiring it.
    pub fn peek(&self, host: &str) -> Option<Arc<DnsCacheEntry>> {
        self.entries
            .get(&normalize_host(host))
            .map(|e| Arc::clone(e.value()))
    }

    /// Store a successful resolution, replacing any previous entry.
    pub(crate) fn insert(&self, host: &str, address: IpAddr) -> Arc<DnsCacheEntry> {
        let hostname = normalize_host(host);
        let resolved_at = Instant::now();
        self.sweep_expired(resolved_at);

        let entry = Arc::new(DnsCacheEntry {
            hostname: hostname.clone(),
            address,
            resolved_at,
            // An unrepresentable expiry leaves the entry already stale.
            expires_at: resolved_at.checked_add(self.ttl).unwrap_or(resolved_at),
        });
        self.entries.insert(hostname, Arc::clone(&entry));
        metrics::record_dns_cache_size(self.entries.len());
        entry
    }

    /// Drop every expired entry once the cache has reached the sweep size.
    fn sweep_expired(&self, now: Instant) {
        let before = self.entries.len();
        if before < self.next_sweep.load(Ordering::Relaxed) {
            return;
        }

        self.entries.retain(|_, entry| entry.is_fresh_at(now));
        let remaining = self.entries.len();
        self.next_sweep.store(
            remaining.saturating_mul(2).max(self.sweep_threshold),
            Ordering::Relaxed,
        );
        tracing::debug!(
            removed = before.saturating_sub(remaining),
            remaining,
            "Swept expired DNS cache entries"
        );
    }

    /// Drop every entry. Only used at end of life.
    pub(crate) fn clear(&self) {
        self.entries.clear();
        metrics::record_dns_cache_size(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> DnsStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        DnsStats {
            size: self.entries.len(),
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML and carry
//! defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::headers::spec::{CONFIG_VERSION, FEATURE_FLAGS, PROXY_TOKEN, REGISTRY_HASH};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener for the HTTP adapter.
    pub listener: ListenerConfig,

    /// Header validation policy.
    pub headers: HeaderPolicyConfig,

    /// DNS cache and resolver settings.
    pub dns: DnsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which headers every request must carry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderPolicyConfig {
    /// Required header names (case-insensitive).
    pub required: Vec<String>,
}

impl Default for HeaderPolicyConfig {
    fn default() -> Self {
        Self {
            required: [CONFIG_VERSION, REGISTRY_HASH, FEATURE_FLAGS, PROXY_TOKEN]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// DNS cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Lifetime of a cached resolution in seconds. This is the upper bound
    /// on how long a bad answer can be served.
    pub ttl_secs: u64,

    /// Cache size at which inserts start sweeping expired entries.
    pub sweep_threshold: usize,

    /// Timeout for a single live lookup in milliseconds.
    pub lookup_timeout_ms: u64,

    /// Prefer IPv4 answers when a host has both families.
    pub prefer_ipv4: bool,

    /// Hostname sets for cache warmup; the registry hash selects one.
    pub warmup_sets: Vec<Vec<String>>,

    /// Registry hash (`0x…`) used to warm the cache at startup.
    pub warmup_seed: Option<String>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_threshold: 1024,
            lookup_timeout_ms: 2000,
            prefer_ipv4: true,
            warmup_sets: vec![
                vec![
                    "registry.npmjs.org".to_string(),
                    "registry.yarnpkg.com".to_string(),
                ],
                vec!["github.com".to_string(), "objects.githubusercontent.com".to_string()],
            ],
            warmup_seed: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for the HTTP adapter in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

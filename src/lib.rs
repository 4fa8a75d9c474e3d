//! Proxy guard library.
//!
//! Validates the control headers a package-manager proxy relies on and
//! resolves proxy target hosts through a TTL-bounded DNS cache.

pub mod config;
pub mod dns;
pub mod guard;
pub mod headers;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GuardConfig;
pub use dns::{DnsError, ProxyUrlResolver, Resolve};
pub use guard::ProxyGuard;
pub use headers::{AggregateResult, ErrorCode, ValidationError, ValidationOutcome};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

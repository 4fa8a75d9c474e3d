//! DNS resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     registry hash seed
//!     → warmup.rs (select hostname set)
//!     → resolver.rs (concurrent live lookups)
//!     → cache.rs (insert entries, expires_at = now + ttl)
//!
//! Per request (after header validation):
//!     proxy target URL
//!     → resolver.rs (parse, extract host)
//!     → cache.rs (fresh entry? hit : miss)
//!     → on miss: live lookup with timeout, insert, rewrite host
//! ```
//!
//! # Design Decisions
//! - The TTL is the only bound on the poisoning window; callers cannot evict
//! - Lookup failures propagate to the caller and are never cached
//! - Cache reads never block on an unrelated host's lookup

pub mod cache;
pub mod error;
pub mod resolver;
pub mod warmup;

pub use cache::{DnsCache, DnsCacheEntry, DnsStats};
pub use error::{DnsError, DnsResult};
pub use resolver::{ProxyUrlResolver, Resolve, SystemResolver};
pub use warmup::WarmupReport;

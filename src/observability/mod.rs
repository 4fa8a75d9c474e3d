//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Validators and resolvers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (in-process counters + Prometheus facade)
//!
//! Consumers:
//!     → stdout log stream
//!     → /guard/stats/* endpoints
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments)
//! - The Prometheus exporter is opt-in; in-process counters always run

pub mod logging;
pub mod metrics;

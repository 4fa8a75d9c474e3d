//! Control header validation subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming header set:
//!     → aggregate.rs (required-header check, fan-out, error collection)
//!     → validator.rs (table lookup, timing)
//!     → spec.rs (format-specific decode + validate)
//!         → checksum.rs (Config-Dump trailing byte)
//!     → AggregateResult (all errors, per-header outcomes)
//! ```
//!
//! # Design Decisions
//! - Failures are returned as data, never as `Err` or panics
//! - Dispatch is table-driven over `HeaderFormat`
//! - Validation is synchronous and never awaits

pub mod aggregate;
pub mod checksum;
pub mod dump;
pub mod error;
pub mod spec;
pub mod validator;

pub use aggregate::{AggregateResult, AggregateValidator};
pub use dump::ConfigSnapshot;
pub use error::{ErrorCode, ValidationError, ValidationOutcome};
pub use spec::{DecodedValue, HeaderFormat, HeaderSpec, HeaderSpecTable};
pub use validator::HeaderValidator;

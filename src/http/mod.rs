//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → middleware.rs (header guard: 400/401 with the aggregate result)
//!     → handlers.rs (stats, proxy URL resolution)
//!     → JSON response
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use middleware::{header_guard_middleware, validate_header_map, ValidatedHeaders};
pub use server::{AppState, HttpServer};

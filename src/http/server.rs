//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the guard endpoints
//! - Put the header guard in front of guarded routes
//! - Wire up timeout and tracing layers
//! - Serve until the shutdown signal fires

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::guard::ProxyGuard;
use crate::http::handlers;
use crate::http::middleware::header_guard_middleware;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub guard: Arc<ProxyGuard>,
}

/// HTTP front end for a [`ProxyGuard`].
pub struct HttpServer {
    router: Router,
    guard: Arc<ProxyGuard>,
}

impl HttpServer {
    pub fn new(guard: Arc<ProxyGuard>) -> Self {
        let state = AppState {
            guard: guard.clone(),
        };
        let router = Self::build_router(&guard, state);
        Self { router, guard }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `route_layer` only wraps routes registered before it, so the stats
    /// endpoints stay reachable without control headers.
    #[allow(deprecated)]
    fn build_router(guard: &ProxyGuard, state: AppState) -> Router {
        let request_timeout = Duration::from_secs(guard.config().timeouts.request_secs);

        Router::new()
            .route("/guard/resolve", get(handlers::resolve_proxy_url))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                header_guard_middleware,
            ))
            .route("/guard/stats/validation", get(handlers::validation_stats))
            .route("/guard/stats/dns", get(handlers::dns_stats))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn guard(&self) -> &Arc<ProxyGuard> {
        &self.guard
    }

    /// Serve on `listener` until `shutdown` fires or its sender is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

//! HTTP product recommendation service.
//!
//! Exposes `GET /health`, `POST /recommend` and `POST /api/classify-intent`
//! over any [`ProductSearch`] and [`IntentSearch`] backend and [`Embedding`]
//! provider.
//!
//! [`ProductSearch`]: prodsearch_core::ProductSearch
//! [`IntentSearch`]: prodsearch_core::IntentSearch
//! [`Embedding`]: prodsearch_core::Embedding

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storefront;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, ServerConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
pub use storefront::StorefrontProduct;

pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.cors_allowed_origins.clone()))
        .allow_methods(Any)
        .allow_headers(Any);

    routes::create_router()
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::disable()),
        )
}

/// Serves `app` until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "prodsearch server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

//! HTTP API server for the URL shortener.
//!
//! Provides the shortening, redirect, listing and batch deletion endpoints,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use batch_delete::BatchDeleter;
use domain::LinkService;
use hmac::digest::InvalidLength;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use url_store::UrlStore;

use config::Config;
use routes::owner::OwnerSigner;
use routes::urls::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: UrlStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", post(routes::urls::shorten_text::<S>))
        .route("/api/shorten", post(routes::urls::shorten_json::<S>))
        .route("/api/shorten/batch", post(routes::urls::shorten_batch::<S>))
        .route(
            "/api/user/urls",
            get(routes::urls::list::<S>).delete(routes::urls::delete::<S>),
        )
        .route("/ping", get(routes::urls::ping::<S>))
        .route("/{code}", get(routes::urls::redirect::<S>))
        .layer(middleware::from_fn_with_state(
            state.signer.clone(),
            routes::owner::identify,
        ))
        .route("/health", get(routes::health::check))
        .with_state(state)
        .merge(metrics_router)
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
///
/// Fails only if the cookie secret is not a usable HMAC key.
pub fn create_default_state<S: UrlStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Result<Arc<AppState<S>>, InvalidLength> {
    Ok(Arc::new(AppState {
        links: LinkService::new(store.clone()),
        deleter: BatchDeleter::new(store, config.delete_config()),
        signer: OwnerSigner::new(config.cookie_secret.as_bytes())?,
        base_url: config.base_url.clone(),
    }))
}

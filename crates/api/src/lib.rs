//! HTTP API server for the marketplace checkout core.
//!
//! Provides the cart, checkout, and order-history endpoints with structured
//! logging (tracing) and Prometheus metrics. Authentication is a bearer
//! token resolved to a user id by [`auth::TokenVerifier`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CartService, CheckoutService, HistoryService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::TokenVerifier;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub cart: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub history: HistoryService<S>,
    pub tokens: TokenVerifier,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get_cart::<S>))
        .route("/cart", post(routes::cart::add::<S>))
        .route("/cart", delete(routes::cart::clear::<S>))
        .route("/cart/{id}", put(routes::cart::update::<S>))
        .route("/cart/{id}", delete(routes::cart::remove::<S>))
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route("/orders/history", get(routes::orders::history::<S>))
        .route("/orders/{id}", get(routes::orders::details::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store and token verifier.
pub fn create_default_state<S: MarketStore + Clone + 'static>(
    store: S,
    tokens: TokenVerifier,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        cart: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        history: HistoryService::new(store),
        tokens,
    })
}

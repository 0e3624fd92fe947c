//! HTTP route handlers.
//!
//! Handlers are thin: deserialize, delegate to rms-db, map errors via
//! [`ApiError`](crate::error::ApiError). No business logic here.

pub mod health;
pub mod pos;
pub mod products;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/pos/checkout", post(pos::checkout))
        .route("/api/pos/sales/:id/payment", post(pos::complete_payment))
        .route("/api/pos/sales/:id/customer", post(pos::set_customer))
        .route("/api/pos/products", post(products::create))
        .route("/api/pos/products/search", get(products::search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Product grid (list view; q / max_price / view filters)
//! GET  /health              - Health check
//!
//! # Products
//! GET  /products/{id}       - Product detail
//!
//! # Cart (HTMX fragments)
//! POST /cart/toggle         - Toggle cart membership (returns button fragment,
//!                             triggers cart-updated)
//! GET  /cart/count          - Cart count badge (fragment)
//! GET  /cart/events         - Cart change notifications (SSE)
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(cart::toggle))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Product grid (list view)
        .route("/", get(products::index))
        // Health check
        .route("/health", get(health))
        // Product detail
        .nest("/products", product_routes())
        // Cart fragments
        .nest("/cart", cart_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not probe the catalog; that
/// would issue requests outside the one-fetch-per-render contract.
async fn health() -> &'static str {
    "ok"
}

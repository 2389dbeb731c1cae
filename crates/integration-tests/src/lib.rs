//! Integration tests for Bodega.
//!
//! The tests in `tests/` drive the real storefront router against a stub
//! catalog API served on an ephemeral local port, so they run without
//! network access. One test is `#[ignore]`d because it talks to the public
//! catalog API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bodega-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use url::Url;

use bodega_core::{Product, ProductId, Rating};
use bodega_storefront::config::{CatalogConfig, StorefrontConfig};
use bodega_storefront::state::AppState;

/// A small fixed catalog used by the stub API.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::new(1),
            title: "Canvas Tote Widget".to_string(),
            description: "A compact everyday widget".to_string(),
            category: "bags".to_string(),
            price: rust_decimal::Decimal::from(10),
            image: "https://example.com/widget.jpg".to_string(),
            rating: Some(Rating {
                rate: 4.2,
                count: 57,
            }),
        },
        Product {
            id: ProductId::new(2),
            title: "Chrome Gadget".to_string(),
            description: "Deluxe gadget for professionals".to_string(),
            category: "electronics".to_string(),
            price: rust_decimal::Decimal::from(50),
            image: "https://example.com/gadget.jpg".to_string(),
            rating: None,
        },
        Product {
            id: ProductId::new(3),
            title: "Spare Doohickey".to_string(),
            description: "Replacement widget parts".to_string(),
            category: "bags".to_string(),
            price: "19.99".parse().expect("valid decimal literal"),
            image: "https://example.com/doohickey.jpg".to_string(),
            rating: Some(Rating {
                rate: 3.1,
                count: 4,
            }),
        },
    ]
}

/// Serve a stub catalog API on an ephemeral port and return its base URL.
///
/// Exposes the same two endpoints the real catalog does:
/// `GET /products` and `GET /products/{id}`.
pub async fn serve_catalog_stub(products: Vec<Product>) -> String {
    let products = Arc::new(products);
    let app = Router::new()
        .route("/products", get(stub_list_products))
        .route("/products/{id}", get(stub_get_product))
        .with_state(products);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub catalog listener");
    let addr = listener.local_addr().expect("Stub catalog has no address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Stub catalog server error");
    });

    format!("http://{addr}")
}

async fn stub_list_products(State(products): State<Arc<Vec<Product>>>) -> Json<Vec<Product>> {
    Json(products.as_ref().clone())
}

async fn stub_get_product(
    State(products): State<Arc<Vec<Product>>>,
    AxumPath(id): AxumPath<u64>,
) -> Response {
    products
        .iter()
        .find(|product| product.id.as_u64() == id)
        .map_or_else(
            || StatusCode::NOT_FOUND.into_response(),
            |product| Json(product.clone()).into_response(),
        )
}

/// Build an application state pointing at `catalog_base_url` with its cart
/// slot at `cart_path`.
#[must_use]
pub fn test_state(catalog_base_url: &str, cart_path: &Path) -> AppState {
    let config = StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid loopback address"),
        port: 0,
        catalog: CatalogConfig {
            base_url: Url::parse(catalog_base_url).expect("valid catalog base URL"),
        },
        cart_store_path: cart_path.to_path_buf(),
        sentry_dsn: None,
        sentry_environment: None,
    };

    AppState::new(config)
}

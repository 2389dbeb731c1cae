//! Integration tests for the product grid and detail pages.
//!
//! Each test serves a stub catalog on an ephemeral port and drives the real
//! storefront router against it.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use bodega_integration_tests::{sample_products, serve_catalog_stub, test_state};
use bodega_storefront::routes;

/// Build the storefront router against a freshly served stub catalog.
async fn storefront(cart_slot: &std::path::Path) -> Router {
    let base_url = serve_catalog_stub(sample_products()).await;
    routes::routes().with_state(test_state(&base_url, cart_slot))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_grid_lists_all_products() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Canvas Tote Widget"));
    assert!(body.contains("Chrome Gadget"));
    assert!(body.contains("Spare Doohickey"));
    assert!(!body.contains("No products found."));
}

#[tokio::test]
async fn test_grid_derives_distinct_categories() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (_, body) = get(app, "/").await;

    // "bags" appears twice in the catalog but only once as a filter button
    assert_eq!(body.matches(">bags</a>").count(), 1);
    assert_eq!(body.matches(">electronics</a>").count(), 1);
}

#[tokio::test]
async fn test_search_filters_grid() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/?q=gadget").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Chrome Gadget"));
    assert!(!body.contains("Canvas Tote Widget"));
}

#[tokio::test]
async fn test_price_bound_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (_, body) = get(app, "/?max_price=19.99").await;

    assert!(body.contains("Canvas Tote Widget"));
    assert!(body.contains("Spare Doohickey"));
    assert!(!body.contains("Chrome Gadget"));
}

#[tokio::test]
async fn test_empty_price_field_means_unbounded() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/?q=&max_price=&view=explore").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Chrome Gadget"));
}

#[tokio::test]
async fn test_cart_view_shows_only_members() {
    let dir = tempfile::tempdir().unwrap();
    let cart_slot = dir.path().join("cart.json");
    std::fs::write(&cart_slot, "[1,2]").unwrap();
    let app = storefront(&cart_slot).await;

    let (_, body) = get(app, "/?view=cart").await;

    assert!(body.contains("Canvas Tote Widget"));
    assert!(body.contains("Chrome Gadget"));
    assert!(!body.contains("Spare Doohickey"));
}

#[tokio::test]
async fn test_no_match_renders_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/?q=nonexistent-thing").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No products found."));
}

#[tokio::test]
async fn test_catalog_failure_renders_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on this port; the fetch fails and the grid degrades
    let state = test_state("http://127.0.0.1:9", &dir.path().join("cart.json"));
    let app = routes::routes().with_state(state);

    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No products found."));
}

#[tokio::test]
async fn test_detail_renders_product() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/products/1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Canvas Tote Widget"));
    assert!(body.contains("$10.00"));
    assert!(body.contains("4.2 out of 5 (57 reviews)"));
    assert!(body.contains("Add to Cart"));
}

#[tokio::test]
async fn test_detail_without_rating_renders() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/products/2").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Chrome Gadget"));
    assert!(!body.contains("out of 5"));
}

#[tokio::test]
async fn test_unknown_product_renders_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/products/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product not found"));
}

#[tokio::test]
async fn test_detail_fetch_failure_renders_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("cart.json"));
    let app = routes::routes().with_state(state);

    let (status, body) = get(app, "/products/1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product not found"));
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront(&dir.path().join("cart.json")).await;

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
#[ignore = "Requires network access to the public catalog API"]
async fn test_live_catalog_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state("https://fakestoreapi.com", &dir.path().join("cart.json"));

    let products = state
        .catalog()
        .fetch_all_products()
        .await
        .expect("Live catalog fetch failed");

    assert!(!products.is_empty());
}

//! Product route handlers: the browsable grid and the detail page.
//!
//! Both handlers fetch from the catalog exactly once per request and treat
//! fetch failure as a render-able state ("no products" / "product not
//! found") rather than an error response.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use bodega_core::{Product, Rating};

use crate::browse::{self, BrowseFilters, ViewMode};
use crate::catalog::CatalogError;
use crate::filters;
use crate::state::AppState;

/// Deserialize empty strings as None for the optional price bound.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Grid filter query parameters.
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub q: String,
    /// Inclusive upper price bound; an empty field means unbounded.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub view: String,
}

/// Product display data for templates: one grid card or the detail page.
#[derive(Clone)]
pub struct ProductView {
    pub id: u64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub rating: Option<Rating>,
    pub in_cart: bool,
}

impl ProductView {
    fn new(product: &Product, in_cart: bool) -> Self {
        Self {
            id: product.id.as_u64(),
            title: product.title.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            image: product.image.clone(),
            rating: product.rating.clone(),
            in_cart,
        }
    }
}

/// Format a decimal amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Product grid page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub cards: Vec<ProductView>,
    pub categories: Vec<String>,
    pub query: String,
    pub max_price: Option<Decimal>,
    pub view: ViewMode,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {}

/// Display the product grid (list view).
///
/// Fetches the full catalog once, derives the category list from the
/// unfiltered result, and filters with the current cart snapshot. A failed
/// fetch renders as the empty catalog.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> impl IntoResponse {
    let products = state
        .catalog()
        .fetch_all_products()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load products: {e}");
            Vec::new()
        });

    let categories = browse::distinct_categories(&products);
    let cart_ids = state.cart().ids();

    let filters = BrowseFilters {
        query: query.q.clone(),
        max_price: query.max_price,
        view: ViewMode::parse(&query.view),
    };
    let cards = browse::filter_products(&products, &filters, &cart_ids)
        .into_iter()
        .map(|product| ProductView::new(product, cart_ids.contains(&product.id)))
        .collect();

    ProductsIndexTemplate {
        cards,
        categories,
        query: query.q,
        max_price: query.max_price,
        view: filters.view,
    }
}

/// Display the product detail page.
///
/// A missing product and a failed fetch both render the not-found state;
/// they are logged at different levels so diagnostics can tell them apart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog().fetch_product_by_id(id.into()).await {
        Ok(product) => {
            let in_cart = state.cart().is_in_cart(product.id);
            ProductShowTemplate {
                product: ProductView::new(&product, in_cart),
            }
            .into_response()
        }
        Err(e) => {
            if matches!(e, CatalogError::NotFound(_)) {
                tracing::debug!("Product {id} not in catalog");
            } else {
                tracing::error!("Failed to load product {id}: {e}");
            }
            (StatusCode::NOT_FOUND, ProductNotFoundTemplate {}).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_two_decimals() {
        assert_eq!(format_price("10".parse().unwrap()), "$10.00");
        assert_eq!(format_price("109.95".parse().unwrap()), "$109.95");
        assert_eq!(format_price("19.9".parse().unwrap()), "$19.90");
    }

    #[test]
    fn test_browse_query_tolerates_empty_price() {
        let query: BrowseQuery =
            serde_json::from_str(r#"{"q": "widget", "max_price": "", "view": ""}"#).unwrap();
        assert_eq!(query.q, "widget");
        assert!(query.max_price.is_none());
    }

    #[test]
    fn test_browse_query_parses_price() {
        let query: BrowseQuery = serde_json::from_str(r#"{"max_price": "19.99"}"#).unwrap();
        assert_eq!(query.max_price, Some("19.99".parse().unwrap()));
        assert_eq!(query.q, "");
    }
}

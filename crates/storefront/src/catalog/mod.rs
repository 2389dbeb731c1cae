//! Remote product catalog API client.
//!
//! The catalog is an external, read-only collaborator exposing two JSON
//! endpoints: `GET /products` and `GET /products/{id}`. The client issues
//! exactly one request per call - no retries, no timeout tuning, and no
//! response caching. Every page render fetches fresh; freshness and
//! throughput requirements do not exist for this storefront.
//!
//! Callers never surface a failed fetch to the render path: the list view
//! degrades to an empty catalog and the detail view to a not-found page.

use std::sync::Arc;

use bodega_core::{Product, ProductId};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::CatalogConfig;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected product schema.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be constructed from the configured base.
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),

    /// Catalog returned a non-success status.
    #[error("Catalog returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Product does not exist in the catalog.
    #[error("Product {0} not found in catalog")]
    NotFound(ProductId),
}

/// Client for the remote product catalog API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
            }),
        }
    }

    /// Fetch the full product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot complete or the response cannot
    /// be parsed as a product list.
    #[instrument(skip(self))]
    pub async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint("products")?;
        let body = self.get_text(url).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog product list"
            );
            CatalogError::Parse(e)
        })
    }

    /// Fetch a single product by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the catalog has no such product,
    /// or another variant if the request or parse fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn fetch_product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        let url = self.endpoint(&format!("products/{id}"))?;

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::Status(status));
        }

        // The catalog answers unknown ids with an empty or null body
        // instead of a 404.
        if body.trim().is_empty() || body.trim() == "null" {
            return Err(CatalogError::NotFound(id));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog product"
            );
            CatalogError::Parse(e)
        })
    }

    /// Build an endpoint URL under the configured base.
    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        // Keep any path component of the base URL intact when joining.
        let mut base = self.inner.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path)?)
    }

    /// Issue a GET and hand back the body text, checking the status first.
    async fn get_text(&self, url: Url) -> Result<String, CatalogError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics.
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::Status(status));
        }

        Ok(body)
    }
}

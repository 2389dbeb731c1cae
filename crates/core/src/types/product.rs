//! Product model for the remote catalog API.
//!
//! These types mirror the catalog's JSON schema. They are owned by the
//! catalog client and read-only everywhere else: a `Product` is never
//! mutated after it has been fetched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A single catalog product.
///
/// `id` is unique within one fetched product list. A list fetch and a detail
/// fetch are independent requests, so agreement between them is by convention
/// of the catalog, not validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Category label (free text, as assigned by the catalog).
    #[serde(default)]
    pub category: String,
    /// Non-negative price. The catalog ships this as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Opaque image locator. Never interpreted, only passed through to
    /// rendering.
    #[serde(default)]
    pub image: String,
    /// Aggregate review rating. Absent or partial data must not break
    /// rendering, so every layer treats this as optional.
    pub rating: Option<Rating>,
}

/// Aggregate review rating for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating in `[0, 5]`.
    #[serde(default)]
    pub rate: f64,
    /// Number of reviews behind the average.
    #[serde(default)]
    pub count: u64,
}

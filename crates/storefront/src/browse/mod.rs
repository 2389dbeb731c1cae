//! Product browsing: filtering and category derivation.
//!
//! Pure, synchronous functions from the fetched product list and the
//! request's filter state to the displayed subset. No I/O and no stored
//! state: the category list is re-derived from the current product list on
//! every render rather than kept anywhere mutable.

use std::collections::{BTreeSet, HashSet};

use bodega_core::{Product, ProductId};
use rust_decimal::Decimal;

/// Which subset of the catalog the grid shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Browse the whole catalog.
    #[default]
    Explore,
    /// Restrict the grid to cart members.
    Cart,
}

impl ViewMode {
    /// Parse from URL parameter value. Unknown values fall back to explore.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "cart" => Self::Cart,
            _ => Self::Explore,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Cart => "cart",
        }
    }

    /// Whether this is the cart-only view.
    #[must_use]
    pub const fn is_cart(self) -> bool {
        matches!(self, Self::Cart)
    }
}

/// Filter state for one render of the product grid.
///
/// Ephemeral: owned by the request, never persisted.
#[derive(Debug, Default, Clone)]
pub struct BrowseFilters {
    /// Free-text query, matched case-insensitively as a substring.
    pub query: String,
    /// Inclusive upper price bound. `None` matches every price.
    pub max_price: Option<Decimal>,
    /// Explore the catalog or show only cart members.
    pub view: ViewMode,
}

/// Select the displayed subset of `products`.
///
/// A product is kept when the normalized query is empty or is a
/// case-insensitive substring of its title, description, or category, and
/// its price is within the inclusive bound. In cart view the subset is
/// further restricted to cart members. The input order is preserved exactly.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    filters: &BrowseFilters,
    cart: &BTreeSet<ProductId>,
) -> Vec<&'a Product> {
    let needle = filters.query.trim().to_lowercase();

    products
        .iter()
        .filter(|product| needle.is_empty() || matches_query(product, &needle))
        .filter(|product| filters.max_price.is_none_or(|bound| product.price <= bound))
        .filter(|product| !filters.view.is_cart() || cart.contains(&product.id))
        .collect()
}

/// Case-insensitive substring match across the three searchable fields.
fn matches_query(product: &Product, needle: &str) -> bool {
    product.title.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.category.to_lowercase().contains(needle)
}

/// Distinct category values of the unfiltered product list, each exactly
/// once, in first-occurrence order.
#[must_use]
pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter(|product| seen.insert(product.category.as_str()))
        .map(|product| product.category.clone())
        .collect()
}

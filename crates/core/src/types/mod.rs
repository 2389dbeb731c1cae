//! Core types for Bodega.
//!
//! This module provides the product model fetched from the remote catalog
//! and type-safe wrappers for entity identifiers.

pub mod id;
pub mod product;

pub use id::*;
pub use product::{Product, Rating};

//! Products as the checkout terminal sees them.
//!
//! The catalog is owned by a remote product service; this crate only holds the
//! read-only record it returns and the identifiers used to ask for it.

pub mod product;

pub use product::{CategoryId, Product, ProductCode, ProductId};

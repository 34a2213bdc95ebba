//! `pos-core`: domain building blocks for the checkout terminal.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod remote;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::DomainError;
pub use id::{CartId, CashierId, SaleId, SaleItemId};
pub use remote::RemoteError;
pub use value_object::{Money, ValueObject};

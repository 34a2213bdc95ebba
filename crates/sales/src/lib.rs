//! Checkout cart domain module (event-sourced).
//!
//! This crate contains the cart rules of the checkout terminal, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no clock).

pub mod cart;
pub mod item;
pub mod sale;

pub use cart::{
    BeginCheckout, BeginLookup, CancelRow, Cart, CartCommand, CartEvent, CompleteCheckout,
    CompleteLookup, ConfirmRow,
};
pub use item::{DISCOUNT_PLACEHOLDER, LookupTicket, ProductSnapshot, RowKey, RowState, SaleItem};
pub use sale::{Sale, SaleLineRequest, SaleRequest};

//! `pos-terminal`
//!
//! **Responsibility:** the checkout screen.
//!
//! This crate provides:
//! - [`PosSession`]: drives the cart against the product and sale services
//!   and turns outcomes into operator notices
//! - a text rendering of the cart (the presentation layer)
//! - operator input parsing and the line-based event loop behind the
//!   `pos-terminal` binary

pub mod app;
pub mod input;
pub mod notice;
pub mod session;
pub mod view;

pub use app::run;
pub use input::{InputError, OperatorCommand};
pub use notice::{Notice, NoticeLevel};
pub use session::{CheckoutReceipt, Completion, PendingCheckout, PendingLookup, PosSession};

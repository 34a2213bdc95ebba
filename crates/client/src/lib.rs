//! `pos-client`
//!
//! **Responsibility:** talk to the remote product and sale services.
//!
//! This crate provides:
//! - [`ProductLookup`]: read one product by code (`GET /products/{code}`)
//! - [`SaleSubmitter`]: submit a finished sale (`POST /sales`)
//! - HTTP implementations of both over `reqwest`
//! - [`ClientConfig`]: where the services live and how to call them
//!
//! Every failure is reported as a [`pos_core::RemoteError`].

pub mod config;
pub mod http;
pub mod products;
pub mod sales;

pub use config::{ClientConfig, ConfigError};
pub use products::{HttpProductLookup, ProductLookup};
pub use sales::{HttpSaleSubmitter, SaleSubmitter};

//! Product lookup: `GET /products/{code}`.

use std::sync::Arc;

use async_trait::async_trait;
use pos_core::RemoteError;
use pos_products::{Product, ProductCode};
use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::http;

/// Reads one product by the code the operator entered.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn fetch_product(&self, code: &ProductCode) -> Result<Product, RemoteError>;
}

#[async_trait]
impl<T: ProductLookup + ?Sized> ProductLookup for Arc<T> {
    async fn fetch_product(&self, code: &ProductCode) -> Result<Product, RemoteError> {
        (**self).fetch_product(code).await
    }
}

/// [`ProductLookup`] against the product service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProductLookup {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpProductLookup {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http,
            base_url: config.base_url()?,
        })
    }
}

#[async_trait]
impl ProductLookup for HttpProductLookup {
    #[instrument(skip(self, code), fields(code = %code))]
    async fn fetch_product(&self, code: &ProductCode) -> Result<Product, RemoteError> {
        let url = http::endpoint(&self.base_url, &["products", code.as_str()])?;
        debug!(%url, "Sending request");

        let resp = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Product request failed");
            http::transport_error(&e)
        })?;

        let resp = http::ensure_success(resp).await.inspect_err(|e| {
            warn!(kind = e.kind(), error = %e, "Product service refused lookup");
        })?;

        let product: Product = resp.json().await.map_err(|e| {
            warn!(error = %e, "Product payload could not be decoded");
            http::transport_error(&e)
        })?;

        debug!(product_id = %product.id, stock = product.available_stock, "Product fetched");
        Ok(product)
    }
}

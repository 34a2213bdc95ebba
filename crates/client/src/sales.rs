//! Sale submission: `POST /sales`.

use std::sync::Arc;

use async_trait::async_trait;
use pos_core::RemoteError;
use pos_sales::SaleRequest;
use reqwest::Url;
use tracing::{info, instrument, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::http;

/// Submits a finished cart as one sale.
///
/// Any success status means the sale was accepted; nothing in the response is
/// consumed. There is no retry: a failed submission is reported and the
/// operator decides whether to check out again.
#[async_trait]
pub trait SaleSubmitter: Send + Sync {
    async fn submit_sale(&self, sale: &SaleRequest) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: SaleSubmitter + ?Sized> SaleSubmitter for Arc<T> {
    async fn submit_sale(&self, sale: &SaleRequest) -> Result<(), RemoteError> {
        (**self).submit_sale(sale).await
    }
}

/// [`SaleSubmitter`] against the sale service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSaleSubmitter {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpSaleSubmitter {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http,
            base_url: config.base_url()?,
        })
    }
}

#[async_trait]
impl SaleSubmitter for HttpSaleSubmitter {
    #[instrument(skip(self, sale), fields(sale_id = %sale.id, items = sale.items.len()))]
    async fn submit_sale(&self, sale: &SaleRequest) -> Result<(), RemoteError> {
        let url = http::endpoint(&self.base_url, &["sales"])?;

        let resp = self.http.post(url).json(sale).send().await.map_err(|e| {
            warn!(error = %e, "Sale request failed");
            http::transport_error(&e)
        })?;

        http::ensure_success(resp).await.inspect_err(|e| {
            warn!(kind = e.kind(), error = %e, "Sale service refused sale");
        })?;

        info!("Sale accepted");
        Ok(())
    }
}

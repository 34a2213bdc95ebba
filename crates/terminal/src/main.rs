//! Checkout terminal entry point.

use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::BufReader;

use pos_client::{ClientConfig, HttpProductLookup, HttpSaleSubmitter};
use pos_observability::LogFormat;
use pos_terminal::PosSession;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Environment may come from a local .env file; missing is fine.
    dotenvy::dotenv().ok();

    pos_observability::init(LogFormat::from_env());

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let http = config
        .http_client()
        .context("failed to build HTTP client")?;

    let lookup = HttpProductLookup::new(http.clone(), &config)
        .context("failed to set up product lookup client")?;
    let submitter =
        HttpSaleSubmitter::new(http, &config).context("failed to set up sale client")?;

    tracing::info!(
        api_url = %config.api_url,
        cashier_id = %config.cashier_id,
        "Starting checkout terminal"
    );

    let session = PosSession::new(Arc::new(lookup), Arc::new(submitter), config.cashier_id);

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let session = pos_terminal::run(session, stdin, stdout).await?;

    if !session.cart().is_empty() {
        tracing::warn!(rows = session.cart().len(), "Exiting with an unsubmitted cart");
    }
    Ok(())
}

//! shopdesk - command-line back office for the shop's hosted store.
//!
//! Reads the store location from `SHOPDESK_URL` / `SHOPDESK_KEY`, signs in
//! and runs one command.

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::Cli;
use shopdesk::{ProductCache, StoreConfig, friendly_message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::from_env().context("store configuration")?;
    let mut dashboard = shopdesk::connect(config).context("failed to set up the store client")?;
    if let Some(path) = &args.cache {
        dashboard = dashboard.with_cache(ProductCache::new(path));
        let cached = dashboard.load_cached_products().await;
        tracing::debug!(cached, "loaded products from cache");
    }

    dashboard
        .sign_in(&args.email, &args.password)
        .await
        .map_err(|e| anyhow!(friendly_message(&e)))
        .context("sign-in failed")?;

    let result = cli::run(&mut dashboard, args.command).await;

    if let Err(e) = dashboard.sign_out().await {
        tracing::warn!(error = %e, "sign-out failed");
    }
    result
}

//! `ytfetch health`: query the service index.

use anyhow::Result;
use ytfetch_core::config::ClientConfig;
use ytfetch_core::{StreamingFetcher, TransportSession};

use super::run_cancellable;

pub async fn run_health(cfg: ClientConfig) -> Result<()> {
    let session = TransportSession::from_config(&cfg);
    let fetcher = StreamingFetcher::new(cfg)?;
    let server = fetcher.config().server_url.clone();

    let index = run_cancellable(move |_cancel| fetcher.health(&session)).await?;
    let name = index
        .get("service")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown service");
    let version = index.get("version").and_then(|v| v.as_str()).unwrap_or("?");
    println!("{server}: {name} {version}");
    Ok(())
}

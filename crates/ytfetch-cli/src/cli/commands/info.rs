//! `ytfetch info <url>`: print video metadata.

use anyhow::Result;
use ytfetch_core::config::ClientConfig;
use ytfetch_core::{InfoRequest, StreamingFetcher, TransportSession};

use super::run_cancellable;

pub async fn run_info(cfg: ClientConfig, url: String, include_formats: bool) -> Result<()> {
    let request = InfoRequest::new(url, include_formats)?;
    let session = TransportSession::from_config(&cfg);
    let fetcher = StreamingFetcher::new(cfg)?;

    let info = run_cancellable(move |cancel| fetcher.info(&request, &session, &cancel)).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

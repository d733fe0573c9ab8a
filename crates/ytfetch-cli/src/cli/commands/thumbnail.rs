//! `ytfetch thumbnail <url> [output]`: download the video thumbnail.

use anyhow::Result;
use std::path::PathBuf;
use ytfetch_core::config::ClientConfig;
use ytfetch_core::{StreamingFetcher, ThumbnailRequest, TransportSession};

use super::run_cancellable;

pub async fn run_thumbnail(cfg: ClientConfig, url: String, output: PathBuf) -> Result<()> {
    let request = ThumbnailRequest::new(url)?;
    let session = TransportSession::from_config(&cfg);
    let fetcher = StreamingFetcher::new(cfg)?;

    let path = run_cancellable(move |cancel| {
        fetcher.fetch_thumbnail(&request, &output, &session, &cancel)
    })
    .await?;
    println!("Done: {}", path.display());
    Ok(())
}

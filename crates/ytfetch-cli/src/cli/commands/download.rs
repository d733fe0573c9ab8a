//! `ytfetch <url> [output] [mode]`: submit a download job and save the result.

use anyhow::{Context, Result};
use ytfetch_core::config::ClientConfig;
use ytfetch_core::{DownloadTarget, JobRequest, StreamingFetcher, TransportSession};

use super::run_cancellable;
use crate::cli::DownloadArgs;

pub async fn run_download(mut cfg: ClientConfig, args: DownloadArgs) -> Result<()> {
    let url = args.url.context("missing URL")?;
    if args.cleanup_on_failure {
        cfg.cleanup_on_failure = true;
    }

    let job = JobRequest::new(url, args.mode)?;
    let target = DownloadTarget::new(&args.output)?;
    let session = TransportSession::from_config(&cfg);
    let fetcher = StreamingFetcher::new(cfg)?;

    println!("Server: {}", fetcher.config().server_url);
    println!("URL: {}", job.url());
    println!("Mode: {}", job.mode());
    println!("Output: {}", target.final_path().display());

    let published = run_cancellable(move |cancel| {
        fetcher.fetch_published(&job, &target, &session, &cancel)
    })
    .await?;

    println!("Done: {} ({} bytes)", published.path.display(), published.bytes);
    if args.sha256 {
        println!("{}  {}", published.sha256, published.path.display());
    }
    Ok(())
}

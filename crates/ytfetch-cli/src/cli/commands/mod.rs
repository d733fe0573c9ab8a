//! CLI command handlers. Each command is in its own file for clarity.

mod download;
mod health;
mod info;
mod thumbnail;

pub use download::run_download;
pub use health::run_health;
pub use info::run_info;
pub use thumbnail::run_thumbnail;

use anyhow::Result;
use ytfetch_core::{CancelToken, FetchError};

/// Run a blocking transfer on the blocking pool. Ctrl-C cancels it; the
/// transfer then stops at its next progress check and returns `Cancelled`.
pub(crate) async fn run_cancellable<T, F>(job: F) -> Result<T>
where
    F: FnOnce(CancelToken) -> Result<T, FetchError> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancelToken::new();
    let worker_token = cancel.clone();
    let mut handle = tokio::task::spawn_blocking(move || job(worker_token));

    tokio::select! {
        res = &mut handle => Ok(res??),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received, cancelling transfer");
            cancel.cancel();
            Ok(handle.await??)
        }
    }
}

//! StreamingFetcher: submit a job, stream the body to a staging file, publish atomically.
//!
//! Sequence per call: POST the job → check the status before any body byte is
//! stored → stream the body into `<final>.part` in fixed-size chunks → fsync,
//! close and rename to the final path. A failure anywhere before the rename
//! leaves the final path untouched; the staging file is kept unless
//! `cleanup_on_failure` is set. Nothing is retried.

mod sink;

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::control::CancelToken;
use crate::error::FetchError;
use crate::job::{InfoRequest, JobRequest, ThumbnailRequest};
use crate::response::ResponseHead;
use crate::target::DownloadTarget;
use crate::transport::{Request, TransportSession};
use sink::{MemorySink, StagingSink, TargetRule};

const MEDIA_ACCEPT: &str = "video/mp4, application/octet-stream;q=0.9, */*;q=0.5";
const IMAGE_ACCEPT: &str = "image/jpeg, image/png, image/webp;q=0.9, */*;q=0.5";
const JSON_ACCEPT: &str = "application/json";
const THUMBNAIL_FALLBACK_EXT: &str = "jpg";

/// A body that made it to its final path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the published bytes.
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct StreamingFetcher {
    config: ClientConfig,
}

impl StreamingFetcher {
    /// Build a fetcher around an explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        config
            .validate()
            .map_err(|e| FetchError::InvalidRequest(format!("{e:#}")))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Download `job` into `target`. Returns the published final path.
    pub fn fetch(
        &self,
        job: &JobRequest,
        target: &DownloadTarget,
        session: &TransportSession,
    ) -> Result<PathBuf, FetchError> {
        self.fetch_with_cancel(job, target, session, &CancelToken::new())
    }

    /// Like `fetch`, aborting the network read once `cancel` fires.
    pub fn fetch_with_cancel(
        &self,
        job: &JobRequest,
        target: &DownloadTarget,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<PathBuf, FetchError> {
        self.fetch_published(job, target, session, cancel).map(|p| p.path)
    }

    /// Like `fetch_with_cancel`, also reporting the size and SHA-256 of what
    /// was published.
    pub fn fetch_published(
        &self,
        job: &JobRequest,
        target: &DownloadTarget,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<Published, FetchError> {
        let endpoint = self.config.endpoint("download");
        let body = job.to_json()?;
        tracing::info!(
            url = job.url(),
            mode = job.mode(),
            endpoint = %endpoint,
            output = %target.final_path().display(),
            "submitting download job"
        );
        let request = Request {
            url: &endpoint,
            json_body: Some(&body),
            accept: MEDIA_ACCEPT,
        };
        self.stream(&request, TargetRule::Fixed(target.clone()), session, cancel)
    }

    /// Fetch the thumbnail for `request.url` to `<base>.<ext>`, where the
    /// extension follows the returned image type.
    pub fn fetch_thumbnail(
        &self,
        request: &ThumbnailRequest,
        base: &Path,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<PathBuf, FetchError> {
        // Validate the base name before talking to the server.
        DownloadTarget::with_extension(base, THUMBNAIL_FALLBACK_EXT)?;
        let endpoint = self.config.endpoint("thumbnail");
        let body = request.to_json()?;
        tracing::info!(url = request.url(), endpoint = %endpoint, "requesting thumbnail");
        let req = Request {
            url: &endpoint,
            json_body: Some(&body),
            accept: IMAGE_ACCEPT,
        };
        let rule = TargetRule::ImageFromHead {
            base: base.to_path_buf(),
            fallback_ext: THUMBNAIL_FALLBACK_EXT,
        };
        self.stream(&req, rule, session, cancel).map(|p| p.path)
    }

    /// Video metadata as returned by the service.
    pub fn info(
        &self,
        request: &InfoRequest,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<serde_json::Value, FetchError> {
        let endpoint = self.config.endpoint("info");
        let body = request.to_json()?;
        tracing::info!(url = request.url(), endpoint = %endpoint, "requesting info");
        let req = Request {
            url: &endpoint,
            json_body: Some(&body),
            accept: JSON_ACCEPT,
        };
        self.json(&req, session, cancel)
    }

    /// Service self-description from `GET /`.
    pub fn health(&self, session: &TransportSession) -> Result<serde_json::Value, FetchError> {
        let endpoint = self.config.endpoint("");
        let req = Request {
            url: &endpoint,
            json_body: None,
            accept: JSON_ACCEPT,
        };
        self.json(&req, session, &CancelToken::new())
    }

    fn stream(
        &self,
        request: &Request<'_>,
        rule: TargetRule,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<Published, FetchError> {
        let mut sink = StagingSink::new(rule, self.config.chunk_size);
        let outcome = session
            .exchange(request, &mut sink, cancel)
            .and_then(|head: ResponseHead| sink.publish(&head));
        if let Err(e) = &outcome {
            tracing::warn!(url = request.url, error = %e, "download failed");
            sink.abandon(self.config.cleanup_on_failure);
        }
        outcome
    }

    fn json(
        &self,
        request: &Request<'_>,
        session: &TransportSession,
        cancel: &CancelToken,
    ) -> Result<serde_json::Value, FetchError> {
        let mut sink = MemorySink::default();
        session.exchange(request, &mut sink, cancel)?;
        serde_json::from_slice(&sink.body)
            .map_err(|e| FetchError::InvalidResponse(format!("body is not JSON: {e}")))
    }
}

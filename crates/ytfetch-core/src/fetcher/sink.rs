//! Body sinks: staging file for media, memory buffer for JSON.

use std::path::PathBuf;

use crate::error::FetchError;
use crate::response::ResponseHead;
use crate::storage::{self, StagingWriter};
use crate::target::DownloadTarget;
use crate::transport::BodySink;

use super::Published;

/// How the staging/final pair is chosen.
pub(super) enum TargetRule {
    /// Known up front (media downloads).
    Fixed(DownloadTarget),
    /// Extension taken from the response head (thumbnails).
    ImageFromHead { base: PathBuf, fallback_ext: &'static str },
}

impl TargetRule {
    fn resolve(&self, head: &ResponseHead) -> Result<DownloadTarget, FetchError> {
        match self {
            TargetRule::Fixed(t) => Ok(t.clone()),
            TargetRule::ImageFromHead { base, fallback_ext } => {
                let ext = head
                    .image_extension()
                    .unwrap_or_else(|| fallback_ext.to_string());
                DownloadTarget::with_extension(base, &ext)
            }
        }
    }
}

/// Streams a 2xx body into a staging file; publishes or abandons it afterwards.
pub(super) struct StagingSink {
    rule: TargetRule,
    chunk_size: usize,
    target: Option<DownloadTarget>,
    writer: Option<StagingWriter>,
}

impl StagingSink {
    pub(super) fn new(rule: TargetRule, chunk_size: usize) -> Self {
        Self {
            rule,
            chunk_size,
            target: None,
            writer: None,
        }
    }

    fn open(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        if self.writer.is_some() {
            return Ok(());
        }
        let target = self.rule.resolve(head)?;
        let path = target.staging_path().to_path_buf();
        let mut writer = StagingWriter::create(&path, self.chunk_size)
            .map_err(|e| FetchError::filesystem(&path, e))?;
        if let Some(len) = head.content_length {
            writer.reserve(len);
        }
        tracing::debug!(staging = %path.display(), expected = ?head.content_length, "staging opened");
        self.target = Some(target);
        self.writer = Some(writer);
        Ok(())
    }

    /// Close the staging file and rename it into place.
    pub(super) fn publish(&mut self, head: &ResponseHead) -> Result<Published, FetchError> {
        // A 2xx with an empty body still publishes (an empty file).
        self.open(head)?;
        let (Some(writer), Some(target)) = (self.writer.take(), self.target.as_ref()) else {
            return Err(FetchError::InvalidResponse("no staging file to publish".into()));
        };
        let staging = target.staging_path();
        let staged = writer
            .finish()
            .map_err(|e| FetchError::filesystem(staging, e))?;
        storage::publish(staging, target.final_path())
            .map_err(|e| FetchError::filesystem(target.final_path(), e))?;
        tracing::info!(
            bytes = staged.bytes,
            sha256 = %staged.sha256,
            path = %target.final_path().display(),
            "download published"
        );
        Ok(Published {
            path: target.final_path().to_path_buf(),
            bytes: staged.bytes,
            sha256: staged.sha256,
        })
    }

    /// Give up after a failure. By default the staging file stays on disk with
    /// every byte received so far; `cleanup` removes it instead.
    pub(super) fn abandon(&mut self, cleanup: bool) {
        let Some(target) = self.target.take() else {
            return;
        };
        let staging = target.staging_path();
        let mut received = 0;
        if let Some(mut writer) = self.writer.take() {
            received = writer.received();
            if !cleanup {
                if let Err(e) = writer.flush_pending() {
                    tracing::debug!(error = %e, "could not flush pending bytes to staging file");
                }
                writer.release_reservation();
            }
        }
        if cleanup {
            match storage::discard(staging) {
                Ok(()) => tracing::info!(staging = %staging.display(), "removed staging file after failure"),
                Err(e) => tracing::warn!(staging = %staging.display(), error = %e, "could not remove staging file"),
            }
        } else if staging.exists() {
            tracing::warn!(
                staging = %staging.display(),
                received,
                "download failed; staging file left for inspection"
            );
        }
    }
}

impl BodySink for StagingSink {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        self.open(head)
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), FetchError> {
        let (Some(writer), Some(target)) = (self.writer.as_mut(), self.target.as_ref()) else {
            return Err(FetchError::InvalidResponse(
                "body arrived before response head".into(),
            ));
        };
        writer
            .write_chunk(data)
            .map_err(|e| FetchError::filesystem(target.staging_path(), e))
    }
}

/// Collects a whole body in memory. Used for small JSON responses only.
#[derive(Default)]
pub(super) struct MemorySink {
    pub(super) body: Vec<u8>,
}

impl BodySink for MemorySink {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        if let Some(len) = head.content_length {
            self.body.reserve(len.min(16 * 1024 * 1024) as usize);
        }
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), FetchError> {
        self.body.extend_from_slice(data);
        Ok(())
    }
}

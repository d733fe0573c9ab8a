//! Staging/final path pairs derived from a user-supplied base name.

use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::storage;

/// Extension of downloaded media.
pub const MEDIA_EXTENSION: &str = "mp4";

/// Where a download is staged and where it is published.
///
/// `staging_path` is always `final_path` + `.part`, so both live in the same
/// directory and the final rename stays on one filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    staging_path: PathBuf,
    final_path: PathBuf,
}

impl DownloadTarget {
    /// `base` → `base.mp4.part` / `base.mp4`.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, FetchError> {
        Self::with_extension(base, MEDIA_EXTENSION)
    }

    /// `base` → `base.<ext>.part` / `base.<ext>`.
    pub fn with_extension(base: impl AsRef<Path>, ext: &str) -> Result<Self, FetchError> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(FetchError::InvalidRequest("output name must not be empty".into()));
        }
        if base.file_name().is_none() || base.as_os_str().to_string_lossy().ends_with('/') {
            return Err(FetchError::InvalidRequest(format!(
                "output name {} has no file name",
                base.display()
            )));
        }
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            return Err(FetchError::InvalidRequest("extension must not be empty".into()));
        }

        let mut o = base.as_os_str().to_owned();
        o.push(".");
        o.push(ext);
        let final_path = PathBuf::from(o);
        Ok(Self {
            staging_path: storage::staging_path(&final_path),
            final_path,
        })
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }
}

//! Disk I/O and file lifecycle.
//!
//! Streams the response body into a `.part` staging file in fixed-size chunks
//! and publishes it with an atomic rename once the body is complete.

mod writer;

pub use writer::{Staged, StagingWriter};

use std::io;
use std::path::{Path, PathBuf};

/// Staging file suffix used before atomic rename.
pub const STAGING_SUFFIX: &str = ".part";

/// Default write chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Path for the staging file: appends `.part` to the final path (e.g. `video.mp4` → `video.mp4.part`).
pub fn staging_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(STAGING_SUFFIX);
    PathBuf::from(o)
}

/// Atomically move a closed staging file to its final name, replacing any existing file.
/// Both paths must be on the same filesystem.
pub fn publish(staging: &Path, final_path: &Path) -> io::Result<()> {
    std::fs::rename(staging, final_path)
}

/// Remove a staging file. A file that is already gone is not an error.
pub fn discard(staging: &Path) -> io::Result<()> {
    match std::fs::remove_file(staging) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

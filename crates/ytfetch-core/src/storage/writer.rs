//! Sequential chunked writer for staging files.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// What `StagingWriter::finish` leaves on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the body, computed as it streamed through.
    pub sha256: String,
}

/// Writes a body to a staging file in fixed-size chunks.
///
/// Incoming slices of any size are regrouped into `chunk_size` writes, so the
/// bytes held in memory never exceed one chunk. The body is hashed on the way
/// through; the file is never read back.
pub struct StagingWriter {
    file: File,
    buf: Vec<u8>,
    chunk_size: usize,
    written: u64,
    reserved: u64,
    hasher: Sha256,
}

impl StagingWriter {
    /// Create (or truncate) the staging file at `path`.
    pub fn create(path: &Path, chunk_size: usize) -> io::Result<Self> {
        if chunk_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "chunk size must be greater than zero",
            ));
        }
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(StagingWriter {
            file,
            buf: Vec::with_capacity(chunk_size),
            chunk_size,
            written: 0,
            reserved: 0,
            hasher: Sha256::new(),
        })
    }

    /// Reserve disk blocks for `size` bytes without changing the file length,
    /// so the staging file size keeps tracking the bytes actually written.
    /// Best effort: failures are logged and ignored.
    pub fn reserve(&mut self, size: u64) {
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            let r = unsafe {
                libc::fallocate(fd, libc::FALLOC_FL_KEEP_SIZE, 0, size as libc::off_t)
            };
            if r != 0 {
                let err = io::Error::last_os_error();
                tracing::debug!(error = %err, "fallocate failed, continuing without reservation");
                return;
            }
            self.reserved = size;
        }
        #[cfg(not(target_os = "linux"))]
        let _ = size;
    }

    /// Give back reserved blocks past the bytes written so far. Used when a
    /// download is abandoned and the partial file stays on disk.
    pub fn release_reservation(&mut self) {
        if self.reserved <= self.written {
            return;
        }
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            let r = unsafe {
                libc::fallocate(
                    fd,
                    libc::FALLOC_FL_PUNCH_HOLE | libc::FALLOC_FL_KEEP_SIZE,
                    self.written as libc::off_t,
                    (self.reserved - self.written) as libc::off_t,
                )
            };
            if r != 0 {
                let err = io::Error::last_os_error();
                tracing::debug!(error = %err, "could not release reserved blocks");
                return;
            }
        }
        self.reserved = self.written;
    }

    /// Append `data`. Empty slices are skipped.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.hasher.update(data);
        let mut rest = data;
        while !rest.is_empty() {
            let take = (self.chunk_size - self.buf.len()).min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() == self.chunk_size {
                self.flush_pending()?;
            }
        }
        Ok(())
    }

    /// Write out any partially filled chunk.
    pub fn flush_pending(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.file.write_all(&self.buf)?;
        self.written += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Bytes handed to `write_chunk` so far, flushed or not.
    pub fn received(&self) -> u64 {
        self.written + self.buf.len() as u64
    }

    /// Flush, fsync and close the file.
    pub fn finish(mut self) -> io::Result<Staged> {
        self.flush_pending()?;
        self.file.sync_all()?;
        Ok(Staged {
            bytes: self.written,
            sha256: hex::encode(self.hasher.finalize()),
        })
    }
}

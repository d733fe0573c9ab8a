//! Error taxonomy for a single fetch call.
//!
//! Every failure is surfaced to the caller as-is; nothing here retries.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on how much of a non-success response body is kept for the error message.
pub(crate) const MAX_ERROR_BODY: usize = 64 * 1024;

/// Coarse classification of a libcurl failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// TCP connect failed (refused, unreachable).
    Connect,
    /// Host name could not be resolved.
    Resolve,
    /// Connect timeout elapsed.
    Timeout,
    /// Connection dropped or body ended short after the transfer started.
    Interrupted,
    /// Anything else libcurl reports.
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Connect => "connect",
            TransportKind::Resolve => "resolve",
            TransportKind::Timeout => "timeout",
            TransportKind::Interrupted => "interrupted",
            TransportKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classify a curl error into a `TransportKind`.
pub fn classify_curl_error(e: &curl::Error) -> TransportKind {
    if e.is_operation_timedout() {
        return TransportKind::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportKind::Resolve;
    }
    if e.is_couldnt_connect() {
        return TransportKind::Connect;
    }
    if e.is_partial_file()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_read_error()
        || e.is_got_nothing()
    {
        return TransportKind::Interrupted;
    }
    TransportKind::Other
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Job or target rejected before any network traffic.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error ({kind}): {source}")]
    Transport {
        kind: TransportKind,
        #[source]
        source: curl::Error,
    },

    /// Service answered with a non-2xx status. `detail` holds extra diagnostics
    /// (e.g. a stderr tail) when the body was structured.
    #[error("server returned HTTP {status}: {message}")]
    Server {
        status: u32,
        message: String,
        detail: Option<String>,
    },

    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download cancelled")]
    Cancelled,

    /// Success status but the body could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    pub(crate) fn transport(source: curl::Error) -> Self {
        FetchError::Transport {
            kind: classify_curl_error(&source),
            source,
        }
    }

    pub(crate) fn filesystem(path: &Path, source: io::Error) -> Self {
        FetchError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Build a `Server` error from a status and the (possibly truncated) body.
    ///
    /// JSON bodies of the form `{"error": ..., "stderr_tail": ...}` are unpacked;
    /// anything else is used verbatim as text.
    pub(crate) fn server(status: u32, body: &[u8]) -> Self {
        let (message, detail) = server_message(body);
        let message = if message.is_empty() {
            "no response body".to_string()
        } else {
            message
        };
        FetchError::Server {
            status,
            message,
            detail,
        }
    }

    /// True when the failure happened on the wire (not on disk, not on the server).
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

fn server_message(body: &[u8]) -> (String, Option<String>) {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(err) = obj.get("error").and_then(|v| v.as_str()) {
            let detail = obj
                .get("stderr_tail")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            return (err.to_string(), detail);
        }
    }
    (String::from_utf8_lossy(body).trim().to_string(), None)
}

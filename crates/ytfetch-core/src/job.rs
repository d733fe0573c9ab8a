//! Job descriptions submitted to the download service.

use serde::Serialize;

use crate::error::FetchError;

/// Single-file mp4 when available; starts streaming soonest on the server side.
pub const MODE_PROGRESSIVE: &str = "progressive";

/// A download job: source URL plus the server-side processing mode.
///
/// The mode is passed through untouched; only emptiness is checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    url: String,
    mode: String,
}

impl JobRequest {
    pub fn new(url: impl Into<String>, mode: impl Into<String>) -> Result<Self, FetchError> {
        let url = validate_url(url.into())?;
        let mode = mode.into().trim().to_string();
        if mode.is_empty() {
            return Err(FetchError::InvalidRequest("mode must not be empty".into()));
        }
        Ok(Self { url, mode })
    }

    pub fn progressive(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::new(url, MODE_PROGRESSIVE)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, FetchError> {
        to_body(self)
    }
}

/// Body of `POST /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoRequest {
    url: String,
    include_formats: bool,
}

impl InfoRequest {
    pub fn new(url: impl Into<String>, include_formats: bool) -> Result<Self, FetchError> {
        Ok(Self {
            url: validate_url(url.into())?,
            include_formats,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, FetchError> {
        to_body(self)
    }
}

/// Body of `POST /thumbnail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailRequest {
    url: String,
}

impl ThumbnailRequest {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            url: validate_url(url.into())?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, FetchError> {
        to_body(self)
    }
}

fn validate_url(url: String) -> Result<String, FetchError> {
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(FetchError::InvalidRequest("url must not be empty".into()));
    }
    url::Url::parse(&url)
        .map_err(|e| FetchError::InvalidRequest(format!("invalid url {url:?}: {e}")))?;
    Ok(url)
}

fn to_body<T: Serialize>(value: &T) -> Result<Vec<u8>, FetchError> {
    serde_json::to_vec(value).map_err(|e| FetchError::InvalidRequest(e.to_string()))
}

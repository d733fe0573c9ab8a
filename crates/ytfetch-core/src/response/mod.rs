//! Response metadata collected from libcurl header callbacks.
//!
//! Only the head of the final response counts: header lines are reset every
//! time a new status line arrives (redirects, `100 Continue`).

mod parse;

pub(crate) use parse::parse_headers;

/// Status and the headers the client acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the last status line, if one was seen.
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Type` without parameters, lowercased.
    pub content_type: Option<String>,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    /// Extension for an image body, from `Content-Type` first, then the
    /// `Content-Disposition` filename.
    pub fn image_extension(&self) -> Option<String> {
        let from_type = match self.content_type.as_deref() {
            Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
            Some("image/png") => Some("png"),
            Some("image/webp") => Some("webp"),
            _ => None,
        };
        if let Some(ext) = from_type {
            return Some(ext.to_string());
        }
        self.disposition_filename()
            .and_then(|name| {
                std::path::Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase())
            })
            .filter(|e| !e.is_empty())
    }

    /// `filename="..."` parameter of `Content-Disposition`, if any.
    pub fn disposition_filename(&self) -> Option<String> {
        let value = self.content_disposition.as_deref()?;
        value.split(';').find_map(|part| {
            let (k, v) = part.trim().split_once('=')?;
            if k.trim().eq_ignore_ascii_case("filename") {
                let v = v.trim().trim_matches('"');
                (!v.is_empty()).then(|| v.to_string())
            } else {
                None
            }
        })
    }
}

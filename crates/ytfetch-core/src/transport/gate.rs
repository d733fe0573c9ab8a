//! Status gating between libcurl's write callback and a body sink.

use crate::error::{FetchError, MAX_ERROR_BODY};
use crate::response::{parse_headers, ResponseHead};

/// Receives the body of a successful response.
pub(crate) trait BodySink {
    /// Called once, before the first body bytes of a 2xx response.
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError>;
    /// Called for every body slice libcurl delivers.
    fn on_data(&mut self, data: &[u8]) -> Result<(), FetchError>;
}

/// Routes body bytes: to the sink when the status is 2xx, into a bounded
/// diagnostic buffer otherwise. The head is fixed on the first body byte.
pub(super) struct StatusGate<'s> {
    sink: &'s mut dyn BodySink,
    pub(super) head: Option<ResponseHead>,
    pub(super) error_body: Vec<u8>,
    pub(super) failure: Option<FetchError>,
}

impl<'s> StatusGate<'s> {
    pub(super) fn new(sink: &'s mut dyn BodySink) -> Self {
        Self {
            sink,
            head: None,
            error_body: Vec::new(),
            failure: None,
        }
    }

    /// Returns the number of bytes consumed; anything short of `data.len()` aborts the transfer.
    pub(super) fn accept(&mut self, header_lines: &[String], data: &[u8]) -> usize {
        if self.head.is_none() {
            let head = parse_headers(header_lines);
            if head.is_success() {
                if let Err(e) = self.sink.on_head(&head) {
                    self.failure = Some(e);
                    return 0;
                }
            }
            self.head = Some(head);
        }

        let success = self.head.as_ref().map_or(false, ResponseHead::is_success);
        if success {
            match self.sink.on_data(data) {
                Ok(()) => data.len(),
                Err(e) => {
                    self.failure = Some(e);
                    0
                }
            }
        } else {
            let room = MAX_ERROR_BODY.saturating_sub(self.error_body.len());
            self.error_body
                .extend_from_slice(&data[..data.len().min(room)]);
            data.len()
        }
    }
}

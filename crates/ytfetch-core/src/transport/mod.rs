//! HTTP transport over libcurl (via the `curl` crate).
//!
//! A `TransportSession` is configuration only: each exchange builds its own
//! easy handle, so one session can be shared across threads. In direct mode
//! (the default) libcurl is told to ignore every proxy, including the
//! `http_proxy`/`https_proxy`/`all_proxy` environment variables.

mod gate;

pub(crate) use gate::BodySink;

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use curl::easy::{Easy, List};

use crate::config::ClientConfig;
use crate::control::CancelToken;
use crate::error::FetchError;
use crate::response::{parse_headers, ResponseHead};
use gate::StatusGate;

const USER_AGENT: &str = concat!("ytfetch/", env!("CARGO_PKG_VERSION"));

/// How the transport picks a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyMode {
    /// Connect straight to the service; ambient proxy variables are ignored.
    #[default]
    Direct,
    /// Let libcurl pick up proxy settings from the environment.
    Environment,
}

#[derive(Debug, Clone, Default)]
pub struct TransportSession {
    proxy_mode: ProxyMode,
    connect_timeout: Option<Duration>,
}

/// One request: POST with a JSON body, or GET when `json_body` is `None`.
pub(crate) struct Request<'a> {
    pub url: &'a str,
    pub json_body: Option<&'a [u8]>,
    pub accept: &'a str,
}

impl TransportSession {
    /// Session that never goes through a proxy.
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self {
            proxy_mode: if cfg.inherit_proxy_env {
                ProxyMode::Environment
            } else {
                ProxyMode::Direct
            },
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_proxy_mode(mut self, mode: ProxyMode) -> Self {
        self.proxy_mode = mode;
        self
    }

    pub fn proxy_mode(&self) -> ProxyMode {
        self.proxy_mode
    }

    /// True when traffic bypasses every proxy.
    pub fn is_direct(&self) -> bool {
        self.proxy_mode == ProxyMode::Direct
    }

    fn handle(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.useragent(USER_AGENT)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        if self.proxy_mode == ProxyMode::Direct {
            // Empty proxy disables proxying; "*" also overrides no_proxy lookups.
            easy.proxy("")?;
            easy.noproxy("*")?;
        }
        if let Some(t) = self.connect_timeout {
            easy.connect_timeout(t)?;
        }
        // No overall timeout: the server may work for a long time before the first byte.
        // Keepalive probes catch peers that vanish during that wait.
        easy.tcp_keepalive(true)?;
        easy.tcp_keepidle(Duration::from_secs(60))?;
        easy.tcp_keepintvl(Duration::from_secs(30))?;
        easy.progress(true)?;
        Ok(easy)
    }

    /// Run one request, feeding a 2xx body to `sink`.
    ///
    /// The body of a non-2xx response never reaches the sink; it is returned
    /// inside `FetchError::Server`. Runs in the current thread; call from
    /// `spawn_blocking` if used from async code.
    pub(crate) fn exchange(
        &self,
        request: &Request<'_>,
        sink: &mut dyn BodySink,
        cancel: &CancelToken,
    ) -> Result<ResponseHead, FetchError> {
        let mut easy = self.handle(request.url).map_err(FetchError::transport)?;

        let mut list = List::new();
        list.append(&format!("Accept: {}", request.accept))
            .map_err(FetchError::transport)?;
        // Suppress `Expect: 100-continue`; bodies are tiny.
        list.append("Expect:").map_err(FetchError::transport)?;
        match request.json_body {
            Some(body) => {
                list.append("Content-Type: application/json")
                    .map_err(FetchError::transport)?;
                easy.post(true).map_err(FetchError::transport)?;
                easy.post_fields_copy(body).map_err(FetchError::transport)?;
            }
            None => easy.get(true).map_err(FetchError::transport)?,
        }
        easy.http_headers(list).map_err(FetchError::transport)?;

        tracing::debug!(
            url = request.url,
            direct = self.is_direct(),
            method = if request.json_body.is_some() { "POST" } else { "GET" },
            "starting transfer"
        );

        let header_lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut gate = StatusGate::new(sink);

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        let mut lines = header_lines.borrow_mut();
                        if line.starts_with("HTTP/") {
                            lines.clear();
                        }
                        if !line.is_empty() {
                            lines.push(line.to_string());
                        }
                    }
                    true
                })
                .map_err(FetchError::transport)?;
            transfer
                .write_function(|data| Ok(gate.accept(&header_lines.borrow(), data)))
                .map_err(FetchError::transport)?;
            transfer
                .progress_function(|_, _, _, _| !cancel.is_cancelled())
                .map_err(FetchError::transport)?;
            transfer.perform()
        };

        let head = match gate.head.take() {
            Some(head) => head,
            None => {
                let mut head = parse_headers(&header_lines.borrow());
                if head.status.is_none() {
                    head.status = easy.response_code().ok().filter(|c| *c != 0);
                }
                head
            }
        };

        if let Err(e) = performed {
            if let Some(failure) = gate.failure.take() {
                return Err(failure);
            }
            if e.is_aborted_by_callback() || cancel.is_cancelled() {
                tracing::info!(url = request.url, "transfer cancelled");
                return Err(FetchError::Cancelled);
            }
            if let Some(status) = head.status.filter(|_| !head.is_success()) {
                return Err(FetchError::server(status, &gate.error_body));
            }
            return Err(FetchError::transport(e));
        }

        match head.status {
            Some(_) if head.is_success() => Ok(head),
            Some(status) => Err(FetchError::server(status, &gate.error_body)),
            None => Err(FetchError::InvalidResponse(
                "response carried no HTTP status".into(),
            )),
        }
    }
}

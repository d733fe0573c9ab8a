#![allow(dead_code)]

pub mod job_server;

use ytfetch_core::config::ClientConfig;
use ytfetch_core::StreamingFetcher;

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

pub fn config_for(base_url: &str) -> ClientConfig {
    ClientConfig {
        server_url: base_url.to_string(),
        ..ClientConfig::default()
    }
}

pub fn fetcher_for(base_url: &str) -> StreamingFetcher {
    StreamingFetcher::new(config_for(base_url)).expect("valid config")
}

pub mod config;
pub mod logging;

pub mod control;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod response;
pub mod storage;
pub mod target;
pub mod transport;

pub use control::CancelToken;
pub use error::{FetchError, TransportKind};
pub use fetcher::{Published, StreamingFetcher};
pub use job::{InfoRequest, JobRequest, ThumbnailRequest};
pub use target::DownloadTarget;
pub use transport::{ProxyMode, TransportSession};

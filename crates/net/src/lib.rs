//! Blocking HTTP plumbing for the lazy-views client.
//!
//! The transport is a trait so the runtime can be driven by an in-memory
//! implementation in tests; `UreqTransport` is the real one.

pub mod form;
pub mod transport;

pub use crate::form::FormBody;
pub use crate::transport::{MAX_BODY_BYTES, Transport, UreqTransport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub url: String, // final URL after redirects
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub duration_ms: u128,
}

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("{url}: HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("{url}: {message}")]
    Transport { url: String, message: String },
    #[error("{url}: reading response body failed: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{url}: response body exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },
}

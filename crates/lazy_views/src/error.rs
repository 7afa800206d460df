use core_types::RequestId;
use html::DomError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid base url `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure of one command handler. Dispatch records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LazyViewsError {
    #[error("network runtime is gone")]
    BusClosed,
    #[error("batch request {request_id} failed: {message}")]
    Network { request_id: RequestId, message: String },
    #[error("batch response {request_id} is not a command list: {source}")]
    Decode {
        request_id: RequestId,
        #[source]
        source: serde_json::Error,
    },
    #[error("response for unknown request {0}")]
    UnknownRequest(RequestId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

//! Error types for the client library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A document write without a type name or document id. No request is sent.
    #[error("missing type or id")]
    MissingId,

    /// The service answered with an `error` field in its JSON body.
    #[error("service error ({status}): {reason}")]
    Service { status: u16, reason: String },

    #[error("transport setup failed: {0}")]
    Setup(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Elasticsearch(#[from] elasticsearch::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

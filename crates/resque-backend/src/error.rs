//! Error types for the backend client.

use thiserror::Error;

/// Result type alias for backend reads.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while turning a connection string into a client.
///
/// These only surface at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid connection URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown URL scheme: {0}")]
    UnknownScheme(String),

    #[error("unix socket connections are not supported on this platform")]
    UnixUnsupported,

    #[error("failed to build redis client: {0}")]
    Client(String),
}

/// Errors raised while reading from the backend during a scrape.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("key {0} does not exist")]
    Nil(String),

    #[error("value of {key} is not a number: {value:?}")]
    NotANumber { key: String, value: String },

    #[error("WRONGTYPE operation against key {0} holding the wrong kind of value")]
    WrongType(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the error means the cached connection can no longer be used.
    pub fn is_connection_error(&self) -> bool {
        match self {
            BackendError::Redis(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            BackendError::Unavailable(_) => true,
            _ => false,
        }
    }
}

//! Error types for configuration and storage operations.

use s3link_sigv4::SigningError;

/// Errors raised while loading [`S3LinkConfig`](crate::config::S3LinkConfig)
/// or building a client from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The dotenv file exists but cannot be read or parsed.
    #[error("failed to load dotenv file: {0}")]
    Dotenv(#[source] dotenvy::Error),

    /// The custom endpoint URL cannot be parsed into scheme and authority.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The outbound HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors returned by [`StorageClient`](crate::client::StorageClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The signed request could not be converted into an outbound request.
    #[error("failed to build storage request: {0}")]
    InvalidRequest(#[source] reqwest::Error),

    /// The storage service answered with a non-success status.
    #[error("storage service rejected the request with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the storage service.
        status: u16,
        /// Response body, usually an XML error document.
        body: String,
    },

    /// The outgoing request could not be signed.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

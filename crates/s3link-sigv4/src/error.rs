//! Error types for request signing.

/// Errors that can occur while assembling a signed request.
///
/// Signature computation itself is infallible; only turning the signed parts
/// into an [`http::Request`] can fail, when a header value or URI contains
/// characters HTTP cannot carry.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The signed request could not be represented as an HTTP request.
    #[error("invalid signed request: {0}")]
    InvalidRequest(#[from] http::Error),
}

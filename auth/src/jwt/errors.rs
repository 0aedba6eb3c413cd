use thiserror::Error;

/// Error type for JWT operations.
///
/// Every validation failure (malformed token, bad signature, expiry) is
/// reported as the same `InvalidToken` so callers cannot tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid token")]
    InvalidToken,
}

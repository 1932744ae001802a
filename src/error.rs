//! Error types for the catalog adapter and the queue service.

use thiserror::Error;

/// Result type alias using [`ServiceError`].
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors reported by the command surface and the queue engine.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Client credentials are missing. Permanent until reconfigured.
    #[error("Spotify credentials are not configured.")]
    NotConfigured,

    /// No session, or the session expired and could not be refreshed.
    #[error("Spotify session is not authenticated: {0}")]
    NotAuthenticated(String),

    /// Malformed caller input. Raised before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested range does not fit the playlist as it is right now.
    #[error(
        "Range {range_start}..{} is out of bounds for a playlist of {total} items",
        .range_start + .range_length
    )]
    OutOfBounds {
        range_start: usize,
        range_length: usize,
        total: usize,
    },

    /// The request is well-formed but not allowed in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The catalog kept rate limiting after the bounded retries.
    #[error("Rate limited by Spotify (retry after {retry_after:?} seconds)")]
    RateLimited { retry_after: Option<u64> },

    /// Any other failure of a catalog call.
    #[error("Spotify request {operation} failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Upstream {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    /// HTTP status of an upstream failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Wraps an adapter error with the name of the failed operation.
    ///
    /// A 429 is kept as `Upstream` with status 429; only the retrying search
    /// path reports [`ServiceError::RateLimited`].
    pub fn upstream(operation: &'static str, err: CatalogError) -> Self {
        ServiceError::Upstream {
            operation,
            status: err.status(),
            message: err.to_string(),
        }
    }
}

/// Errors raised by a [`CatalogClient`](crate::spotify::CatalogClient).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("rate limited (retry after {retry_after:?} seconds)")]
    RateLimited { retry_after: Option<u64> },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("client credentials are missing")]
    MissingCredentials,
}

impl CatalogError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::RateLimited { .. } => Some(429),
            CatalogError::Status { status, .. } => Some(*status),
            CatalogError::Transport(e) => e.status().map(|s| s.as_u16()),
            CatalogError::Decode(_) | CatalogError::MissingCredentials => None,
        }
    }
}

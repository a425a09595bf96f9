//! Error types for notionmd library.

use std::io;
use thiserror::Error;

/// Result type alias for notionmd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of response-body characters kept in an [`Error::Api`].
pub const MAX_ERROR_BODY: usize = 200;

/// Error types that can occur while converting pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("Notion API error {status} for {endpoint}: {body}")]
    Api {
        /// Endpoint or URL that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// A page identifier could not be extracted from the input.
    #[error("Could not find 32-character page id in '{0}'")]
    InvalidId(String),

    /// Input is missing required structural markers.
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// An object store is configured but there is no public base URL for it.
    #[error("No public URL configured for uploads; refusing to create dead asset links")]
    MissingPublicUrl,

    /// Uploading an asset to object storage failed.
    #[error("Upload failed for {key}: {reason}")]
    Upload {
        /// Storage key of the object
        key: String,
        /// Failure description
        reason: String,
    },

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::Api`], truncating the body to [`MAX_ERROR_BODY`] characters.
    pub fn api(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
    }

    /// Whether this error came from talking to a remote service.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Api { .. })
    }
}

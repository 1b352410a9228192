//! Catalog client error types.

use hrdem_common::Transient;
use thiserror::Error;

/// Errors that can occur while searching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network or transport failure (connect, timeout, reset).
    #[error("Catalog request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The catalog answered with a non-success status.
    #[error("Catalog returned HTTP {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not a valid item collection.
    #[error("Invalid catalog response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The caller cancelled the search.
    #[error("Catalog search cancelled")]
    Cancelled,
}

impl Transient for CatalogError {
    fn is_transient(&self) -> bool {
        match self {
            CatalogError::Transport { .. } => true,
            CatalogError::Status { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            CatalogError::Client(_) | CatalogError::Decode { .. } | CatalogError::Cancelled => {
                false
            }
        }
    }
}

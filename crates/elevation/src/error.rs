//! Pipeline error kinds.

use std::io;
use std::path::PathBuf;

use hrdem_common::BoundingBox;
use projection::ProjectionError;
use stac_client::CatalogError;
use thiserror::Error;

use crate::geometry::AoiError;
use crate::product::ProductError;

/// Errors that end a fetch before any raster is written.
///
/// Per-asset warp failures do not appear here; they are collected in the
/// [`FetchReport`](crate::FetchReport).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] AoiError),

    #[error("Reprojection failed: {0}")]
    Reprojection(#[from] ProjectionError),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("No catalog items intersect {bbox}")]
    EmptyResult { bbox: BoundingBox },

    #[error("No asset matches '{pattern}' among {candidates} catalog assets")]
    NoMatchingAsset { pattern: String, candidates: usize },

    #[error("Output directory {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cancelled before warping started; later cancellation is reported
    /// through [`FetchReport::cancelled`](crate::FetchReport::cancelled).
    #[error("Fetch cancelled")]
    Cancelled,
}

impl From<ProductError> for FetchError {
    fn from(err: ProductError) -> Self {
        FetchError::InvalidParameter(err.to_string())
    }
}

impl From<CatalogError> for FetchError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Cancelled => FetchError::Cancelled,
            other => FetchError::CatalogUnavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_cancellation_maps_to_cancelled() {
        assert!(matches!(
            FetchError::from(CatalogError::Cancelled),
            FetchError::Cancelled
        ));

        let err = FetchError::from(CatalogError::Status {
            url: "https://example.com/search".to_string(),
            status: 503,
            body: String::new(),
        });
        assert!(matches!(err, FetchError::CatalogUnavailable(_)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_product_error_is_invalid_parameter() {
        let err = FetchError::from(ProductError::UnknownFormat("png".to_string()));
        assert!(matches!(err, FetchError::InvalidParameter(ref msg) if msg.contains("png")));
    }
}

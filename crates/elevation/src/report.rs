//! Outcome of a fetch: rasters written and per-asset failures.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::normalize::NormalizedBounds;

/// Why a selected asset was not written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The warp failed after all retries.
    Warp { message: String },
    /// Another selected asset already claimed the output filename.
    FilenameCollision { existing_href: String },
    /// The fetch was cancelled before this asset finished.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Warp { message } => write!(f, "warp failed: {message}"),
            FailureReason::FilenameCollision { existing_href } => {
                write!(f, "output filename already used by {existing_href}")
            }
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A selected asset that produced no output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetFailure {
    pub href: String,
    pub filename: String,
    pub reason: FailureReason,
}

/// A raster written to the output directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenRaster {
    pub href: String,
    pub path: PathBuf,
    /// Warp attempts used, including the successful one
    pub attempts: u32,
}

/// Aggregated result of [`ElevationFetcher::fetch`](crate::ElevationFetcher::fetch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchReport {
    /// Canonical output directory
    pub output_dir: PathBuf,
    pub bounds: NormalizedBounds,
    pub written: Vec<WrittenRaster>,
    pub failures: Vec<AssetFailure>,
    /// The fetch was cancelled while warping; unfinished assets are listed
    /// in `failures` with [`FailureReason::Cancelled`].
    pub cancelled: bool,
}

impl FetchReport {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when every selected asset was written.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdem_common::{BoundingBox, CrsCode};

    fn report(failures: Vec<AssetFailure>, cancelled: bool) -> FetchReport {
        FetchReport {
            output_dir: PathBuf::from("/out"),
            bounds: NormalizedBounds {
                search: BoundingBox::new(-75.72, 45.40, -75.68, 45.43),
                clip: BoundingBox::new(1_505_000.0, -172_000.0, 1_507_000.0, -170_000.0),
                clip_crs: CrsCode::CANADA_ATLAS_LAMBERT,
            },
            written: vec![WrittenRaster {
                href: "https://host/a_dtm.tif".to_string(),
                path: PathBuf::from("/out/a_dtm.tif"),
                attempts: 1,
            }],
            failures,
            cancelled,
        }
    }

    #[test]
    fn test_cancelled_report_is_incomplete() {
        let failure = AssetFailure {
            href: "https://host/b_dtm.tif".to_string(),
            filename: "b_dtm.tif".to_string(),
            reason: FailureReason::Cancelled,
        };

        assert!(report(vec![], false).is_complete());
        assert!(!report(vec![failure.clone()], false).is_complete());
        // Cancellation after every job finished still counts
        assert!(!report(vec![], true).is_complete());

        let cancelled = report(vec![failure], true);
        assert_eq!(cancelled.succeeded(), 1);
        assert_eq!(cancelled.failed(), 1);
    }

    #[test]
    fn test_failure_reason_serialization() {
        let value = serde_json::to_value(FailureReason::Cancelled).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "cancelled"}));

        let value = serde_json::to_value(FailureReason::Warp {
            message: "exit status: 1".to_string(),
        })
        .unwrap();
        assert_eq!(value["kind"], "warp");
        assert_eq!(value["message"], "exit status: 1");
    }
}

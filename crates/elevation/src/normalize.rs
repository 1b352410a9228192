//! AOI normalization: the search and clip bounding boxes.

use hrdem_common::{BoundingBox, CrsCode};
use serde::Serialize;
use tracing::debug;

use crate::error::FetchError;
use crate::geometry::{Aoi, AoiError};

/// Bounding boxes derived from one AOI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBounds {
    /// Catalog search extent in EPSG:4326.
    pub search: BoundingBox,
    /// Warp extent in `clip_crs`.
    pub clip: BoundingBox,
    pub clip_crs: CrsCode,
}

/// Turns an AOI into [`NormalizedBounds`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    clip_crs: CrsCode,
    densify_points: usize,
    min_clip_size: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CrsCode::CANADA_ATLAS_LAMBERT, 21, 1.0)
    }
}

impl Normalizer {
    /// `densify_points` are inserted into every edge before reprojection;
    /// a clip box thinner than `min_clip_size` (clip CRS units) on an axis
    /// is widened to that size around its center.
    pub fn new(clip_crs: CrsCode, densify_points: usize, min_clip_size: f64) -> Self {
        Self {
            clip_crs,
            densify_points,
            min_clip_size,
        }
    }

    pub fn normalize(&self, aoi: &Aoi) -> Result<NormalizedBounds, FetchError> {
        aoi.validate()?;

        let dense = aoi.densify(self.densify_points);
        let search = Self::projected_bounds(&dense, CrsCode::WGS84)?;
        let clip = Self::projected_bounds(&dense, self.clip_crs)?.with_min_size(self.min_clip_size);

        debug!(
            aoi_crs = %aoi.crs(),
            search = %search,
            clip = %clip,
            clip_crs = %self.clip_crs,
            "Normalized AOI"
        );

        Ok(NormalizedBounds {
            search,
            clip,
            clip_crs: self.clip_crs,
        })
    }

    fn projected_bounds(aoi: &Aoi, crs: CrsCode) -> Result<BoundingBox, FetchError> {
        aoi.reproject(crs)?
            .bounds()
            .ok_or(FetchError::InvalidGeometry(AoiError::Empty))
    }
}

//! Configuration for the elevation fetcher.

use std::path::PathBuf;

use hrdem_common::{CrsCode, RetryPolicy};
use stac_client::StacClientConfig;

/// Configuration for an [`ElevationFetcher`](crate::ElevationFetcher).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Catalog endpoint, collection and paging.
    pub catalog: StacClientConfig,

    /// CRS of the clip bbox and of every output raster.
    pub clip_crs: CrsCode,

    /// Points inserted per AOI edge before reprojecting its bounds.
    pub densify_points: usize,

    /// Minimum clip bbox size per axis, in clip CRS units.
    pub min_clip_size: f64,

    /// Warps running at once (values below 1 act as 1).
    pub max_concurrent: usize,

    /// Retry policy for each warp.
    pub warp_retry: RetryPolicy,

    /// Path to the gdalwarp executable.
    pub gdalwarp: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            catalog: StacClientConfig::default(),
            clip_crs: CrsCode::CANADA_ATLAS_LAMBERT,
            densify_points: 21,
            min_clip_size: 1.0,
            max_concurrent: 4,
            warp_retry: RetryPolicy::default(),
            gdalwarp: PathBuf::from("gdalwarp"),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("HRDEM_STAC_URL") {
            config.catalog.base_url = val;
        }

        if let Some(val) = lookup("HRDEM_COLLECTION") {
            config.catalog.collection = val;
        }

        if let Some(val) = lookup("HRDEM_MAX_CONCURRENT") {
            if let Ok(n) = val.trim().parse() {
                config.max_concurrent = n;
            }
        }

        // Shared by catalog requests and warps
        if let Some(val) = lookup("HRDEM_MAX_RETRIES") {
            if let Ok(n) = val.trim().parse() {
                config.set_max_attempts(n);
            }
        }

        if let Some(val) = lookup("GDALWARP_BIN") {
            config.gdalwarp = PathBuf::from(val);
        }

        config
    }

    /// Set the attempt budget of both catalog requests and warps.
    pub fn set_max_attempts(&mut self, attempts: u32) {
        self.catalog.retry.max_attempts = attempts;
        self.warp_retry.max_attempts = attempts;
    }

    /// Concurrency actually used by the worker pool.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent.max(1)
    }
}

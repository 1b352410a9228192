//! Fetch HRDEM elevation rasters for an area of interest.
//!
//! The pipeline runs four stages:
//!
//! 1. [`normalize`]: AOI geometry to a search bbox (EPSG:4326) and a clip
//!    bbox (EPSG:3979 by default)
//! 2. catalog search through an injected [`stac_client::CatalogClient`]
//! 3. [`assets`]: select hrefs matching `<product>\.<format>$` and rewrite
//!    them for remote reads
//! 4. [`warp`]: reproject and clip each selected asset into the output
//!    directory, concurrently and independently
//!
//! [`ElevationFetcher`] wires the stages together.

pub mod assets;
pub mod config;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod pipeline;
pub mod product;
pub mod report;
pub mod warp;

pub use assets::{output_filename, AssetSelector, RemoteReadAdapter, WarpJob};
pub use config::FetchConfig;
pub use error::FetchError;
pub use geometry::{Aoi, AoiError, Geometry};
pub use normalize::{NormalizedBounds, Normalizer};
pub use pipeline::{ElevationFetcher, FetchPlan, FetchRequest};
pub use product::{Product, ProductError, RasterFormat};
pub use report::{AssetFailure, FailureReason, FetchReport, WrittenRaster};
pub use warp::{GdalWarp, RasterWarper, WarpError, WarpTarget};

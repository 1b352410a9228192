//! Client for STAC API item search (`POST /search`).
//!
//! The pipeline talks to the catalog through the [`CatalogClient`] trait so
//! tests and alternative catalogs can be injected. [`StacClient`] is the
//! HTTP implementation: it follows `next` links until every page matching
//! the bounding box has been read, retrying transient failures.

mod client;
mod error;
mod types;

pub use client::{asset_hrefs, CatalogClient, StacClient, StacClientConfig, DEFAULT_COLLECTION, DEFAULT_STAC_URL};
pub use error::CatalogError;
pub use types::{Asset, Item, ItemCollection, Link, SearchRequest};

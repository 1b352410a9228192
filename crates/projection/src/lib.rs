//! Coordinate reference system transformations.
//!
//! Projection math is delegated to `proj4rs` (pure Rust); definitions come
//! from the EPSG database bundled by `crs-definitions`.

mod transformer;

pub use transformer::{ProjectionError, Transformer};

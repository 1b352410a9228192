//! Common types shared across the hrdem-fetch workspace.

pub mod bbox;
pub mod crs;
pub mod retry;

pub use bbox::{BboxParseError, BoundingBox};
pub use crs::{CrsCode, CrsParseError};
pub use retry::{RetryError, RetryPolicy, Transient};

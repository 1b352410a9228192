//! Shared test utilities for the hrdem-fetch workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for tests that need the GDAL command-line tools
//! - Synthetic raster creation and inspection through GDAL
//! - Common AOI and STAC response fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_gdal_tools, fixtures};
//! ```

pub mod fixtures;
pub mod gdal;
pub mod paths;

// Re-export commonly used items at the crate root
pub use gdal::*;
pub use paths::*;

/// Macro to skip a test if any of the named GDAL tools is not installed.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_gdal_tools;
///
/// #[tokio::test]
/// async fn test_warp_clip() {
///     require_gdal_tools!("gdalwarp", "gdal_create", "gdalinfo");
///     // Test code invoking gdalwarp...
/// }
/// ```
///
/// If a tool is not found, the test prints a skip message and returns early.
#[macro_export]
macro_rules! require_gdal_tools {
    ($($tool:expr),+ $(,)?) => {{
        $(
            if $crate::find_gdal_tool($tool).is_none() {
                eprintln!(
                    "SKIPPED: GDAL tool '{}' not found. Install GDAL or set GDAL_BIN_DIR.",
                    $tool
                );
                return;
            }
        )+
    }};
}

/// Macro to skip a test if the required file is not found.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_parse_aoi_file() {
///     let path = require_test_file!("elevation", "ottawa.geojson");
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($crate_name:expr, $name:expr) => {{
        match $crate::find_crate_test_file($crate_name, $name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found in {} testdata.",
                    $name, $crate_name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f64, 1.0_f64, 0.001_f64);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of coordinate pairs.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_coords_approx_eq_passes() {
        assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
    }
}

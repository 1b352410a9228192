//! Elevation product and file format selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for unrecognized product or format names.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    #[error("Unknown elevation product '{0}' (expected dsm or dtm)")]
    UnknownProduct(String),

    #[error("Unknown raster format '{0}' (expected tif or vrt)")]
    UnknownFormat(String),
}

/// Elevation model published per HRDEM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Digital surface model (first returns, includes canopy and buildings)
    Dsm,
    /// Digital terrain model (bare earth)
    Dtm,
}

impl Product {
    /// Token used in asset filenames.
    pub fn token(&self) -> &'static str {
        match self {
            Product::Dsm => "dsm",
            Product::Dtm => "dtm",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Product {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dsm" | "digital-surface-model" => Ok(Product::Dsm),
            "dtm" | "digital-terrain-model" => Ok(Product::Dtm),
            _ => Err(ProductError::UnknownProduct(s.to_string())),
        }
    }
}

/// File format of the published asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Cloud-optimized GeoTIFF
    Tif,
    /// GDAL virtual raster mosaic
    Vrt,
}

impl RasterFormat {
    /// File extension as it appears in asset hrefs.
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Tif => "tif",
            RasterFormat::Vrt => "vrt",
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for RasterFormat {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tif" | "tiff" | "geotiff" => Ok(RasterFormat::Tif),
            "vrt" | "virtual-raster" => Ok(RasterFormat::Vrt),
            _ => Err(ProductError::UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product() {
        assert_eq!("dsm".parse::<Product>().unwrap(), Product::Dsm);
        assert_eq!(" DTM ".parse::<Product>().unwrap(), Product::Dtm);
        assert_eq!(
            "digital-terrain-model".parse::<Product>().unwrap(),
            Product::Dtm
        );
        assert_eq!(
            "chm".parse::<Product>(),
            Err(ProductError::UnknownProduct("chm".to_string()))
        );
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("tif".parse::<RasterFormat>().unwrap(), RasterFormat::Tif);
        assert_eq!("GeoTIFF".parse::<RasterFormat>().unwrap(), RasterFormat::Tif);
        assert_eq!("vrt".parse::<RasterFormat>().unwrap(), RasterFormat::Vrt);
        assert!(matches!(
            "png".parse::<RasterFormat>(),
            Err(ProductError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_display_matches_filename_tokens() {
        assert_eq!(Product::Dsm.to_string(), "dsm");
        assert_eq!(RasterFormat::Vrt.to_string(), "vrt");
    }
}

//! Coordinate Reference System codes and definition lookup.
//!
//! CRS definitions (PROJ strings and WKT) come from the `crs-definitions`
//! EPSG database, so any code in that database can be used as an AOI CRS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An EPSG coordinate reference system code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrsCode(u16);

impl CrsCode {
    /// WGS84 geographic (lon/lat in degrees). STAC searches use this CRS.
    pub const WGS84: CrsCode = CrsCode(4326);

    /// NAD83(CSRS) / Canada Atlas Lambert (meters). Default clip CRS.
    pub const CANADA_ATLAS_LAMBERT: CrsCode = CrsCode(3979);

    pub const fn from_epsg(code: u16) -> Self {
        CrsCode(code)
    }

    pub fn epsg(&self) -> u16 {
        self.0
    }

    /// PROJ string for this code.
    pub fn proj4(&self) -> Result<&'static str, CrsParseError> {
        crs_definitions::from_code(self.0)
            .map(|def| def.proj4)
            .ok_or(CrsParseError::UnknownCode(self.0))
    }

    /// OGC WKT definition for this code (what gdalwarp receives as `-t_srs`).
    pub fn wkt(&self) -> Result<&'static str, CrsParseError> {
        crs_definitions::from_code(self.0)
            .map(|def| def.wkt)
            .ok_or(CrsParseError::UnknownCode(self.0))
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        match self.proj4() {
            Ok(proj) => proj.contains("+proj=longlat"),
            // Unknown codes in the geographic 4000 block are still treated as degrees
            Err(_) => (4000..5000).contains(&self.0),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Parse a CRS identifier.
///
/// Accepts formats like:
/// - "EPSG:4326", "epsg:4326" or a bare "4326"
/// - "CRS:84", "OGC:CRS84" (lon/lat WGS84)
/// - "urn:ogc:def:crs:EPSG::3979", "urn:ogc:def:crs:EPSG:6.6:3979"
/// - "urn:ogc:def:crs:OGC:1.3:CRS84"
/// - "http://www.opengis.net/def/crs/EPSG/0/3979"
impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();

        if upper == "CRS:84" || upper.ends_with("CRS84") {
            return Ok(CrsCode::WGS84);
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            upper.rsplit(':').next().unwrap_or_default()
        } else if upper.contains("/DEF/CRS/EPSG/") {
            upper.rsplit('/').next().unwrap_or_default()
        } else {
            upper.as_str()
        };

        code.parse::<u16>()
            .map(CrsCode)
            .map_err(|_| CrsParseError::Unrecognized(trimmed.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CrsParseError {
    #[error("Unrecognized CRS identifier: {0}")]
    Unrecognized(String),

    #[error("EPSG:{0} is not in the CRS definitions database")]
    UnknownCode(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!("EPSG:4326".parse::<CrsCode>().unwrap(), CrsCode::WGS84);
        assert_eq!("epsg:3979".parse::<CrsCode>().unwrap(), CrsCode::CANADA_ATLAS_LAMBERT);
        assert_eq!("CRS:84".parse::<CrsCode>().unwrap(), CrsCode::WGS84);
        assert_eq!("3979".parse::<CrsCode>().unwrap().epsg(), 3979);
        assert_eq!(
            "urn:ogc:def:crs:EPSG::2950".parse::<CrsCode>().unwrap().epsg(),
            2950
        );
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<CrsCode>().unwrap(),
            CrsCode::WGS84
        );
        assert_eq!(
            "http://www.opengis.net/def/crs/EPSG/0/3979"
                .parse::<CrsCode>()
                .unwrap(),
            CrsCode::CANADA_ATLAS_LAMBERT
        );
        assert!("EPSG:abc".parse::<CrsCode>().is_err());
        assert!("EPSG:999999".parse::<CrsCode>().is_err());
    }

    #[test]
    fn test_definitions_available() {
        assert!(CrsCode::WGS84.proj4().unwrap().contains("longlat"));
        assert!(CrsCode::CANADA_ATLAS_LAMBERT.proj4().unwrap().contains("lcc"));
        assert!(!CrsCode::CANADA_ATLAS_LAMBERT.wkt().unwrap().is_empty());
    }

    #[test]
    fn test_is_geographic() {
        assert!(CrsCode::WGS84.is_geographic());
        assert!(!CrsCode::CANADA_ATLAS_LAMBERT.is_geographic());
    }

    #[test]
    fn test_unknown_code() {
        let code = CrsCode::from_epsg(1);
        assert_eq!(code.wkt(), Err(CrsParseError::UnknownCode(1)));
    }
}

//! GeoJSON AOI parsing.
//!
//! Accepts geometry objects, `Feature` and `FeatureCollection`. RFC 7946
//! GeoJSON is always WGS84, but older files may declare a CRS with the
//! legacy `crs` member, which is honoured when present.
//!
//! See: <https://datatracker.ietf.org/doc/html/rfc7946>

use hrdem_common::CrsCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{Geometry, Position};

/// Errors that can occur when parsing GeoJSON.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON position needs at least 2 numbers, got {0}")]
    InvalidPosition(usize),

    #[error("Unsupported GeoJSON crs member: {0}")]
    InvalidCrs(String),
}

/// A parsed GeoJSON geometry and its declared CRS, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGeoJson {
    pub geometry: Geometry,
    pub crs: Option<CrsCode>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonObject {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonObject>,
    },
    Feature {
        #[serde(default)]
        geometry: Option<Box<GeoJsonObject>>,
    },
    FeatureCollection {
        features: Vec<GeoJsonObject>,
    },
}

/// Parse a GeoJSON document into a single geometry.
///
/// A `FeatureCollection` becomes a [`Geometry::Collection`] of its feature
/// geometries; features with a null geometry contribute nothing.
pub fn parse_geojson(text: &str) -> Result<ParsedGeoJson, GeoJsonError> {
    let value: Value = serde_json::from_str(text)?;
    let crs = match value.get("crs") {
        Some(member) if !member.is_null() => Some(parse_crs_member(member)?),
        _ => None,
    };

    let object: GeoJsonObject = serde_json::from_value(value)?;
    let geometry = convert(object)?.unwrap_or(Geometry::Collection(Vec::new()));

    Ok(ParsedGeoJson { geometry, crs })
}

/// Legacy (GeoJSON 2008) `crs` member, named or EPSG-coded.
fn parse_crs_member(member: &Value) -> Result<CrsCode, GeoJsonError> {
    let properties = member.get("properties");
    let name = properties.and_then(|p| p.get("name")).and_then(Value::as_str);
    let code = properties.and_then(|p| p.get("code")).and_then(Value::as_u64);

    match (name, code) {
        (Some(name), _) => name
            .parse()
            .map_err(|_| GeoJsonError::InvalidCrs(name.to_string())),
        (None, Some(code)) => u16::try_from(code)
            .map(CrsCode::from_epsg)
            .map_err(|_| GeoJsonError::InvalidCrs(code.to_string())),
        (None, None) => Err(GeoJsonError::InvalidCrs(member.to_string())),
    }
}

fn position(coords: &[f64]) -> Result<Position, GeoJsonError> {
    match coords {
        [x, y, ..] => Ok((*x, *y)),
        _ => Err(GeoJsonError::InvalidPosition(coords.len())),
    }
}

fn positions(coords: &[Vec<f64>]) -> Result<Vec<Position>, GeoJsonError> {
    coords.iter().map(|c| position(c)).collect()
}

fn rings(coords: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Position>>, GeoJsonError> {
    coords.iter().map(|ring| positions(ring)).collect()
}

fn convert(object: GeoJsonObject) -> Result<Option<Geometry>, GeoJsonError> {
    let geometry = match object {
        GeoJsonObject::Point { coordinates } => Geometry::Point(position(&coordinates)?),
        GeoJsonObject::MultiPoint { coordinates } => Geometry::MultiPoint(positions(&coordinates)?),
        GeoJsonObject::LineString { coordinates } => Geometry::LineString(positions(&coordinates)?),
        GeoJsonObject::MultiLineString { coordinates } => {
            Geometry::MultiLineString(rings(&coordinates)?)
        }
        GeoJsonObject::Polygon { coordinates } => Geometry::Polygon(rings(&coordinates)?),
        GeoJsonObject::MultiPolygon { coordinates } => Geometry::MultiPolygon(
            coordinates
                .iter()
                .map(|polygon| rings(polygon))
                .collect::<Result<_, _>>()?,
        ),
        GeoJsonObject::GeometryCollection { geometries } => Geometry::Collection(collect(geometries)?),
        GeoJsonObject::Feature { geometry } => match geometry {
            Some(object) => return convert(*object),
            None => return Ok(None),
        },
        GeoJsonObject::FeatureCollection { features } => Geometry::Collection(collect(features)?),
    };
    Ok(Some(geometry))
}

fn collect(objects: Vec<GeoJsonObject>) -> Result<Vec<Geometry>, GeoJsonError> {
    let mut members = Vec::with_capacity(objects.len());
    for object in objects {
        if let Some(geometry) = convert(object)? {
            members.push(geometry);
        }
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon() {
        let parsed = parse_geojson(
            r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}"#,
        )
        .unwrap();
        assert!(parsed.crs.is_none());
        assert_eq!(
            parsed.geometry,
            Geometry::Polygon(vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]])
        );
    }

    #[test]
    fn test_parse_feature_drops_elevation() {
        let parsed = parse_geojson(
            r#"{"type": "Feature", "id": 7, "properties": {"name": "site"},
                "geometry": {"type": "Point", "coordinates": [-75.7, 45.4, 70.0]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.geometry, Geometry::Point((-75.7, 45.4)));
    }

    #[test]
    fn test_parse_feature_collection() {
        let parsed = parse_geojson(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 2]}},
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [3, 4]]}}
            ]}"#,
        )
        .unwrap();
        let Geometry::Collection(members) = parsed.geometry else {
            panic!("expected collection");
        };
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_null_geometry_feature_is_empty() {
        let parsed =
            parse_geojson(r#"{"type": "Feature", "properties": {}, "geometry": null}"#).unwrap();
        assert!(parsed.geometry.is_empty());
    }

    #[test]
    fn test_legacy_named_crs() {
        let parsed = parse_geojson(
            r#"{"type": "Point", "coordinates": [1500000, -170000],
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3979"}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.crs, Some(CrsCode::CANADA_ATLAS_LAMBERT));
    }

    #[test]
    fn test_legacy_crs84() {
        let parsed = parse_geojson(
            r#"{"type": "Point", "coordinates": [1, 2],
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:OGC:1.3:CRS84"}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.crs, Some(CrsCode::WGS84));
    }

    #[test]
    fn test_legacy_epsg_code_crs() {
        let parsed = parse_geojson(
            r#"{"type": "Point", "coordinates": [1, 2],
                "crs": {"type": "EPSG", "properties": {"code": 3979}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.crs, Some(CrsCode::CANADA_ATLAS_LAMBERT));
    }

    #[test]
    fn test_invalid_crs_member() {
        let result = parse_geojson(
            r#"{"type": "Point", "coordinates": [1, 2], "crs": {"type": "link", "properties": {"href": "x"}}}"#,
        );
        assert!(matches!(result, Err(GeoJsonError::InvalidCrs(_))));
    }

    #[test]
    fn test_short_position() {
        let result = parse_geojson(r#"{"type": "Point", "coordinates": [1]}"#);
        assert!(matches!(result, Err(GeoJsonError::InvalidPosition(1))));
    }

    #[test]
    fn test_unknown_type() {
        let result = parse_geojson(r#"{"type": "Circle", "coordinates": [1, 2]}"#);
        assert!(matches!(result, Err(GeoJsonError::Json(_))));
    }
}

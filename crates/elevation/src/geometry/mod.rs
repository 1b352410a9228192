//! Area-of-interest geometry model.
//!
//! An [`Aoi`] is a [`Geometry`] tagged with the CRS its coordinates are in.
//! Positions are `(x, y)` with easting/longitude first; any Z or M ordinates
//! in the input are dropped while parsing.

mod geojson;
mod wkt;

pub use self::geojson::{parse_geojson, GeoJsonError, ParsedGeoJson};
pub use self::wkt::{parse_wkt, ParsedWkt, WktError};

use hrdem_common::{BoundingBox, CrsCode};
use projection::{ProjectionError, Transformer};
use thiserror::Error;

/// A coordinate pair, easting/longitude first.
pub type Position = (f64, f64);

/// Errors describing why an AOI cannot be used.
#[derive(Debug, Error)]
pub enum AoiError {
    #[error(transparent)]
    Wkt(#[from] WktError),

    #[error(transparent)]
    GeoJson(#[from] GeoJsonError),

    #[error("WKT geometry has no CRS; add an SRID=<code>; prefix or pass a CRS")]
    MissingCrs,

    #[error("Geometry is empty")]
    Empty,

    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("{kind} needs at least {min} positions, got {found}")]
    TooFewPositions {
        kind: &'static str,
        min: usize,
        found: usize,
    },

    #[error("Polygon ring is not closed: first {first:?}, last {last:?}")]
    UnclosedRing { first: Position, last: Position },

    #[error("Coordinate ({x}, {y}) is outside the valid range of {crs} (lon [-180, 180], lat [-90, 90])")]
    OutOfRange { x: f64, y: f64, crs: CrsCode },
}

/// Simple-features geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// Rings; the first is the exterior, the rest are holes.
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Geometry type name as used in WKT.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::MultiPoint(_) => "MULTIPOINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::MultiLineString(_) => "MULTILINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
            Geometry::Collection(_) => "GEOMETRYCOLLECTION",
        }
    }

    /// Visit every vertex.
    pub fn for_each_position(&self, f: &mut impl FnMut(Position)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(points) | Geometry::LineString(points) => {
                points.iter().copied().for_each(f)
            }
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().copied().for_each(f)
            }
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().copied().for_each(f)
            }
            Geometry::Collection(members) => {
                for member in members {
                    member.for_each_position(f);
                }
            }
        }
    }

    /// Number of vertices.
    pub fn position_count(&self) -> usize {
        let mut count = 0;
        self.for_each_position(&mut |_| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.position_count() == 0
    }

    /// Axis-aligned bounds of all vertices, `None` when empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut points = Vec::new();
        self.for_each_position(&mut |p| points.push(p));
        BoundingBox::from_points(points)
    }

    /// Apply a fallible function to every vertex, keeping the structure.
    pub fn try_map_positions<E>(
        &self,
        f: &mut impl FnMut(Position) -> Result<Position, E>,
    ) -> Result<Geometry, E> {
        fn map_all<E>(
            points: &[Position],
            f: &mut impl FnMut(Position) -> Result<Position, E>,
        ) -> Result<Vec<Position>, E> {
            points.iter().map(|p| f(*p)).collect()
        }

        Ok(match self {
            Geometry::Point(p) => Geometry::Point(f(*p)?),
            Geometry::MultiPoint(points) => Geometry::MultiPoint(map_all(points, f)?),
            Geometry::LineString(points) => Geometry::LineString(map_all(points, f)?),
            Geometry::MultiLineString(lines) => Geometry::MultiLineString(
                lines
                    .iter()
                    .map(|line| map_all(line, f))
                    .collect::<Result<_, _>>()?,
            ),
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| map_all(ring, f))
                    .collect::<Result<_, _>>()?,
            ),
            Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| map_all(ring, f))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            Geometry::Collection(members) => Geometry::Collection(
                members
                    .iter()
                    .map(|member| member.try_map_positions(f))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Insert `points_per_edge` evenly spaced points into every line segment
    /// and ring edge. Points are left as they are.
    pub fn densify(&self, points_per_edge: usize) -> Geometry {
        if points_per_edge == 0 {
            return self.clone();
        }

        let path = |points: &Vec<Position>| densify_path(points, points_per_edge);
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => self.clone(),
            Geometry::LineString(points) => Geometry::LineString(path(points)),
            Geometry::MultiLineString(lines) => {
                Geometry::MultiLineString(lines.iter().map(path).collect())
            }
            Geometry::Polygon(rings) => Geometry::Polygon(rings.iter().map(path).collect()),
            Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| rings.iter().map(path).collect())
                    .collect(),
            ),
            Geometry::Collection(members) => Geometry::Collection(
                members
                    .iter()
                    .map(|member| member.densify(points_per_edge))
                    .collect(),
            ),
        }
    }

    /// Check structural validity. When `crs` is geographic, coordinates must
    /// also be valid longitudes and latitudes.
    pub fn validate(&self, crs: CrsCode) -> Result<(), AoiError> {
        if self.is_empty() {
            return Err(AoiError::Empty);
        }

        let geographic = crs.is_geographic();
        let mut first_error = None;
        self.for_each_position(&mut |(x, y)| {
            if first_error.is_some() {
                return;
            }
            if !x.is_finite() || !y.is_finite() {
                first_error = Some(AoiError::NonFinite { x, y });
            } else if geographic && (!(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y)) {
                first_error = Some(AoiError::OutOfRange { x, y, crs });
            }
        });
        if let Some(err) = first_error {
            return Err(err);
        }

        self.validate_structure()
    }

    fn validate_structure(&self) -> Result<(), AoiError> {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(()),
            Geometry::LineString(points) => check_line(points),
            Geometry::MultiLineString(lines) => lines.iter().try_for_each(|l| check_line(l)),
            Geometry::Polygon(rings) => rings.iter().try_for_each(|r| check_ring(r)),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .try_for_each(|r| check_ring(r)),
            Geometry::Collection(members) => members
                .iter()
                .filter(|member| !member.is_empty())
                .try_for_each(Geometry::validate_structure),
        }
    }
}

fn densify_path(points: &[Position], points_per_edge: usize) -> Vec<Position> {
    let Some(last) = points.last() else {
        return Vec::new();
    };

    let segments = points_per_edge + 1;
    let mut out = Vec::with_capacity((points.len() - 1) * segments + 1);
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        for i in 0..segments {
            let t = i as f64 / segments as f64;
            out.push((x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
        }
    }
    out.push(*last);
    out
}

fn check_line(points: &[Position]) -> Result<(), AoiError> {
    if points.len() < 2 {
        return Err(AoiError::TooFewPositions {
            kind: "LineString",
            min: 2,
            found: points.len(),
        });
    }
    Ok(())
}

fn check_ring(ring: &[Position]) -> Result<(), AoiError> {
    if ring.len() < 4 {
        return Err(AoiError::TooFewPositions {
            kind: "Polygon ring",
            min: 4,
            found: ring.len(),
        });
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    if first != last {
        return Err(AoiError::UnclosedRing { first, last });
    }
    Ok(())
}

/// An area of interest: geometry plus the CRS of its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    geometry: Geometry,
    crs: CrsCode,
}

impl Aoi {
    pub fn new(geometry: Geometry, crs: CrsCode) -> Self {
        Self { geometry, crs }
    }

    /// Rectangle AOI covering `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, crs: CrsCode) -> Self {
        let ring = vec![
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            (bbox.min_x, bbox.max_y),
            (bbox.min_x, bbox.min_y),
        ];
        Self::new(Geometry::Polygon(vec![ring]), crs)
    }

    /// Parse WKT or EWKT. `crs` overrides an EWKT SRID; one of the two is
    /// required.
    pub fn from_wkt(text: &str, crs: Option<CrsCode>) -> Result<Self, AoiError> {
        let parsed = parse_wkt(text)?;
        let crs = crs.or(parsed.srid).ok_or(AoiError::MissingCrs)?;
        Ok(Self::new(parsed.geometry, crs))
    }

    /// Parse a GeoJSON geometry, Feature or FeatureCollection. `crs`
    /// overrides a legacy `crs` member; without either, EPSG:4326 is used.
    pub fn from_geojson(text: &str, crs: Option<CrsCode>) -> Result<Self, AoiError> {
        let parsed = parse_geojson(text)?;
        let crs = crs.or(parsed.crs).unwrap_or(CrsCode::WGS84);
        Ok(Self::new(parsed.geometry, crs))
    }

    /// Parse either representation, choosing GeoJSON when the text is a JSON
    /// object.
    pub fn from_text(text: &str, crs: Option<CrsCode>) -> Result<Self, AoiError> {
        if text.trim_start().starts_with('{') {
            Self::from_geojson(text, crs)
        } else {
            Self::from_wkt(text, crs)
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry.bounds()
    }

    pub fn validate(&self) -> Result<(), AoiError> {
        self.geometry.validate(self.crs)
    }

    /// Same AOI with edges densified in its own CRS.
    pub fn densify(&self, points_per_edge: usize) -> Aoi {
        Aoi::new(self.geometry.densify(points_per_edge), self.crs)
    }

    /// Reproject every vertex into `to`.
    pub fn reproject(&self, to: CrsCode) -> Result<Aoi, ProjectionError> {
        if to == self.crs {
            return Ok(self.clone());
        }
        let transformer = Transformer::new(self.crs, to)?;
        let geometry = self
            .geometry
            .try_map_positions(&mut |(x, y)| transformer.transform(x, y))?;
        Ok(Aoi::new(geometry, to))
    }
}

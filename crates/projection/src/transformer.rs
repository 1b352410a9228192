//! Point transforms between two EPSG coordinate systems.

use hrdem_common::{CrsCode, CrsParseError};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// Errors raised while building or applying a transform.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error(transparent)]
    UnknownCrs(#[from] CrsParseError),

    #[error("Invalid projection definition for {crs}: {message}")]
    InvalidDefinition { crs: CrsCode, message: String },

    #[error("Transform from {from} to {to} failed at ({x}, {y}): {message}")]
    TransformFailed {
        from: CrsCode,
        to: CrsCode,
        x: f64,
        y: f64,
        message: String,
    },

    #[error("Transform from {from} to {to} produced a non-finite coordinate for ({x}, {y})")]
    NonFinite {
        from: CrsCode,
        to: CrsCode,
        x: f64,
        y: f64,
    },
}

/// A reusable transform from one CRS to another.
///
/// Geographic coordinates are taken and returned in degrees, longitude first.
pub struct Transformer {
    from: CrsCode,
    to: CrsCode,
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl Transformer {
    /// Build a transformer between two EPSG codes.
    pub fn new(from: CrsCode, to: CrsCode) -> Result<Self, ProjectionError> {
        Ok(Self {
            from,
            to,
            source: Self::build_proj(from)?,
            target: Self::build_proj(to)?,
            source_is_geographic: from.is_geographic(),
            target_is_geographic: to.is_geographic(),
        })
    }

    fn build_proj(crs: CrsCode) -> Result<Proj, ProjectionError> {
        let definition = crs.proj4()?;
        Proj::from_proj_string(definition).map_err(|e| ProjectionError::InvalidDefinition {
            crs,
            message: format!("{e:?}"),
        })
    }

    pub fn source_crs(&self) -> CrsCode {
        self.from
    }

    pub fn target_crs(&self) -> CrsCode {
        self.to
    }

    /// Transform a single coordinate.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if self.from == self.to {
            return Ok((x, y));
        }

        // proj4rs uses radians for geographic coordinates
        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source, &self.target, &mut point).map_err(|e| {
            ProjectionError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                message: format!("{e:?}"),
            }
        })?;

        let (out_x, out_y) = if self.target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::NonFinite {
                from: self.from,
                to: self.to,
                x,
                y,
            });
        }

        Ok((out_x, out_y))
    }
}

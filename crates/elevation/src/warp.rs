//! Raster warping: reproject and clip one source into one output file.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use hrdem_common::{BoundingBox, CrsCode, CrsParseError, Transient};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Target grid for a warp: CRS and extent.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpTarget {
    pub crs: CrsCode,
    /// WKT of `crs`, passed to the warper as the target SRS
    pub crs_wkt: String,
    /// Output extent in `crs` units
    pub bounds: BoundingBox,
}

impl WarpTarget {
    pub fn new(crs: CrsCode, bounds: BoundingBox) -> Result<Self, CrsParseError> {
        Ok(Self {
            crs,
            crs_wkt: crs.wkt()?.to_string(),
            bounds,
        })
    }
}

/// Errors from a single warp.
#[derive(Debug, Error)]
pub enum WarpError {
    /// The warp program could not be started.
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The warp program ran and failed.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

impl Transient for WarpError {
    fn is_transient(&self) -> bool {
        // Remote reads fail intermittently; a missing binary does not recover
        matches!(self, WarpError::Failed { .. })
    }
}

/// Something that can warp a raster into a target grid.
#[async_trait]
pub trait RasterWarper: Send + Sync {
    /// Reproject `source` to `target.crs`, clip to `target.bounds` and write
    /// `destination`, replacing any existing file.
    async fn warp(
        &self,
        source: &str,
        destination: &Path,
        target: &WarpTarget,
    ) -> Result<(), WarpError>;
}

/// Warper that runs the `gdalwarp` command-line tool.
#[derive(Debug, Clone)]
pub struct GdalWarp {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Default for GdalWarp {
    fn default() -> Self {
        Self::new("gdalwarp")
    }
}

impl GdalWarp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Extra options inserted before the source and destination, such as
    /// `-r bilinear` or `-co COMPRESS=DEFLATE`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list for one warp.
    pub fn command_args(&self, source: &str, destination: &Path, target: &WarpTarget) -> Vec<OsString> {
        let b = &target.bounds;
        let mut args: Vec<OsString> = vec![
            "-overwrite".into(),
            "-t_srs".into(),
            target.crs_wkt.clone().into(),
            "-te".into(),
        ];
        args.extend([b.min_x, b.min_y, b.max_x, b.max_y].map(|v| OsString::from(v.to_string())));
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(source.into());
        args.push(destination.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl RasterWarper for GdalWarp {
    #[instrument(skip(self, target), fields(program = %self.program.display(), destination = %destination.display()))]
    async fn warp(
        &self,
        source: &str,
        destination: &Path,
        target: &WarpTarget,
    ) -> Result<(), WarpError> {
        let args = self.command_args(source, destination, target);
        debug!(args = ?args, "Running gdalwarp");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| WarpError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            remove_partial_output(destination).await;
            return Err(WarpError::Failed {
                program: self.program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Delete whatever a failed or interrupted warp left at `destination`.
pub(crate) async fn remove_partial_output(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => debug!(path = %destination.display(), "Removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %destination.display(),
            error = %e,
            "Failed to remove partial output"
        ),
    }
}

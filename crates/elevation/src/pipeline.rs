//! The fetch pipeline: normalize, search, select, warp.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use hrdem_common::RetryError;
use projection::ProjectionError;
use stac_client::{asset_hrefs, CatalogClient, StacClient};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::assets::{plan_jobs, AssetSelector, RemoteReadAdapter, WarpJob};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::geometry::Aoi;
use crate::normalize::{NormalizedBounds, Normalizer};
use crate::product::{Product, RasterFormat};
use crate::report::{AssetFailure, FailureReason, FetchReport, WrittenRaster};
use crate::warp::{remove_partial_output, GdalWarp, RasterWarper, WarpTarget};

/// What to fetch and where to put it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub aoi: Aoi,
    pub output_dir: PathBuf,
    pub product: Product,
    pub format: RasterFormat,
}

impl FetchRequest {
    pub fn new(
        aoi: Aoi,
        output_dir: impl Into<PathBuf>,
        product: Product,
        format: RasterFormat,
    ) -> Self {
        Self {
            aoi,
            output_dir: output_dir.into(),
            product,
            format,
        }
    }

    /// Build a request from textual product and format names.
    pub fn parse(
        aoi: Aoi,
        output_dir: impl Into<PathBuf>,
        product: &str,
        format: &str,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(aoi, output_dir, product.parse()?, format.parse()?))
    }
}

/// Everything decided before warping starts.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Canonical output directory; created by [`ElevationFetcher::fetch`]
    pub output_dir: PathBuf,
    pub bounds: NormalizedBounds,
    /// Selected catalog hrefs, in catalog order
    pub selected: Vec<String>,
    pub jobs: Vec<WarpJob>,
    /// Selected assets skipped because their filename was taken
    pub collisions: Vec<AssetFailure>,
}

/// Fetches HRDEM rasters for an AOI.
pub struct ElevationFetcher {
    catalog: Arc<dyn CatalogClient>,
    warper: Arc<dyn RasterWarper>,
    adapter: RemoteReadAdapter,
    normalizer: Normalizer,
    config: FetchConfig,
}

impl ElevationFetcher {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        warper: Arc<dyn RasterWarper>,
        adapter: RemoteReadAdapter,
        config: FetchConfig,
    ) -> Self {
        let normalizer = Normalizer::new(config.clip_crs, config.densify_points, config.min_clip_size);
        Self {
            catalog,
            warper,
            adapter,
            normalizer,
            config,
        }
    }

    /// Fetcher backed by the STAC API and the gdalwarp executable named in
    /// `config`.
    pub fn from_config(config: FetchConfig, adapter: RemoteReadAdapter) -> Result<Self, FetchError> {
        let catalog = StacClient::new(config.catalog.clone())?;
        let warper = GdalWarp::new(config.gdalwarp.clone());
        Ok(Self::new(Arc::new(catalog), Arc::new(warper), adapter, config))
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `product` rasters in `format` covering `aoi` into `output_dir`.
    pub async fn fetch_elevation(
        &self,
        aoi: Aoi,
        output_dir: impl AsRef<Path>,
        product: &str,
        format: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, FetchError> {
        let request = FetchRequest::parse(aoi, output_dir.as_ref(), product, format)?;
        self.fetch(&request, cancel).await
    }

    /// Run every stage up to, but not including, warping. Nothing is
    /// written to disk.
    #[instrument(skip(self, request, cancel), fields(product = %request.product, format = %request.format))]
    pub async fn plan(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchPlan, FetchError> {
        let selector = AssetSelector::new(request.product, request.format)?;
        let bounds = self.normalizer.normalize(&request.aoi)?;
        let output_dir = resolve_output_dir(&request.output_dir).await?;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        info!(bbox = %bounds.search, "Searching catalog");
        let items = self.catalog.search(&bounds.search, cancel).await?;
        if items.is_empty() {
            return Err(FetchError::EmptyResult { bbox: bounds.search });
        }

        let hrefs = asset_hrefs(&items);
        let selected = selector.select(hrefs.iter().map(String::as_str));
        if selected.is_empty() {
            return Err(FetchError::NoMatchingAsset {
                pattern: selector.pattern().to_string(),
                candidates: hrefs.len(),
            });
        }

        let (jobs, collisions) = plan_jobs(&selected, &self.adapter, &output_dir);
        info!(
            items = items.len(),
            assets = hrefs.len(),
            selected = selected.len(),
            jobs = jobs.len(),
            "Assets selected"
        );

        Ok(FetchPlan {
            output_dir,
            bounds,
            selected,
            jobs,
            collisions,
        })
    }

    /// Plan, then warp every job. Per-asset failures are collected in the
    /// report; only pre-warp failures are errors. Cancellation once warping
    /// has started yields a report with `cancelled` set.
    #[instrument(skip(self, request, cancel), fields(product = %request.product, format = %request.format))]
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, FetchError> {
        let plan = self.plan(request, cancel).await?;
        let target = WarpTarget::new(plan.bounds.clip_crs, plan.bounds.clip)
            .map_err(ProjectionError::from)?;

        tokio::fs::create_dir_all(&plan.output_dir)
            .await
            .map_err(|source| FetchError::Filesystem {
                path: plan.output_dir.clone(),
                source,
            })?;

        let target = &target;
        let outcomes = stream::iter(plan.jobs)
            .map(|job| async move { self.run_job(job, target, cancel).await })
            .buffer_unordered(self.config.effective_concurrency())
            .collect::<Vec<_>>()
            .await;

        let cancelled = cancel.is_cancelled();
        let mut failures = plan.collisions;
        let mut written = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(raster) => written.push(raster),
                Err(failure) => failures.push(failure),
            }
        }

        if cancelled {
            warn!(
                output_dir = %plan.output_dir.display(),
                success = written.len(),
                failed = failures.len(),
                "Fetch cancelled during warping"
            );
        } else {
            info!(
                output_dir = %plan.output_dir.display(),
                success = written.len(),
                failed = failures.len(),
                "Fetch complete"
            );
        }

        Ok(FetchReport {
            output_dir: plan.output_dir,
            bounds: plan.bounds,
            written,
            failures,
            cancelled,
        })
    }

    async fn run_job(
        &self,
        job: WarpJob,
        target: &WarpTarget,
        cancel: &CancellationToken,
    ) -> Result<WrittenRaster, AssetFailure> {
        let warper = &self.warper;
        let source = job.source.as_str();
        let destination = job.destination.as_path();
        let label = format!("warp {}", job.filename);
        let started = AtomicBool::new(false);
        let started = &started;

        let result = self
            .config
            .warp_retry
            .run(cancel, &label, |attempt| async move {
                started.store(true, Ordering::Relaxed);
                warper
                    .warp(source, destination, target)
                    .await
                    .map(|()| attempt)
            })
            .await;

        match result {
            Ok(attempts) => {
                info!(
                    filename = %job.filename,
                    path = %job.destination.display(),
                    attempts = attempts,
                    "Raster written"
                );
                Ok(WrittenRaster {
                    href: job.href,
                    path: job.destination,
                    attempts,
                })
            }
            Err(RetryError::Cancelled) => {
                // An interrupted warp may have left a truncated raster
                if started.load(Ordering::Relaxed) {
                    remove_partial_output(&job.destination).await;
                }
                Err(AssetFailure {
                    href: job.href,
                    filename: job.filename,
                    reason: FailureReason::Cancelled,
                })
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(
                    href = %job.href,
                    filename = %job.filename,
                    attempts = attempts,
                    error = %last,
                    "Warp failed"
                );
                Err(AssetFailure {
                    href: job.href,
                    filename: job.filename,
                    reason: FailureReason::Warp {
                        message: last.to_string(),
                    },
                })
            }
        }
    }
}

/// Absolute, canonical form of `dir` without creating anything. The deepest
/// existing ancestor is canonicalized and the missing components appended.
async fn resolve_output_dir(dir: &Path) -> Result<PathBuf, FetchError> {
    let filesystem = |source| FetchError::Filesystem {
        path: dir.to_path_buf(),
        source,
    };

    let mut base = dir.to_path_buf();
    let mut missing = Vec::new();
    let existing = loop {
        match tokio::fs::canonicalize(&base).await {
            Ok(path) => break path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let Some(name) = base.file_name() else {
                    return Err(filesystem(e));
                };
                missing.push(name.to_os_string());
                base = match base.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
            }
            Err(e) => return Err(filesystem(e)),
        }
    };

    let metadata = tokio::fs::metadata(&existing).await.map_err(filesystem)?;
    if !metadata.is_dir() {
        return Err(filesystem(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is not a directory", existing.display()),
        )));
    }

    Ok(missing.into_iter().rev().fold(existing, |path, name| path.join(name)))
}

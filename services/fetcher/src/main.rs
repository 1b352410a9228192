//! HRDEM elevation tile fetcher.
//!
//! Clips and reprojects HRDEM lidar DSM/DTM rasters to an area of interest:
//! - Reads the AOI from a GeoJSON or WKT file
//! - Searches the STAC catalog for intersecting items
//! - Warps every matching asset into the output directory with gdalwarp
//!
//! Exit status is 0 when every selected asset was written, 2 when some
//! assets failed and 1 on any fatal error or cancellation. A fetch
//! cancelled while warping still prints its partial report.

mod summary;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use elevation::{Aoi, ElevationFetcher, FetchConfig, FetchRequest, RemoteReadAdapter};
use hrdem_common::CrsCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hrdem-fetch")]
#[command(about = "Fetch HRDEM elevation rasters clipped to an area of interest")]
struct Args {
    /// AOI file (GeoJSON or WKT/EWKT)
    #[arg(long)]
    aoi: PathBuf,

    /// CRS of the AOI coordinates (e.g. EPSG:3979); overrides the file's own
    #[arg(long)]
    aoi_crs: Option<CrsCode>,

    /// Directory for the output rasters (created if missing, except on a dry run)
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Elevation product: dsm or dtm
    #[arg(long)]
    product: String,

    /// Raster format: tif or vrt
    #[arg(long)]
    format: String,

    /// STAC API root [default: https://datacube.services.geo.ca/stac/api]
    #[arg(long, env = "HRDEM_STAC_URL")]
    stac_url: Option<String>,

    /// STAC collection [default: hrdem-lidar]
    #[arg(long, env = "HRDEM_COLLECTION")]
    collection: Option<String>,

    /// Maximum concurrent warps [default: 4]
    #[arg(long, env = "HRDEM_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,

    /// Attempts per catalog request and per warp [default: 3]
    #[arg(long, env = "HRDEM_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Cancel the whole fetch after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// gdalwarp executable [default: gdalwarp]
    #[arg(long, env = "GDALWARP_BIN")]
    gdalwarp: Option<PathBuf>,

    /// Read assets through plain /vsicurl/ without URL signing
    #[arg(long)]
    no_url_signing: bool,

    /// Search and select assets, print the plan, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Environment configuration with command-line overrides applied.
    fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig::from_env();

        if let Some(url) = &self.stac_url {
            config.catalog.base_url = url.clone();
        }
        if let Some(collection) = &self.collection {
            config.catalog.collection = collection.clone();
        }
        if let Some(n) = self.max_concurrent {
            config.max_concurrent = n;
        }
        if let Some(n) = self.max_retries {
            config.set_max_attempts(n);
        }
        if let Some(path) = &self.gdalwarp {
            config.gdalwarp = path.clone();
        }

        config
    }

    fn adapter(&self) -> RemoteReadAdapter {
        RemoteReadAdapter::VsiCurl {
            signing: !self.no_url_signing,
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr; stdout carries the JSON summary
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

/// Cancel `cancel` on Ctrl+C or when the optional deadline passes.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("Received interrupt, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });

    if let Some(timeout) = timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    warn!(timeout_secs = timeout.as_secs(), "Deadline reached, cancelling");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let text = tokio::fs::read_to_string(&args.aoi)
        .await
        .with_context(|| format!("Failed to read AOI file {}", args.aoi.display()))?;
    let aoi = Aoi::from_text(&text, args.aoi_crs)
        .with_context(|| format!("Invalid AOI in {}", args.aoi.display()))?;

    let config = args.fetch_config();
    info!(
        stac_url = %config.catalog.base_url,
        collection = %config.catalog.collection,
        product = %args.product,
        format = %args.format,
        output_dir = %args.output_dir.display(),
        "Starting HRDEM fetch"
    );

    let fetcher = ElevationFetcher::from_config(config, args.adapter())
        .context("Failed to initialize catalog client")?;

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.timeout_secs.map(Duration::from_secs));

    if args.dry_run {
        let request = FetchRequest::parse(aoi, &args.output_dir, &args.product, &args.format)?;
        let plan = fetcher.plan(&request, &cancel).await?;
        summary::print_plan(&plan)?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = fetcher
        .fetch_elevation(aoi, &args.output_dir, &args.product, &args.format, &cancel)
        .await?;
    summary::print_report(&report)?;

    if report.cancelled {
        error!(
            failed = report.failed(),
            succeeded = report.succeeded(),
            "Fetch cancelled before all assets were written"
        );
        Ok(ExitCode::FAILURE)
    } else if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            failed = report.failed(),
            succeeded = report.succeeded(),
            "Some assets were not written"
        );
        Ok(ExitCode::from(2))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fetch failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["hrdem-fetch", "--aoi", "aoi.geojson", "--product", "dtm", "--format", "tif"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.log_format, LogFormat::Text);
        assert!(args.aoi_crs.is_none());
        assert!(!args.dry_run);
        assert_eq!(args.adapter(), RemoteReadAdapter::VsiCurl { signing: true });
    }

    #[test]
    fn test_overrides_reach_config() {
        let args = parse(&[
            "--stac-url",
            "http://localhost:8080/stac",
            "--max-concurrent",
            "2",
            "--max-retries",
            "7",
            "--gdalwarp",
            "/opt/gdal/bin/gdalwarp",
            "--aoi-crs",
            "EPSG:3979",
            "--no-url-signing",
        ]);
        let config = args.fetch_config();

        assert_eq!(config.catalog.base_url, "http://localhost:8080/stac");
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.catalog.retry.max_attempts, 7);
        assert_eq!(config.warp_retry.max_attempts, 7);
        assert_eq!(config.gdalwarp, PathBuf::from("/opt/gdal/bin/gdalwarp"));
        assert_eq!(args.aoi_crs, Some(CrsCode::CANADA_ATLAS_LAMBERT));
        assert_eq!(args.adapter(), RemoteReadAdapter::VsiCurl { signing: false });
    }

    #[test]
    fn test_required_flags() {
        assert!(Args::try_parse_from(["hrdem-fetch", "--product", "dtm", "--format", "tif"]).is_err());
        assert!(Args::try_parse_from(["hrdem-fetch", "--aoi", "a.wkt", "--format", "tif"]).is_err());
    }

    #[test]
    fn test_bad_crs_rejected_by_parser() {
        let argv = ["hrdem-fetch", "--aoi", "a", "--product", "dtm", "--format", "tif", "--aoi-crs", "nonsense"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}

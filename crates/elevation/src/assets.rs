//! Asset selection, remote-read rewriting and warp job planning.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::warn;

use crate::error::FetchError;
use crate::product::{Product, RasterFormat};
use crate::report::{AssetFailure, FailureReason};

/// How GDAL should open a remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteReadAdapter {
    /// Stream through GDAL's `/vsicurl/` virtual filesystem. With `signing`,
    /// GDAL signs the URL (`pc_url_signing=yes`) before each read.
    VsiCurl { signing: bool },
    /// Use the href as-is (local files).
    Passthrough,
}

impl Default for RemoteReadAdapter {
    fn default() -> Self {
        RemoteReadAdapter::VsiCurl { signing: true }
    }
}

impl RemoteReadAdapter {
    /// The GDAL dataset name for `href`.
    pub fn rewrite(&self, href: &str) -> String {
        match self {
            RemoteReadAdapter::VsiCurl { signing: true } => {
                let encoded: String = url::form_urlencoded::byte_serialize(href.as_bytes()).collect();
                format!("/vsicurl?pc_url_signing=yes&url={encoded}")
            }
            RemoteReadAdapter::VsiCurl { signing: false } => format!("/vsicurl/{href}"),
            RemoteReadAdapter::Passthrough => href.to_string(),
        }
    }
}

/// The href without its query string or fragment.
fn strip_query(href: &str) -> &str {
    let end = href.find(|c: char| c == '?' || c == '#').unwrap_or(href.len());
    &href[..end]
}

/// Output filename for an asset: everything after the last `/` of the href,
/// ignoring any query string or fragment.
pub fn output_filename(href: &str) -> &str {
    let path = strip_query(href);
    path.rsplit('/').next().unwrap_or(path)
}

/// Matches asset hrefs against `<product>\.<format>$`.
#[derive(Debug, Clone)]
pub struct AssetSelector {
    pattern: Regex,
}

impl AssetSelector {
    pub fn new(product: Product, format: RasterFormat) -> Result<Self, FetchError> {
        let pattern = format!(
            r"{}\.{}$",
            regex::escape(product.token()),
            regex::escape(format.extension())
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| FetchError::InvalidParameter(format!("asset pattern: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, href: &str) -> bool {
        self.pattern.is_match(strip_query(href))
    }

    /// Matching hrefs in input order, each href once.
    pub fn select<'a>(&self, hrefs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        hrefs
            .into_iter()
            .filter(|href| self.matches(href))
            .filter(|href| seen.insert(*href))
            .map(str::to_string)
            .collect()
    }
}

/// One warp to run: a selected asset and where its output goes.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpJob {
    /// Catalog href
    pub href: String,
    /// Dataset name handed to the warper
    pub source: String,
    pub filename: String,
    pub destination: PathBuf,
}

/// Build one job per selected href. An href whose filename is already
/// claimed by an earlier one becomes a collision failure instead of a job.
pub fn plan_jobs(
    selected: &[String],
    adapter: &RemoteReadAdapter,
    output_dir: &Path,
) -> (Vec<WarpJob>, Vec<AssetFailure>) {
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    let mut jobs = Vec::with_capacity(selected.len());
    let mut collisions = Vec::new();

    for href in selected {
        let filename = output_filename(href);
        if let Some(existing) = claimed.get(filename) {
            warn!(
                href = %href,
                existing_href = %existing,
                filename = %filename,
                "Output filename collision, skipping asset"
            );
            collisions.push(AssetFailure {
                href: href.clone(),
                filename: filename.to_string(),
                reason: FailureReason::FilenameCollision {
                    existing_href: existing.to_string(),
                },
            });
            continue;
        }
        claimed.insert(filename, href);

        jobs.push(WarpJob {
            href: href.clone(),
            source: adapter.rewrite(href),
            filename: filename.to_string(),
            destination: output_dir.join(filename),
        });
    }

    (jobs, collisions)
}

//! HTTP catalog client with next-link pagination.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use hrdem_common::{BoundingBox, RetryError, RetryPolicy};
use reqwest::header;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::CatalogError;
use crate::types::{Item, ItemCollection, Link, SearchRequest};

/// Public STAC API of the Canada Centre for Mapping and Earth Observation.
pub const DEFAULT_STAC_URL: &str = "https://datacube.services.geo.ca/stac/api";

/// Collection holding the HRDEM lidar tiles.
pub const DEFAULT_COLLECTION: &str = "hrdem-lidar";

/// A catalog that can list the items intersecting a geographic bounding box.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Return every item of the configured collection intersecting `bbox`
    /// (EPSG:4326), across all result pages.
    async fn search(
        &self,
        bbox: &BoundingBox,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, CatalogError>;
}

/// Configuration for [`StacClient`].
#[derive(Debug, Clone)]
pub struct StacClientConfig {
    /// API root; `/search` is appended.
    pub base_url: String,
    pub collection: String,
    /// Page size requested from the server.
    pub page_limit: u32,
    /// Hard stop on the number of pages followed.
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for StacClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STAC_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            page_limit: 100,
            max_pages: 1000,
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// One page request: the first search is a POST, later pages follow links.
#[derive(Debug, Clone, PartialEq)]
enum PageRequest {
    Get { url: String },
    Post { url: String, body: Value },
}

impl PageRequest {
    fn url(&self) -> &str {
        match self {
            PageRequest::Get { url } | PageRequest::Post { url, .. } => url,
        }
    }

    /// Identity used for loop detection.
    fn key(&self) -> String {
        match self {
            PageRequest::Get { url } => format!("GET {url}"),
            PageRequest::Post { url, body } => format!("POST {url} {body}"),
        }
    }

    /// Build the request for a `next` link of the page returned by `self`.
    /// Relative hrefs resolve against this request's URL.
    fn follow(&self, link: &Link) -> Self {
        let url = resolve_href(self.url(), &link.href);
        let previous = match self {
            PageRequest::Post { body, .. } => Some(body),
            PageRequest::Get { .. } => None,
        };

        let is_post = match link.method.as_deref() {
            Some(method) => method.eq_ignore_ascii_case("POST"),
            None => link.body.is_some(),
        };

        if !is_post {
            return PageRequest::Get { url };
        }

        let body = match (&link.body, previous) {
            (Some(body), Some(previous)) if link.merge => merge_bodies(previous, body),
            (Some(body), _) => body.clone(),
            (None, previous) => previous.cloned().unwrap_or(Value::Null),
        };

        PageRequest::Post { url, body }
    }
}

fn resolve_href(base: &str, href: &str) -> String {
    reqwest::Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Shallow merge of `overlay` members onto `base`.
fn merge_bodies(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

/// STAC API client over HTTP.
pub struct StacClient {
    client: reqwest::Client,
    config: StacClientConfig,
    search_url: String,
}

impl StacClient {
    /// Create a new client.
    pub fn new(config: StacClientConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("hrdem-fetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::Client)?;

        let search_url = format!("{}/search", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            config,
            search_url,
        })
    }

    pub fn config(&self) -> &StacClientConfig {
        &self.config
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemCollection, CatalogError> {
        let url = request.url();
        let builder = match request {
            PageRequest::Get { url } => self.client.get(url),
            PageRequest::Post { url, body } => self.client.post(url).json(body),
        };

        let response = builder
            .header(header::ACCEPT, "application/geo+json, application/json")
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_str(&text).map_err(|e| CatalogError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogClient for StacClient {
    #[instrument(skip(self, bbox, cancel), fields(collection = %self.config.collection, bbox = %bbox))]
    async fn search(
        &self,
        bbox: &BoundingBox,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, CatalogError> {
        let search = SearchRequest {
            collections: vec![self.config.collection.clone()],
            bbox: bbox.to_array(),
            limit: Some(self.config.page_limit),
        };
        let body = serde_json::to_value(&search).map_err(|e| CatalogError::Decode {
            url: self.search_url.clone(),
            message: e.to_string(),
        })?;

        let mut next = Some(PageRequest::Post {
            url: self.search_url.clone(),
            body,
        });
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut pages = 0usize;

        while let Some(request) = next.take() {
            if pages >= self.config.max_pages {
                warn!(
                    max_pages = self.config.max_pages,
                    items = items.len(),
                    "Page limit reached, stopping pagination"
                );
                break;
            }

            if !seen.insert(request.key()) {
                warn!(url = %request.url(), "Next link repeats an earlier request, stopping pagination");
                break;
            }

            let page = self
                .config
                .retry
                .run(cancel, "stac search", |_| self.fetch_page(&request))
                .await
                .map_err(|e| match e {
                    RetryError::Cancelled => CatalogError::Cancelled,
                    RetryError::Exhausted { last, .. } => last,
                })?;
            pages += 1;

            debug!(
                page = pages,
                count = page.features.len(),
                matched = ?page.number_matched,
                "Fetched search page"
            );

            if page.features.is_empty() {
                break;
            }

            next = page.next_link().map(|link| request.follow(link));

            items.extend(page.features);
        }

        info!(items = items.len(), pages = pages, "Catalog search complete");
        Ok(items)
    }
}

/// All asset hrefs of `items`, in item order then asset-key order.
pub fn asset_hrefs(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.assets.values().map(|asset| asset.href.clone()))
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

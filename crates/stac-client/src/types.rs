//! STAC API search types.
//!
//! Only the members the pipeline reads are modelled; unknown members are
//! ignored on deserialization.
//!
//! See: <https://github.com/radiantearth/stac-api-spec/tree/main/item-search>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `POST /search` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    /// Collections to search.
    pub collections: Vec<String>,

    /// Bounding box as [west, south, east, north] in EPSG:4326.
    pub bbox: [f64; 4],

    /// Page size hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A page of search results (a GeoJSON FeatureCollection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ItemCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Items on this page.
    #[serde(default)]
    pub features: Vec<Item>,

    /// Page links, including `next` when more results exist.
    #[serde(default)]
    pub links: Vec<Link>,

    /// Total matches reported by the server, if any.
    #[serde(rename = "numberMatched", default, skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,
}

impl ItemCollection {
    /// The `rel="next"` link, if the server reports another page.
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == "next")
    }
}

/// A STAC item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Item identifier.
    pub id: String,

    /// Collection the item belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Item footprint bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Assets keyed by name (ordered for deterministic iteration).
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
}

/// A downloadable asset of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub href: String,

    /// Media type, e.g. `image/tiff; application=geotiff`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// A link object; `next` links may carry a POST body to send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub rel: String,

    pub href: String,

    /// HTTP method for the link (GET when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Body to send when `method` is POST.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Merge `body` onto the previous request body instead of replacing it.
    #[serde(default)]
    pub merge: bool,
}

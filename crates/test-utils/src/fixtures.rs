//! Common test fixtures for hrdem-fetch tests.
//!
//! AOIs are small areas around Ottawa, inside HRDEM lidar coverage.

/// Areas of interest in the text forms accepted by the pipeline.
pub mod aoi {
    /// Bounds of the Ottawa polygons below, in EPSG:4326.
    pub const OTTAWA_BBOX: (f64, f64, f64, f64) = (-75.72, 45.40, -75.68, 45.43);

    pub const OTTAWA_POLYGON_WKT: &str =
        "POLYGON((-75.72 45.40, -75.68 45.40, -75.68 45.43, -75.72 45.43, -75.72 45.40))";

    pub const OTTAWA_POLYGON_EWKT: &str =
        "SRID=4326;POLYGON((-75.72 45.40, -75.68 45.40, -75.68 45.43, -75.72 45.43, -75.72 45.40))";

    pub const OTTAWA_POINT_WKT: &str = "POINT(-75.6972 45.4215)";

    pub const OTTAWA_POLYGON_GEOJSON: &str = r#"{
        "type": "Polygon",
        "coordinates": [[[-75.72, 45.40], [-75.68, 45.40], [-75.68, 45.43], [-75.72, 45.43], [-75.72, 45.40]]]
    }"#;

    pub const OTTAWA_FEATURE_COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "west"},
                "geometry": {"type": "Point", "coordinates": [-75.72, 45.40]}
            },
            {
                "type": "Feature",
                "properties": {"name": "east"},
                "geometry": {"type": "LineString", "coordinates": [[-75.70, 45.41], [-75.68, 45.43]]}
            }
        ]
    }"#;

    /// A 2 km square in EPSG:3979 (Canada Atlas Lambert), near Ottawa.
    pub const LAMBERT_SQUARE_EWKT: &str = "SRID=3979;POLYGON((1505000 -172000, 1507000 -172000, 1507000 -170000, 1505000 -170000, 1505000 -172000))";
}

/// Builders for STAC API JSON documents.
pub mod stac {
    use serde_json::{json, Value};

    /// Asset host used by the fixture items.
    pub const ASSET_BASE: &str =
        "https://datacube-prod-data-public.s3.ca-central-1.amazonaws.com/store/elevation/hrdem/hrdem-lidar";

    /// A STAC item with the given `(key, href)` assets.
    pub fn item(id: &str, assets: &[(&str, &str)]) -> Value {
        let assets: serde_json::Map<String, Value> = assets
            .iter()
            .map(|(key, href)| {
                (
                    key.to_string(),
                    json!({"href": href, "type": "image/tiff; application=geotiff", "roles": ["data"]}),
                )
            })
            .collect();

        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "collection": "hrdem-lidar",
            "geometry": null,
            "bbox": [-75.75, 45.38, -75.65, 45.45],
            "properties": {"datetime": "2020-06-01T00:00:00Z"},
            "assets": assets,
            "links": []
        })
    }

    /// An HRDEM-like item carrying DSM and DTM GeoTIFFs plus hillshades.
    pub fn hrdem_item(id: &str) -> Value {
        let dsm = format!("{ASSET_BASE}/{id}/{id}-1m-dsm.tif");
        let dtm = format!("{ASSET_BASE}/{id}/{id}-1m-dtm.tif");
        let hillshade = format!("{ASSET_BASE}/{id}/{id}-1m-dtm-hillshade.tif");
        item(id, &[("dsm", &dsm), ("dtm", &dtm), ("hillshade-dtm", &hillshade)])
    }

    /// A page of search results.
    pub fn item_collection(items: Vec<Value>, next: Option<Value>) -> Value {
        let mut links = vec![json!({"rel": "root", "href": "https://example.com/stac/api"})];
        links.extend(next);
        json!({
            "type": "FeatureCollection",
            "features": items,
            "links": links
        })
    }

    /// A `next` link to be followed with POST.
    pub fn post_next_link(href: &str, body: Value, merge: bool) -> Value {
        json!({"rel": "next", "href": href, "method": "POST", "body": body, "merge": merge})
    }

    /// A `next` link to be followed with GET.
    pub fn get_next_link(href: &str) -> Value {
        json!({"rel": "next", "href": href, "type": "application/geo+json"})
    }
}

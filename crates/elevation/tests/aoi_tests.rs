//! AOI files on disk through parsing and normalization.

use elevation::{Aoi, AoiError, Geometry, Normalizer};
use hrdem_common::CrsCode;
use test_utils::{assert_approx_eq, require_test_file};

fn read(name: &str) -> Option<String> {
    test_utils::find_crate_test_file("elevation", name).map(|path| std::fs::read_to_string(path).unwrap())
}

#[test]
fn test_geojson_feature_collection_file() {
    let path = require_test_file!("elevation", "ottawa.geojson");
    let text = std::fs::read_to_string(path).unwrap();

    let aoi = Aoi::from_text(&text, None).unwrap();
    assert_eq!(aoi.crs(), CrsCode::WGS84);
    assert!(matches!(aoi.geometry(), Geometry::Collection(members) if members.len() == 2));

    let bounds = aoi.bounds().unwrap();
    assert_approx_eq!(bounds.min_x, -75.7050, 1e-9);
    assert_approx_eq!(bounds.min_y, 45.3960, 1e-9);
    assert_approx_eq!(bounds.max_x, -75.6960, 1e-9);
    assert_approx_eq!(bounds.max_y, 45.4260, 1e-9);
}

#[test]
fn test_ewkt_multipolygon_file() {
    let path = require_test_file!("elevation", "ottawa.wkt");
    let text = std::fs::read_to_string(path).unwrap();

    let aoi = Aoi::from_text(&text, None).unwrap();
    assert_eq!(aoi.crs(), CrsCode::WGS84);
    assert!(matches!(aoi.geometry(), Geometry::MultiPolygon(polygons) if polygons.len() == 2));
    aoi.validate().unwrap();
}

#[test]
fn test_files_agree_on_extent() {
    let (Some(geojson), Some(wkt)) = (read("ottawa.geojson"), read("ottawa.wkt")) else {
        eprintln!("SKIPPED: AOI test files not found in elevation testdata.");
        return;
    };

    let normalizer = Normalizer::default();
    let from_geojson = normalizer.normalize(&Aoi::from_text(&geojson, None).unwrap()).unwrap();
    let from_wkt = normalizer.normalize(&Aoi::from_text(&wkt, None).unwrap()).unwrap();

    assert_approx_eq!(from_geojson.search.min_x, from_wkt.search.min_x, 1e-3);
    assert_approx_eq!(from_geojson.search.max_y, from_wkt.search.max_y, 1e-3);
    assert!(from_geojson.clip.intersects(&from_wkt.clip));
}

#[test]
fn test_plain_wkt_needs_crs() {
    let path = require_test_file!("elevation", "lambert_square.wkt");
    let text = std::fs::read_to_string(path).unwrap();

    assert!(matches!(Aoi::from_text(&text, None), Err(AoiError::MissingCrs)));

    let aoi = Aoi::from_text(&text, Some(CrsCode::CANADA_ATLAS_LAMBERT)).unwrap();
    let bounds = Normalizer::default().normalize(&aoi).unwrap();
    assert_approx_eq!(bounds.clip.width(), 2_000.0, 1e-6);
    assert_approx_eq!(bounds.clip.height(), 2_000.0, 1e-6);
}

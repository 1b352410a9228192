//! Helpers that drive the GDAL command-line tools from tests.
//!
//! Tests that need real rasters create them with `gdal_create` and inspect
//! results with `gdalinfo -json`. Both are optional on developer machines, so
//! callers guard with [`require_gdal_tools!`](crate::require_gdal_tools).

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

/// Locate a GDAL tool, checking `GDAL_BIN_DIR` first and then `PATH`.
pub fn find_gdal_tool(name: &str) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(dir) = std::env::var_os("GDAL_BIN_DIR") {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(path) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&path));
    }

    dirs.into_iter().find_map(|dir| {
        [name.to_string(), format!("{name}.exe")]
            .into_iter()
            .map(|file| dir.join(file))
            .find(|candidate| candidate.is_file())
    })
}

/// Summary of a raster as reported by `gdalinfo -json`.
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: u64,
    pub height: u64,
    /// (min_x, min_y, max_x, max_y) in the raster's CRS
    pub bounds: (f64, f64, f64, f64),
    /// WKT of the raster's coordinate system (empty if none)
    pub srs_wkt: String,
    pub band_count: usize,
}

/// Create a single-band Float32 GeoTIFF filled with `value`.
///
/// `bounds` is (min_x, min_y, max_x, max_y) in `EPSG:<epsg>` units.
pub fn create_test_raster(
    path: &Path,
    epsg: u16,
    bounds: (f64, f64, f64, f64),
    size: (u32, u32),
    value: f64,
) -> io::Result<()> {
    let tool = find_gdal_tool("gdal_create")
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "gdal_create not found"))?;
    let (min_x, min_y, max_x, max_y) = bounds;

    let output = Command::new(tool)
        .args(["-of", "GTiff", "-ot", "Float32", "-bands", "1"])
        .arg("-outsize")
        .arg(size.0.to_string())
        .arg(size.1.to_string())
        .arg("-burn")
        .arg(value.to_string())
        .arg("-a_srs")
        .arg(format!("EPSG:{epsg}"))
        .arg("-a_ullr")
        .args([min_x, max_y, max_x, min_y].map(|v| v.to_string()))
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "gdal_create failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        ));
    }
    Ok(())
}

/// Inspect a raster with `gdalinfo -json`.
pub fn raster_info(path: &Path) -> io::Result<RasterInfo> {
    let tool = find_gdal_tool("gdalinfo")
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "gdalinfo not found"))?;

    let output = Command::new(tool).arg("-json").arg(path).output()?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("gdalinfo failed: {}", String::from_utf8_lossy(&output.stderr)),
        ));
    }

    let json: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    parse_gdalinfo(&json)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unexpected gdalinfo output"))
}

fn parse_gdalinfo(json: &Value) -> Option<RasterInfo> {
    let size = json.get("size")?.as_array()?;
    let corners = json.get("cornerCoordinates")?;
    let point = |key: &str| -> Option<(f64, f64)> {
        let pair = corners.get(key)?.as_array()?;
        Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
    };
    let (min_x, min_y) = point("lowerLeft")?;
    let (max_x, max_y) = point("upperRight")?;

    Some(RasterInfo {
        width: size.first()?.as_u64()?,
        height: size.get(1)?.as_u64()?,
        bounds: (min_x, min_y, max_x, max_y),
        srs_wkt: json
            .pointer("/coordinateSystem/wkt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        band_count: json
            .get("bands")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_gdalinfo_output() {
        let json = json!({
            "size": [100, 50],
            "coordinateSystem": {"wkt": "PROJCRS[\"NAD83(CSRS) / Canada Atlas Lambert\"]"},
            "cornerCoordinates": {
                "upperLeft": [1000.0, 2000.0],
                "lowerLeft": [1000.0, 1500.0],
                "lowerRight": [2000.0, 1500.0],
                "upperRight": [2000.0, 2000.0]
            },
            "bands": [{"band": 1, "type": "Float32"}]
        });

        let info = parse_gdalinfo(&json).unwrap();
        assert_eq!((info.width, info.height), (100, 50));
        assert_eq!(info.bounds, (1000.0, 1500.0, 2000.0, 2000.0));
        assert!(info.srs_wkt.contains("Canada Atlas Lambert"));
        assert_eq!(info.band_count, 1);
    }

    #[test]
    fn test_parse_gdalinfo_missing_corners() {
        assert!(parse_gdalinfo(&json!({"size": [1, 1]})).is_none());
    }

    #[test]
    fn test_missing_tool_not_found() {
        assert!(find_gdal_tool("definitely-not-a-gdal-tool").is_none());
    }
}

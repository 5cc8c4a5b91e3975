use std::path::PathBuf;

use fieldmap_shared::{LatLng, MapOptions};
use fieldmap_shared::gis::{DEFAULT_CENTER, DEFAULT_READY_TIMEOUT_MS, DEFAULT_ZOOM};

pub const SERVER_PORT: u16 = 3000;
pub const STATIC_DIR: &str = "client/dist";
pub const DEFAULT_DATA_DIR: &str = "data/layers";
pub const MAX_ZOOM: f64 = 22.0;

pub fn server_port() -> u16 {
    std::env::var("FIELDMAP_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(SERVER_PORT)
}

/// Directory served under `/layers/`.
pub fn data_dir() -> PathBuf {
    std::env::var("FIELDMAP_DATA_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Optional JSON file replacing the built-in layer list.
pub fn layers_file() -> Option<PathBuf> {
    std::env::var("FIELDMAP_LAYERS_FILE")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn maps_api_key() -> String {
    std::env::var("FIELDMAP_MAPS_API_KEY")
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

pub fn ready_timeout_ms() -> u64 {
    std::env::var("FIELDMAP_READY_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_READY_TIMEOUT_MS)
}

/// `FIELDMAP_MAP_CENTER` as `"lat,lng"`.
pub fn map_center() -> LatLng {
    std::env::var("FIELDMAP_MAP_CENTER")
        .ok()
        .and_then(|value| parse_lat_lng(&value))
        .unwrap_or(DEFAULT_CENTER)
}

pub fn map_zoom() -> f64 {
    std::env::var("FIELDMAP_MAP_ZOOM")
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| (0.0..=MAX_ZOOM).contains(value))
        .unwrap_or(DEFAULT_ZOOM)
}

pub fn map_options() -> MapOptions {
    MapOptions {
        center: map_center(),
        zoom: map_zoom(),
        ready_timeout_ms: ready_timeout_ms(),
        ..MapOptions::default()
    }
}

fn parse_lat_lng(raw: &str) -> Option<LatLng> {
    let (lat, lng) = raw.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng))
        .then_some(LatLng { lat, lng })
}

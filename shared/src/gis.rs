use serde::{Deserialize, Serialize};

use crate::layer::{LayerConfiguration, default_layers};

pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ZOOM: f64 = 13.0;
/// Fallback map center when nothing is configured.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 52.3676,
    lng: 4.9041,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Build from a GeoJSON position (`[lng, lat, ...]`).
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTypeId {
    #[default]
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
}

impl MapTypeId {
    pub const fn as_str(self) -> &'static str {
        match self {
            MapTypeId::Roadmap => "roadmap",
            MapTypeId::Satellite => "satellite",
            MapTypeId::Hybrid => "hybrid",
            MapTypeId::Terrain => "terrain",
        }
    }
}

/// Widget construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub map_type: MapTypeId,
    pub hide_points_of_interest: bool,
    /// Budget for the first idle event before readiness is forced.
    pub ready_timeout_ms: u64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            map_type: MapTypeId::Roadmap,
            hide_points_of_interest: true,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        }
    }
}

/// Everything the client needs to boot the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GisConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub map: MapOptions,
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerConfiguration>,
}

use serde::{Deserialize, Serialize};

/// Every map layer the console knows about. The set is fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    Pipelines,
    Valves,
    Hydrants,
    Nodes,
    Zones,
    Gateways,
}

impl LayerType {
    pub const ALL: [LayerType; 6] = [
        LayerType::Pipelines,
        LayerType::Valves,
        LayerType::Hydrants,
        LayerType::Nodes,
        LayerType::Zones,
        LayerType::Gateways,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            LayerType::Pipelines => "pipelines",
            LayerType::Valves => "valves",
            LayerType::Hydrants => "hydrants",
            LayerType::Nodes => "nodes",
            LayerType::Zones => "zones",
            LayerType::Gateways => "gateways",
        }
    }

    /// Only the node layer gets text-label overlays (node/number captions).
    pub const fn carries_labels(self) -> bool {
        matches!(self, LayerType::Nodes)
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one toggleable map layer.
///
/// `layer_type` is the identity. Only `enabled` changes at runtime, and only
/// through [`crate::LayerStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfiguration {
    pub layer_type: LayerType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub z_index: i32,
    pub data_url: String,
}

fn default_enabled() -> bool {
    true
}

impl LayerConfiguration {
    fn preset(
        layer_type: LayerType,
        name: &str,
        description: &str,
        enabled: bool,
        color: &str,
        z_index: i32,
    ) -> Self {
        Self {
            layer_type,
            name: name.to_string(),
            description: description.to_string(),
            enabled,
            color: color.to_string(),
            stroke_color: None,
            stroke_width: None,
            fill_opacity: None,
            icon: None,
            z_index,
            data_url: format!("/layers/{}.geojson", layer_type.as_str()),
        }
    }
}

/// Layer list the console starts with when no catalog overrides it.
pub fn default_layers() -> Vec<LayerConfiguration> {
    let mut zones = LayerConfiguration::preset(
        LayerType::Zones,
        "Pressure zones",
        "Supply and pressure zone boundaries",
        false,
        "#8e24aa",
        1,
    );
    zones.stroke_color = Some("#6a1b9a".to_string());
    zones.fill_opacity = Some(0.2);

    let mut pipelines = LayerConfiguration::preset(
        LayerType::Pipelines,
        "Pipelines",
        "Distribution and transmission mains",
        true,
        "#1e88e5",
        2,
    );
    pipelines.stroke_width = Some(3.0);

    let valves = LayerConfiguration::preset(
        LayerType::Valves,
        "Valves",
        "Isolation and control valves with telemetry",
        true,
        "#e53935",
        3,
    );

    let hydrants = LayerConfiguration::preset(
        LayerType::Hydrants,
        "Hydrants",
        "Fire hydrants",
        false,
        "#fb8c00",
        4,
    );

    let nodes = LayerConfiguration::preset(
        LayerType::Nodes,
        "Network nodes",
        "Junction nodes with node numbers",
        true,
        "#43a047",
        5,
    );

    let mut gateways = LayerConfiguration::preset(
        LayerType::Gateways,
        "Gateways",
        "LoRaWAN and GSM gateways",
        true,
        "#3949ab",
        6,
    );
    gateways.icon = Some("/icons/gateway.svg".to_string());

    vec![zones, pipelines, valves, hydrants, nodes, gateways]
}

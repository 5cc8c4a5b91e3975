use std::path::{Path, PathBuf};

use fieldmap_shared::colors::parse_hex_color;
use fieldmap_shared::{LayerConfiguration, LayerStore, StoreError, default_layers};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid layer catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("layer catalog is empty")]
    Empty,
    #[error(transparent)]
    Duplicate(#[from] StoreError),
    #[error("layer {layer}: {field} {value:?} is not a #rrggbb colour")]
    InvalidColor {
        layer: String,
        field: &'static str,
        value: String,
    },
    #[error("layer {layer}: fill opacity {value} is outside 0..=1")]
    InvalidOpacity { layer: String, value: f64 },
    #[error("layer {layer}: stroke width {value} must be positive")]
    InvalidStrokeWidth { layer: String, value: f64 },
    #[error("layer {layer}: data_url is empty")]
    MissingDataUrl { layer: String },
}

fn is_rrggbb(value: &str) -> bool {
    value.starts_with('#') && parse_hex_color(value).is_some()
}

fn validate_layer(layer: &LayerConfiguration) -> Result<(), CatalogError> {
    let name = layer.layer_type.to_string();
    let colors = [("color", Some(&layer.color)), ("stroke_color", layer.stroke_color.as_ref())];
    for (field, value) in colors {
        if let Some(value) = value
            && !is_rrggbb(value)
        {
            return Err(CatalogError::InvalidColor {
                layer: name,
                field,
                value: value.clone(),
            });
        }
    }
    if let Some(value) = layer.fill_opacity
        && !(0.0..=1.0).contains(&value)
    {
        return Err(CatalogError::InvalidOpacity { layer: name, value });
    }
    if let Some(value) = layer.stroke_width
        && !(value.is_finite() && value > 0.0)
    {
        return Err(CatalogError::InvalidStrokeWidth { layer: name, value });
    }
    if layer.data_url.trim().is_empty() {
        return Err(CatalogError::MissingDataUrl { layer: name });
    }
    Ok(())
}

/// Parse and validate a catalog document. The result is sorted by z-index.
pub fn parse_catalog(json: &str) -> Result<Vec<LayerConfiguration>, CatalogError> {
    let layers: Vec<LayerConfiguration> = serde_json::from_str(json)?;
    if layers.is_empty() {
        return Err(CatalogError::Empty);
    }
    for layer in &layers {
        validate_layer(layer)?;
    }
    let store = LayerStore::new(layers)?;
    Ok(store.layers().to_vec())
}

pub fn read_catalog(path: &Path) -> Result<Vec<LayerConfiguration>, CatalogError> {
    let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&json)
}

/// The layer list to serve: the file at `path` if it is valid, else the defaults.
pub fn load_catalog(path: Option<&Path>) -> Vec<LayerConfiguration> {
    let Some(path) = path else {
        return default_layers();
    };
    match read_catalog(path) {
        Ok(layers) => {
            info!(path = %path.display(), count = layers.len(), "Loaded layer catalog");
            layers
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Layer catalog rejected; using built-in layers");
            default_layers()
        }
    }
}

use geojson::{Geometry, Value};
use serde::Serialize;

use crate::layer::LayerConfiguration;

pub const DEFAULT_LINE_STROKE_WIDTH: f64 = 3.0;
pub const DEFAULT_POLYGON_FILL_OPACITY: f64 = 0.25;
pub const DEFAULT_STROKE_WEIGHT: f64 = 2.0;
pub const BASE_FILL_OPACITY: f64 = 0.3;
pub const POINT_MARKER_SCALE: f64 = 7.0;
const POINT_OUTLINE_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    Other,
}

impl GeometryKind {
    pub fn of(geometry: Option<&Geometry>) -> Self {
        match geometry.map(|g| &g.value) {
            Some(Value::Point(_) | Value::MultiPoint(_)) => GeometryKind::Point,
            Some(Value::LineString(_) | Value::MultiLineString(_)) => GeometryKind::Line,
            Some(Value::Polygon(_) | Value::MultiPolygon(_)) => GeometryKind::Polygon,
            _ => GeometryKind::Other,
        }
    }
}

/// How a point feature is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointSymbol {
    Icon {
        url: String,
    },
    Circle {
        fill_color: String,
        fill_opacity: f64,
        scale: f64,
        stroke_color: String,
        stroke_weight: f64,
    },
}

/// Draw parameters handed to the map SDK for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_weight: f64,
    pub z_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<PointSymbol>,
}

/// Pure mapping from (geometry kind, layer configuration) to a draw style.
pub fn style_for(kind: GeometryKind, layer: &LayerConfiguration) -> FeatureStyle {
    let stroke_color = layer
        .stroke_color
        .clone()
        .unwrap_or_else(|| layer.color.clone());
    let base = FeatureStyle {
        fill_color: layer.color.clone(),
        fill_opacity: BASE_FILL_OPACITY,
        stroke_color,
        stroke_weight: DEFAULT_STROKE_WEIGHT,
        z_index: layer.z_index,
        point: None,
    };

    match kind {
        GeometryKind::Point => {
            let symbol = match &layer.icon {
                Some(url) => PointSymbol::Icon { url: url.clone() },
                None => PointSymbol::Circle {
                    fill_color: layer.color.clone(),
                    fill_opacity: 1.0,
                    scale: POINT_MARKER_SCALE,
                    stroke_color: POINT_OUTLINE_COLOR.to_string(),
                    stroke_weight: DEFAULT_STROKE_WEIGHT,
                },
            };
            FeatureStyle {
                fill_opacity: 1.0,
                point: Some(symbol),
                ..base
            }
        }
        GeometryKind::Line => FeatureStyle {
            fill_opacity: 0.0,
            stroke_weight: layer.stroke_width.unwrap_or(DEFAULT_LINE_STROKE_WIDTH),
            ..base
        },
        GeometryKind::Polygon => FeatureStyle {
            fill_opacity: layer.fill_opacity.unwrap_or(DEFAULT_POLYGON_FILL_OPACITY),
            stroke_weight: layer.stroke_width.unwrap_or(DEFAULT_STROKE_WEIGHT),
            ..base
        },
        GeometryKind::Other => base,
    }
}

pub mod colors;
pub mod gis;
pub mod label;
pub mod layer;
pub mod properties;
pub mod store;
pub mod style;

pub use gis::{GisConfig, LatLng, MapOptions, MapTypeId};
pub use label::{LabelIcon, label_icon};
pub use layer::{LayerConfiguration, LayerType, default_layers};
pub use properties::{FeatureProperties, InfoWindowContent, flatten_properties, label_text};
pub use store::{LayerStore, StoreError};
pub use style::{FeatureStyle, GeometryKind, PointSymbol, style_for};

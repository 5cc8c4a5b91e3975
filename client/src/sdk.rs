//! Boundary between the layer module and whichever interactive-map library
//! draws the map. Everything the module needs from the library goes through
//! these traits; the Google Maps adapter lives in `gmaps`.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use geojson::{Feature, JsonObject};

use fieldmap_shared::{FeatureStyle, LabelIcon, LatLng, MapOptions};

/// A feature together with the style it must be drawn with.
#[derive(Debug, Clone)]
pub struct StyledFeature {
    pub feature: Feature,
    pub style: FeatureStyle,
}

/// Click on a rendered feature, as reported by the map library.
#[derive(Debug, Clone)]
pub struct FeatureClick {
    pub position: LatLng,
    pub properties: Option<JsonObject>,
}

pub type ClickHandler = Box<dyn Fn(FeatureClick)>;

/// GeoJSON data overlay. Created detached from the map.
pub trait DataOverlay {
    /// Ingest features that already carry their style. Returns how many
    /// features the library drew.
    fn add_features(&self, features: Vec<StyledFeature>) -> usize;
    fn set_attached(&self, attached: bool);
    fn is_attached(&self) -> bool;
    fn on_click(&self, handler: ClickHandler);
    /// Drop every ingested feature and detach.
    fn clear(&self);
}

/// Marker whose only content is a generated caption image.
pub trait LabelMarker {
    fn set_attached(&self, attached: bool);
    fn is_attached(&self) -> bool;
    fn remove(&self);
}

/// One constructed map widget. Shared by every layer and overlay of a view.
pub trait MapWidget {
    /// Invoke `callback` once, on the first idle/render-complete event.
    fn on_first_idle(&self, callback: Box<dyn FnOnce()>);
    fn create_data_overlay(&self) -> Box<dyn DataOverlay>;
    fn create_label_marker(
        &self,
        position: LatLng,
        icon: &LabelIcon,
        title: &str,
    ) -> Box<dyn LabelMarker>;
    fn open_info_window(&self, position: LatLng, html: &str);
    fn dispose(&self);
}

/// Loads the map library and constructs widgets.
pub trait MapSdk {
    type Container;

    fn create_map(
        &self,
        container: &Self::Container,
        api_key: &str,
        options: &MapOptions,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn MapWidget>, String>>;
}

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use futures::future::join_all;
use geojson::FeatureCollection;
use log::{debug, info};

use fieldmap_shared::{
    FeatureProperties, GeometryKind, InfoWindowContent, LayerConfiguration, LayerType,
    flatten_properties, style_for,
};

use crate::labels::LabelOverlayManager;
use crate::lifecycle::MapHandle;
use crate::loader::{GeoJsonLoader, HttpFetch};
use crate::sdk::{ClickHandler, DataOverlay, FeatureClick, MapWidget, StyledFeature};

pub type SelectionCallback = Rc<dyn Fn(FeatureProperties)>;

/// A layer that has been fetched, styled and handed to the map.
pub struct LoadedLayerHandle {
    overlay: Box<dyn DataOverlay>,
    rendered: usize,
}

impl LoadedLayerHandle {
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    pub fn is_attached(&self) -> bool {
        self.overlay.is_attached()
    }
}

/// Loads each configured layer at most once per map instance and keeps its
/// attachment in line with the layer's enabled flag.
pub struct LayerRegistry<F> {
    loader: GeoJsonLoader<F>,
    map: MapHandle,
    handles: RefCell<HashMap<LayerType, LoadedLayerHandle>>,
    in_flight: RefCell<HashSet<LayerType>>,
    // Latest visibility requested per layer, including before its load finished.
    desired: RefCell<HashMap<LayerType, bool>>,
    labels: LabelOverlayManager,
    on_select: SelectionCallback,
}

impl<F: HttpFetch> LayerRegistry<F> {
    pub fn new(loader: GeoJsonLoader<F>, map: MapHandle, on_select: SelectionCallback) -> Self {
        Self {
            loader,
            map,
            handles: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(HashSet::new()),
            desired: RefCell::new(HashMap::new()),
            labels: LabelOverlayManager::new(),
            on_select,
        }
    }

    /// Fetch, style and attach `layer` unless that already happened. Before
    /// the map is ready this does nothing; the next sync retries.
    pub async fn ensure_loaded(&self, layer: &LayerConfiguration) {
        let layer_type = layer.layer_type;
        let Some(widget) = self.map.ready_widget() else {
            debug!("map not ready; deferring {layer_type}");
            return;
        };
        if self.handles.borrow().contains_key(&layer_type)
            || !self.in_flight.borrow_mut().insert(layer_type)
        {
            return;
        }

        let collection = self.loader.load(&layer.data_url).await;
        self.in_flight.borrow_mut().remove(&layer_type);
        let Some(collection) = collection else {
            return;
        };

        // The map may have been torn down while the fetch was pending.
        match self.map.ready_widget() {
            Some(current) if Rc::ptr_eq(&current, &widget) => {}
            _ => {
                debug!("discarding {layer_type}: map instance went away");
                return;
            }
        }

        self.attach(&widget, layer, collection);
    }

    fn attach(
        &self,
        widget: &Rc<dyn MapWidget>,
        layer: &LayerConfiguration,
        collection: FeatureCollection,
    ) {
        let layer_type = layer.layer_type;
        let visible = self
            .desired
            .borrow()
            .get(&layer_type)
            .copied()
            .unwrap_or(layer.enabled);

        let styled = collection
            .features
            .iter()
            .map(|feature| StyledFeature {
                style: style_for(GeometryKind::of(feature.geometry.as_ref()), layer),
                feature: feature.clone(),
            })
            .collect();

        let overlay = widget.create_data_overlay();
        let rendered = overlay.add_features(styled);
        overlay.on_click(click_handler(Rc::downgrade(widget), self.on_select.clone()));
        overlay.set_attached(visible);

        if layer_type.carries_labels() {
            self.labels.create_for(widget, &collection, layer, visible);
        }

        info!("layer {layer_type} loaded: {rendered} features, visible={visible}");
        self.handles.borrow_mut().insert(
            layer_type,
            LoadedLayerHandle {
                overlay,
                rendered,
            },
        );
    }

    /// Attach or detach an already-loaded layer. Never fetches.
    pub fn set_visibility(&self, layer_type: LayerType, enabled: bool) {
        self.desired.borrow_mut().insert(layer_type, enabled);
        if let Some(handle) = self.handles.borrow().get(&layer_type)
            && handle.overlay.is_attached() != enabled
        {
            handle.overlay.set_attached(enabled);
        }
        if layer_type.carries_labels() {
            self.labels.set_visible(enabled);
        }
    }

    /// Mirror each layer's enabled flag onto the map, then load every layer
    /// that is not loaded yet (concurrently). Flags are applied before any
    /// await so a slower, older sync cannot overwrite a newer one; late loads
    /// attach according to `desired`.
    pub async fn sync(&self, layers: &[LayerConfiguration]) {
        if !self.map.is_ready() {
            return;
        }
        for layer in layers {
            self.set_visibility(layer.layer_type, layer.enabled);
        }
        join_all(layers.iter().map(|layer| self.ensure_loaded(layer))).await;
    }

    pub fn is_loaded(&self, layer_type: LayerType) -> bool {
        self.handles.borrow().contains_key(&layer_type)
    }

    pub fn loaded_count(&self) -> usize {
        self.handles.borrow().len()
    }

    pub fn rendered_features(&self, layer_type: LayerType) -> Option<usize> {
        self.handles.borrow().get(&layer_type).map(|h| h.rendered())
    }

    pub fn is_attached(&self, layer_type: LayerType) -> Option<bool> {
        self.handles.borrow().get(&layer_type).map(|h| h.is_attached())
    }

    pub fn labels(&self) -> &LabelOverlayManager {
        &self.labels
    }

    /// Detach and drop every handle and label overlay. Called on map teardown.
    pub fn release(&self) {
        for (_, handle) in self.handles.borrow_mut().drain() {
            handle.overlay.set_attached(false);
            handle.overlay.clear();
        }
        self.labels.release();
        self.in_flight.borrow_mut().clear();
    }
}

fn click_handler(map: Weak<dyn MapWidget>, on_select: SelectionCallback) -> ClickHandler {
    Box::new(move |click: FeatureClick| {
        let properties = flatten_properties(click.properties.as_ref());
        if let Some(map) = map.upgrade() {
            let content = InfoWindowContent::from_properties(&properties);
            map.open_info_window(click.position, &content.to_html());
        }
        on_select(properties);
    })
}

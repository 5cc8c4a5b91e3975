#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use geojson::{FeatureCollection, Value};
use log::debug;

use fieldmap_shared::{LatLng, LayerConfiguration, flatten_properties, label_icon, label_text};

use crate::sdk::{LabelMarker, MapWidget};

/// Text caption drawn next to one point of the label layer.
pub struct LabelOverlay {
    pub position: LatLng,
    pub text: String,
    marker: Box<dyn LabelMarker>,
}

/// Label overlays for the one layer that carries node/number captions.
/// Created once per map instance, then only attached or detached in bulk.
#[derive(Default)]
pub struct LabelOverlayManager {
    overlays: RefCell<Vec<LabelOverlay>>,
    created: Cell<bool>,
}

impl LabelOverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one overlay per labelled point feature. Returns the number of
    /// overlays created; later calls create nothing.
    pub fn create_for(
        &self,
        widget: &Rc<dyn MapWidget>,
        collection: &FeatureCollection,
        layer: &LayerConfiguration,
        visible: bool,
    ) -> usize {
        if self.created.replace(true) {
            return 0;
        }

        let mut overlays = self.overlays.borrow_mut();
        for feature in &collection.features {
            let Some(Value::Point(position)) = feature.geometry.as_ref().map(|g| &g.value) else {
                continue;
            };
            let Some(position) = LatLng::from_position(position) else {
                continue;
            };
            let properties = flatten_properties(feature.properties.as_ref());
            let Some(text) = label_text(&properties) else {
                continue;
            };
            let icon = label_icon(&text, layer);
            let marker = widget.create_label_marker(position, &icon, &text);
            marker.set_attached(visible);
            overlays.push(LabelOverlay {
                position,
                text,
                marker,
            });
        }
        debug!("created {} label overlays for {}", overlays.len(), layer.layer_type);
        overlays.len()
    }

    pub fn set_visible(&self, visible: bool) {
        for overlay in self.overlays.borrow().iter() {
            if overlay.marker.is_attached() != visible {
                overlay.marker.set_attached(visible);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.overlays.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.borrow().is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.overlays.borrow().iter().map(|o| o.text.clone()).collect()
    }

    /// Remove every marker from the map. The manager stays spent.
    pub fn release(&self) {
        for overlay in self.overlays.borrow_mut().drain(..) {
            overlay.marker.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeWidget, labelled_node_features};
    use fieldmap_shared::{LayerType, default_layers};

    fn nodes_layer() -> LayerConfiguration {
        default_layers()
            .into_iter()
            .find(|l| l.layer_type == LayerType::Nodes)
            .expect("nodes layer")
    }

    #[test]
    fn creates_one_overlay_per_labelled_point() {
        let widget = FakeWidget::new();
        let dyn_widget: Rc<dyn MapWidget> = widget.clone();
        let manager = LabelOverlayManager::new();

        let created = manager.create_for(&dyn_widget, &labelled_node_features(), &nodes_layer(), true);

        // The line feature and the point without a caption are skipped.
        assert_eq!(created, 2);
        assert_eq!(manager.texts(), vec!["101".to_string(), "J-7".to_string()]);
        assert_eq!(widget.markers().len(), 2);
        assert!(widget.markers().iter().all(|m| m.attached.get()));
    }

    #[test]
    fn creation_happens_once() {
        let widget = FakeWidget::new();
        let dyn_widget: Rc<dyn MapWidget> = widget.clone();
        let manager = LabelOverlayManager::new();
        manager.create_for(&dyn_widget, &labelled_node_features(), &nodes_layer(), true);
        let again = manager.create_for(&dyn_widget, &labelled_node_features(), &nodes_layer(), true);

        assert_eq!(again, 0);
        assert_eq!(widget.markers().len(), 2);
    }

    #[test]
    fn visibility_toggles_in_bulk_without_recreating() {
        let widget = FakeWidget::new();
        let dyn_widget: Rc<dyn MapWidget> = widget.clone();
        let manager = LabelOverlayManager::new();
        manager.create_for(&dyn_widget, &labelled_node_features(), &nodes_layer(), false);
        assert!(widget.markers().iter().all(|m| !m.attached.get()));

        manager.set_visible(true);
        manager.set_visible(true);
        assert!(widget.markers().iter().all(|m| m.attached.get()));
        assert!(widget.markers().iter().all(|m| m.attach_calls.get() == 2));

        manager.set_visible(false);
        assert!(widget.markers().iter().all(|m| !m.attached.get()));
        assert_eq!(widget.markers().len(), 2);
    }

    #[test]
    fn release_removes_every_marker() {
        let widget = FakeWidget::new();
        let dyn_widget: Rc<dyn MapWidget> = widget.clone();
        let manager = LabelOverlayManager::new();
        manager.create_for(&dyn_widget, &labelled_node_features(), &nodes_layer(), true);

        manager.release();
        assert!(manager.is_empty());
        assert!(widget.markers().iter().all(|m| m.removed.get()));
    }
}

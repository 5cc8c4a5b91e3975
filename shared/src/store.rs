use std::collections::{HashMap, HashSet};

use crate::layer::{LayerConfiguration, LayerType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("layer type {0} is configured more than once")]
    DuplicateLayer(LayerType),
}

/// Owner of the layer configuration list.
///
/// User toggles flow in through [`LayerStore::set_enabled`]; the map side only
/// reads. `revision` increases on every accepted change so observers can tell
/// whether anything moved since they last looked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStore {
    layers: Vec<LayerConfiguration>,
    revision: u64,
}

impl LayerStore {
    pub fn new(mut layers: Vec<LayerConfiguration>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(layers.len());
        for layer in &layers {
            if !seen.insert(layer.layer_type) {
                return Err(StoreError::DuplicateLayer(layer.layer_type));
            }
        }
        layers.sort_by_key(|layer| layer.z_index);
        Ok(Self {
            layers,
            revision: 0,
        })
    }

    pub fn layers(&self) -> &[LayerConfiguration] {
        &self.layers
    }

    pub fn get(&self, layer_type: LayerType) -> Option<&LayerConfiguration> {
        self.layers.iter().find(|l| l.layer_type == layer_type)
    }

    pub fn is_enabled(&self, layer_type: LayerType) -> bool {
        self.get(layer_type).is_some_and(|l| l.enabled)
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true when the flag actually changed.
    pub fn set_enabled(&mut self, layer_type: LayerType, enabled: bool) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.layer_type == layer_type) else {
            return false;
        };
        if layer.enabled == enabled {
            return false;
        }
        layer.enabled = enabled;
        self.revision += 1;
        true
    }

    pub fn toggle(&mut self, layer_type: LayerType) -> bool {
        let enabled = self.is_enabled(layer_type);
        self.set_enabled(layer_type, !enabled)
    }

    /// Snapshot of the enabled flags, suitable for persisting.
    pub fn enabled_flags(&self) -> HashMap<LayerType, bool> {
        self.layers
            .iter()
            .map(|l| (l.layer_type, l.enabled))
            .collect()
    }

    /// Re-apply previously persisted flags. Unknown layer types are ignored.
    pub fn apply_enabled_overrides(&mut self, flags: &HashMap<LayerType, bool>) {
        for (&layer_type, &enabled) in flags {
            self.set_enabled(layer_type, enabled);
        }
    }
}

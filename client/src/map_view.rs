#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::rc::Rc;

use fieldmap_shared::{LayerConfiguration, LayerType, MapOptions};

use crate::lifecycle::{MapController, MapError, MapHandle};
use crate::loader::{GeoJsonLoader, HttpFetch};
use crate::ready::ReadySource;
use crate::registry::{LayerRegistry, SelectionCallback};
use crate::sdk::MapSdk;
use crate::timer::Timer;

/// One mounted map: its controller and the registry that draws layers on it.
/// The registry is released by the controller's teardown, before the widget.
pub struct GisMapView<S, T, F> {
    controller: MapController<S, T>,
    registry: Rc<LayerRegistry<F>>,
}

impl<S: MapSdk, T: Timer, F: HttpFetch + 'static> GisMapView<S, T, F> {
    pub fn new(sdk: S, timer: T, fetch: F, on_select: SelectionCallback) -> Self {
        let controller = MapController::new(sdk, timer);
        let registry = Rc::new(LayerRegistry::new(
            GeoJsonLoader::new(fetch),
            controller.handle(),
            on_select,
        ));
        let weak = Rc::downgrade(&registry);
        controller.handle().on_teardown(move || {
            if let Some(registry) = weak.upgrade() {
                registry.release();
            }
        });
        Self {
            controller,
            registry,
        }
    }

    /// Initialize the map, then bring `layers` onto it.
    pub async fn mount(
        &self,
        container: &S::Container,
        api_key: &str,
        options: &MapOptions,
        layers: &[LayerConfiguration],
    ) -> Result<ReadySource, MapError> {
        let source = self.controller.initialize(container, api_key, options).await?;
        self.registry.sync(layers).await;
        Ok(source)
    }

    /// Reflect the current configuration onto the map. No-op until ready.
    pub async fn sync(&self, layers: &[LayerConfiguration]) {
        self.registry.sync(layers).await;
    }

    pub fn set_visibility(&self, layer_type: LayerType, enabled: bool) {
        self.registry.set_visibility(layer_type, enabled);
    }

    pub fn handle(&self) -> MapHandle {
        self.controller.handle()
    }

    pub fn registry(&self) -> &LayerRegistry<F> {
        &self.registry
    }

    pub fn dispose(&self) {
        self.controller.dispose();
    }
}

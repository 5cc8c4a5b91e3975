use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_storage::Storage;
use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen_futures::spawn_local;

use fieldmap_shared::{FeatureProperties, GisConfig, InfoWindowContent, LayerStore, LayerType};

use crate::gmaps::GoogleMapsSdk;
use crate::lifecycle::MapError;
use crate::loader::GlooFetch;
use crate::map_view::GisMapView;
use crate::timer::GlooTimer;

const LAYER_FLAGS_KEY: &str = "fieldmap_layers";

type LiveMapView = GisMapView<GoogleMapsSdk, GlooTimer, GlooFetch>;

thread_local! {
    static MAP_VIEW: RefCell<Option<Rc<LiveMapView>>> = const { RefCell::new(None) };
}

/// Layer configuration owned by the UI. Toggles write here; the map reads.
#[derive(Clone, Copy)]
pub(crate) struct Layers(pub RwSignal<LayerStore>);
/// Properties of the last clicked feature.
#[derive(Clone, Copy)]
pub(crate) struct SelectedFeature(pub RwSignal<Option<FeatureProperties>>);

/// Fetch the map bootstrap configuration from the API.
pub async fn fetch_gis_config() -> Result<GisConfig, String> {
    let resp = gloo_net::http::Request::get("/api/gis/config")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<GisConfig>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

fn current_map_view() -> Option<Rc<LiveMapView>> {
    MAP_VIEW.with(|slot| slot.borrow().clone())
}

fn dispose_map_view() {
    let view = MAP_VIEW.with(|slot| slot.borrow_mut().take());
    if let Some(view) = view {
        view.dispose();
    }
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    let boot: RwSignal<Option<Result<GisConfig, String>>> = RwSignal::new(None);
    let layers: RwSignal<LayerStore> = RwSignal::new(LayerStore::default());
    let selected: RwSignal<Option<FeatureProperties>> = RwSignal::new(None);

    provide_context(Layers(layers));
    provide_context(SelectedFeature(selected));

    spawn_local(async move {
        let config = match fetch_gis_config().await {
            Ok(config) => config,
            Err(e) => {
                error!("map configuration unavailable: {e}");
                boot.set(Some(Err(format!("Map configuration unavailable ({e})"))));
                return;
            }
        };
        match LayerStore::new(config.layers.clone()) {
            Ok(mut store) => {
                let saved: HashMap<LayerType, bool> =
                    gloo_storage::LocalStorage::get(LAYER_FLAGS_KEY).unwrap_or_default();
                store.apply_enabled_overrides(&saved);
                info!("loaded {} layer configurations", store.layers().len());
                layers.set(store);
                boot.set(Some(Ok(config)));
            }
            Err(e) => {
                error!("invalid layer configuration: {e}");
                boot.set(Some(Err(e.to_string())));
            }
        }
    });

    // Persist toggle state once the real configuration is in place.
    Effect::new(move || {
        let flags = layers.with(|store| store.enabled_flags());
        if !boot.with_untracked(|b| matches!(b, Some(Ok(_)))) {
            return;
        }
        if let Err(e) = gloo_storage::LocalStorage::set(LAYER_FLAGS_KEY, &flags) {
            warn!("could not persist layer toggles: {e}");
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; display: flex; font-family: 'Inter', system-ui, sans-serif;">
            {move || match boot.get() {
                None => view! { <CenteredMessage text={"Loading map configuration\u{2026}".to_string()} /> }.into_any(),
                Some(Err(message)) => view! { <CenteredMessage text=message /> }.into_any(),
                Some(Ok(config)) => view! {
                    <LayerPanel />
                    <div style="flex: 1; position: relative;">
                        <MapPanel config=config />
                        <FeaturePanel />
                    </div>
                }
                .into_any(),
            }}
        </div>
    }
}

#[component]
fn CenteredMessage(text: String) -> impl IntoView {
    view! {
        <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; color: #5a5860; font-size: 0.9rem; text-align: center; padding: 24px;">
            {text}
        </div>
    }
}

/// Hosts the map widget. Owns the one `GisMapView` of this page.
#[component]
fn MapPanel(config: GisConfig) -> impl IntoView {
    let Layers(layers) = expect_context();
    let SelectedFeature(selected) = expect_context();
    let map_error: RwSignal<Option<String>> = RwSignal::new(None);
    let container = NodeRef::<leptos::html::Div>::new();

    Effect::new(move || {
        let Some(el) = container.get() else {
            return;
        };
        if current_map_view().is_some() {
            return;
        }
        let view = Rc::new(GisMapView::new(
            GoogleMapsSdk,
            GlooTimer,
            GlooFetch,
            Rc::new(move |properties| selected.set(Some(properties))),
        ));
        MAP_VIEW.with(|slot| *slot.borrow_mut() = Some(view.clone()));

        let element: web_sys::HtmlElement = el.into();
        let api_key = config.api_key.clone();
        let options = config.map.clone();
        let snapshot = layers.with_untracked(|store| store.layers().to_vec());
        spawn_local(async move {
            match view.mount(&element, &api_key, &options, &snapshot).await {
                Ok(source) => {
                    info!("map mounted ({source:?})");
                    // Pick up toggles made while the map was loading.
                    let latest = layers.with_untracked(|store| store.layers().to_vec());
                    view.sync(&latest).await;
                }
                Err(MapError::Disposed) => {}
                Err(e) => map_error.set(Some(e.to_string())),
            }
        });
    });

    // Mirror configuration changes onto the map, once per store revision.
    Effect::new(move |last_synced: Option<Option<u64>>| {
        let (revision, snapshot) =
            layers.with(|store| (store.revision(), store.layers().to_vec()));
        let last_synced = last_synced.flatten();
        let Some(view) = current_map_view() else {
            return last_synced;
        };
        if last_synced == Some(revision) {
            return last_synced;
        }
        spawn_local(async move {
            view.sync(&snapshot).await;
        });
        Some(revision)
    });

    on_cleanup(dispose_map_view);

    view! {
        <div node_ref=container style="position: absolute; inset: 0; background: #e8e6e1;" />
        {move || map_error.get().map(|message| view! {
            <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(12,14,23,0.85); color: #e2e0d8; font-size: 0.9rem; text-align: center; padding: 24px; z-index: 5;">
                {message}
            </div>
        })}
    }
}

/// Checkbox per layer. The only writer of enabled flags.
#[component]
fn LayerPanel() -> impl IntoView {
    let Layers(layers) = expect_context();

    view! {
        <div style="width: 240px; flex-shrink: 0; background: #13161f; color: #e2e0d8; border-right: 1px solid #282c3e; padding: 12px; overflow-y: auto;">
            <div style="font-size: 0.72rem; text-transform: uppercase; letter-spacing: 0.08em; color: #9a9590; margin-bottom: 8px;">
                "Layers"
            </div>
            {move || layers.with(|store| {
                store
                    .layers()
                    .iter()
                    .map(|layer| {
                        let layer_type = layer.layer_type;
                        view! {
                            <label
                                title={layer.description.clone()}
                                style="display: flex; align-items: center; gap: 8px; padding: 4px 0; cursor: pointer; font-size: 0.82rem;"
                            >
                                <input
                                    type="checkbox"
                                    prop:checked=layer.enabled
                                    on:change=move |_| layers.update(|store| {
                                        store.toggle(layer_type);
                                    })
                                />
                                <span style={format!("width: 10px; height: 10px; border-radius: 2px; background: {};", layer.color)} />
                                <span>{layer.name.clone()}</span>
                            </label>
                        }
                    })
                    .collect_view()
            })}
        </div>
    }
}

/// Property table of the selected feature.
#[component]
fn FeaturePanel() -> impl IntoView {
    let SelectedFeature(selected) = expect_context();

    move || {
        selected.get().map(|properties| {
            let content = InfoWindowContent::from_properties(&properties);
            view! {
                <div style="position: absolute; top: 12px; right: 12px; z-index: 4; min-width: 200px; max-width: 300px; background: #161921; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 6px; padding: 10px 12px; font-size: 0.78rem;">
                    <div style="display: flex; justify-content: space-between; align-items: center; gap: 8px; margin-bottom: 6px;">
                        <span style="font-weight: 700;">{content.title.clone().unwrap_or_else(|| "Feature".to_string())}</span>
                        <button
                            style="background: none; border: none; color: #9a9590; cursor: pointer;"
                            on:click=move |_| selected.set(None)
                        >
                            "\u{00D7}"
                        </button>
                    </div>
                    {content
                        .rows
                        .into_iter()
                        .map(|(key, value)| view! {
                            <div style="display: flex; justify-content: space-between; gap: 12px; padding: 2px 0; border-top: 1px solid rgba(40,44,62,0.5);">
                                <span style="color: #9a9590;">{key}</span>
                                <span style="font-family: 'JetBrains Mono', monospace;">{value}</span>
                            </div>
                        })
                        .collect_view()}
                </div>
            }
        })
    }
}

//! Google Maps JavaScript API behind the `sdk` traits. Everything here talks
//! to `window.google.maps` through `js_sys::Reflect`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use geojson::{FeatureCollection, JsonObject};
use js_sys::{Array, Function, Object, Reflect};
use log::{debug, warn};
use serde::Serialize;
use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

use fieldmap_shared::{FeatureStyle, LabelIcon, LatLng, MapOptions, PointSymbol};

use crate::sdk::{
    ClickHandler, DataOverlay, FeatureClick, LabelMarker, MapSdk, MapWidget, StyledFeature,
};

const SCRIPT_ID: &str = "fieldmap-gmaps-script";
const SCRIPT_BASE: &str = "https://maps.googleapis.com/maps/api/js";
/// `google.maps.SymbolPath.CIRCLE`.
const SYMBOL_PATH_CIRCLE: u32 = 0;

fn js_err(context: &str, err: JsValue) -> String {
    let detail = err
        .as_string()
        .or_else(|| {
            Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| "unknown error".into());
    format!("{context}: {detail}")
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, String> {
    let value = Reflect::get(target, &JsValue::from_str(key)).map_err(|e| js_err(key, e))?;
    if value.is_undefined() {
        return Err(format!("{key} is undefined"));
    }
    Ok(value)
}

fn call(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, String> {
    let function = get(target, method)?
        .dyn_into::<Function>()
        .map_err(|_| format!("{method} is not a function"))?;
    let array: Array = args.iter().copied().collect();
    function.apply(target, &array).map_err(|e| js_err(method, e))
}

fn construct(ns: &JsValue, class: &str, args: &[&JsValue]) -> Result<JsValue, String> {
    let ctor = get(ns, class)?
        .dyn_into::<Function>()
        .map_err(|_| format!("google.maps.{class} is not a constructor"))?;
    let array: Array = args.iter().copied().collect();
    Reflect::construct(&ctor, &array).map_err(|e| js_err(class, e))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("serialize: {e}"))
}

fn maps_namespace() -> Result<JsValue, String> {
    let window = web_sys::window().ok_or("no window")?;
    let google = get(window.as_ref(), "google")?;
    get(&google, "maps")
}

fn lat_lng_of(value: &JsValue) -> Option<LatLng> {
    let lat = call(value, "lat", &[]).ok()?.as_f64()?;
    let lng = call(value, "lng", &[]).ok()?.as_f64()?;
    Some(LatLng { lat, lng })
}

/// Inject the Maps script once and wait for it to load.
async fn load_script(api_key: &str) -> Result<JsValue, String> {
    if let Ok(ns) = maps_namespace() {
        return Ok(ns);
    }
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let (tx, rx) = oneshot::channel::<Result<(), String>>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let ok_tx = tx.clone();
    let on_load = Closure::once_into_js(move || {
        if let Some(tx) = ok_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });
    let on_error = Closure::once_into_js(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(Err("map script failed to load".into()));
        }
    });

    let script = match document.get_element_by_id(SCRIPT_ID) {
        // Another mount already injected it; listen on the same element.
        Some(existing) => existing
            .dyn_into::<web_sys::HtmlScriptElement>()
            .map_err(|_| "map script element has the wrong type")?,
        None => {
            let script = document
                .create_element("script")
                .map_err(|e| js_err("create script", e))?
                .dyn_into::<web_sys::HtmlScriptElement>()
                .map_err(|_| "created element is not a script")?;
            script.set_id(SCRIPT_ID);
            script.set_async(true);
            script.set_src(&format!(
                "{SCRIPT_BASE}?key={}&v=weekly",
                String::from(js_sys::encode_uri_component(api_key))
            ));
            let head = document.head().ok_or("no document head")?;
            head.append_child(&script)
                .map_err(|e| js_err("append script", e))?;
            script
        }
    };
    script
        .add_event_listener_with_callback("load", on_load.unchecked_ref())
        .map_err(|e| js_err("script load listener", e))?;
    script
        .add_event_listener_with_callback("error", on_error.unchecked_ref())
        .map_err(|e| js_err("script error listener", e))?;

    let outcome = rx.await.map_err(|_| "map script loader dropped".to_string())?;
    if let Err(e) = outcome {
        // A failed element never fires again; drop it so the next mount injects a fresh one.
        if let Some(stale) = document.get_element_by_id(SCRIPT_ID) {
            stale.remove();
        }
        return Err(e);
    }
    maps_namespace()
}

fn map_options_js(options: &MapOptions) -> Result<JsValue, String> {
    let mut opts = json!({
        "center": {"lat": options.center.lat, "lng": options.center.lng},
        "zoom": options.zoom,
        "mapTypeId": options.map_type.as_str(),
        "streetViewControl": false,
        "fullscreenControl": false,
    });
    if options.hide_points_of_interest {
        opts["styles"] = json!([
            {"featureType": "poi", "stylers": [{"visibility": "off"}]},
            {"featureType": "transit", "elementType": "labels.icon", "stylers": [{"visibility": "off"}]}
        ]);
    }
    to_js(&opts)
}

fn style_options(style: &FeatureStyle) -> serde_json::Value {
    let mut opts = json!({
        "fillColor": style.fill_color,
        "fillOpacity": style.fill_opacity,
        "strokeColor": style.stroke_color,
        "strokeWeight": style.stroke_weight,
        "zIndex": style.z_index,
        "clickable": true,
    });
    match &style.point {
        Some(PointSymbol::Icon { url }) => opts["icon"] = json!(url),
        Some(PointSymbol::Circle {
            fill_color,
            fill_opacity,
            scale,
            stroke_color,
            stroke_weight,
        }) => {
            opts["icon"] = json!({
                "path": SYMBOL_PATH_CIRCLE,
                "fillColor": fill_color,
                "fillOpacity": fill_opacity,
                "scale": scale,
                "strokeColor": stroke_color,
                "strokeWeight": stroke_weight,
            });
        }
        None => {}
    }
    opts
}

/// Copy a `google.maps.Data.Feature`'s properties into a JSON object.
fn feature_properties(feature: &JsValue) -> Option<JsonObject> {
    let bag = Object::new();
    let sink = bag.clone();
    let visit = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |value: JsValue, key: JsValue| {
        let _ = Reflect::set(&sink, &key, &value);
    });
    call(feature, "forEachProperty", &[visit.as_ref()]).ok()?;
    serde_wasm_bindgen::from_value(bag.into()).ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleMapsSdk;

impl MapSdk for GoogleMapsSdk {
    type Container = web_sys::HtmlElement;

    fn create_map(
        &self,
        container: &web_sys::HtmlElement,
        api_key: &str,
        options: &MapOptions,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn MapWidget>, String>> {
        let container = container.clone();
        let api_key = api_key.to_string();
        let options = options.clone();
        async move {
            let ns = load_script(&api_key).await?;
            let opts = map_options_js(&options)?;
            let target: &JsValue = container.as_ref();
            let map = construct(&ns, "Map", &[target, &opts])?;
            debug!("google map constructed");
            let widget: Rc<dyn MapWidget> = Rc::new(GoogleMapWidget {
                ns,
                map,
                container,
                info_window: RefCell::new(None),
            });
            Ok(widget)
        }
        .boxed_local()
    }
}

pub struct GoogleMapWidget {
    ns: JsValue,
    map: JsValue,
    container: web_sys::HtmlElement,
    info_window: RefCell<Option<JsValue>>,
}

impl GoogleMapWidget {
    fn event_ns(&self) -> Result<JsValue, String> {
        get(&self.ns, "event")
    }
}

impl MapWidget for GoogleMapWidget {
    fn on_first_idle(&self, callback: Box<dyn FnOnce()>) {
        let listener = Closure::once_into_js(move || callback());
        let registered = self
            .event_ns()
            .and_then(|event| {
                call(&event, "addListenerOnce", &[&self.map, &JsValue::from_str("idle"), &listener])
            });
        if let Err(e) = registered {
            // The fallback timer still makes the map ready.
            warn!("could not subscribe to map idle: {e}");
        }
    }

    fn create_data_overlay(&self) -> Box<dyn DataOverlay> {
        let data = construct(&self.ns, "Data", &[]).unwrap_or_else(|e| {
            warn!("data layer construction failed: {e}");
            JsValue::UNDEFINED
        });
        Box::new(GoogleDataOverlay {
            data,
            map: self.map.clone(),
            attached: Cell::new(false),
            click: RefCell::new(None),
        })
    }

    fn create_label_marker(
        &self,
        position: LatLng,
        icon: &LabelIcon,
        title: &str,
    ) -> Box<dyn LabelMarker> {
        let marker = (|| -> Result<JsValue, String> {
            let (ax, ay) = icon.anchor();
            let anchor = construct(
                &self.ns,
                "Point",
                &[&JsValue::from(ax), &JsValue::from(ay)],
            )?;
            let icon_opts = to_js(&json!({"url": icon.data_uri}))?;
            Reflect::set(&icon_opts, &JsValue::from_str("anchor"), &anchor)
                .map_err(|e| js_err("icon anchor", e))?;
            let opts = to_js(&json!({
                "position": {"lat": position.lat, "lng": position.lng},
                "title": title,
                "clickable": false,
            }))?;
            Reflect::set(&opts, &JsValue::from_str("icon"), &icon_opts)
                .map_err(|e| js_err("marker icon", e))?;
            construct(&self.ns, "Marker", &[&opts])
        })()
        .unwrap_or_else(|e| {
            warn!("label marker construction failed: {e}");
            JsValue::UNDEFINED
        });
        Box::new(GoogleLabelMarker {
            marker,
            map: self.map.clone(),
            attached: Cell::new(false),
        })
    }

    fn open_info_window(&self, position: LatLng, html: &str) {
        let result = (|| -> Result<JsValue, String> {
            let mut slot = self.info_window.borrow_mut();
            let window = match slot.as_ref() {
                Some(window) => window.clone(),
                None => {
                    let window = construct(&self.ns, "InfoWindow", &[])?;
                    *slot = Some(window.clone());
                    window
                }
            };
            let at = to_js(&json!({"lat": position.lat, "lng": position.lng}))?;
            call(&window, "setContent", &[&JsValue::from_str(html)])?;
            call(&window, "setPosition", &[&at])?;
            call(&window, "open", &[&self.map])
        })();
        if let Err(e) = result {
            warn!("info window failed: {e}");
        }
    }

    fn dispose(&self) {
        if let Some(window) = self.info_window.borrow_mut().take() {
            let _ = call(&window, "close", &[]);
        }
        if let Ok(event) = self.event_ns() {
            let _ = call(&event, "clearInstanceListeners", &[&self.map]);
        }
        self.container.set_inner_html("");
    }
}

struct GoogleDataOverlay {
    data: JsValue,
    map: JsValue,
    attached: Cell<bool>,
    click: RefCell<Option<Closure<dyn Fn(JsValue)>>>,
}

impl DataOverlay for GoogleDataOverlay {
    fn add_features(&self, features: Vec<StyledFeature>) -> usize {
        let (features, styles): (Vec<_>, Vec<_>) =
            features.into_iter().map(|f| (f.feature, f.style)).unzip();
        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        let added = match to_js(&collection).and_then(|js| call(&self.data, "addGeoJson", &[&js])) {
            Ok(added) => Array::from(&added),
            Err(e) => {
                warn!("GeoJSON ingestion failed: {e}");
                return 0;
            }
        };
        // addGeoJson returns features in input order.
        for (feature, style) in added.iter().zip(&styles) {
            if let Err(e) = to_js(&style_options(style))
                .and_then(|opts| call(&self.data, "overrideStyle", &[&feature, &opts]))
            {
                warn!("feature style failed: {e}");
            }
        }
        added.length() as usize
    }

    fn set_attached(&self, attached: bool) {
        let target = if attached { self.map.clone() } else { JsValue::NULL };
        match call(&self.data, "setMap", &[&target]) {
            Ok(_) => self.attached.set(attached),
            Err(e) => warn!("data layer setMap failed: {e}"),
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn on_click(&self, handler: ClickHandler) {
        let listener = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
            let Some(position) = get(&event, "latLng").ok().as_ref().and_then(lat_lng_of) else {
                return;
            };
            let properties = get(&event, "feature")
                .ok()
                .and_then(|feature| feature_properties(&feature));
            handler(FeatureClick {
                position,
                properties,
            });
        });
        if let Err(e) = call(
            &self.data,
            "addListener",
            &[&JsValue::from_str("click"), listener.as_ref()],
        ) {
            warn!("data layer click listener failed: {e}");
        }
        *self.click.borrow_mut() = Some(listener);
    }

    fn clear(&self) {
        let data = self.data.clone();
        let remove = Closure::<dyn FnMut(JsValue)>::new(move |feature: JsValue| {
            let _ = call(&data, "remove", &[&feature]);
        });
        let _ = call(&self.data, "forEach", &[remove.as_ref()]);
        self.set_attached(false);
        self.click.borrow_mut().take();
    }
}

struct GoogleLabelMarker {
    marker: JsValue,
    map: JsValue,
    attached: Cell<bool>,
}

impl LabelMarker for GoogleLabelMarker {
    fn set_attached(&self, attached: bool) {
        let target = if attached { self.map.clone() } else { JsValue::NULL };
        match call(&self.marker, "setMap", &[&target]) {
            Ok(_) => self.attached.set(attached),
            Err(e) => warn!("label marker setMap failed: {e}"),
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn remove(&self) {
        self.set_attached(false);
    }
}

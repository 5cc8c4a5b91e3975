//! In-memory doubles for the map library, the network and the clock.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{LocalBoxFuture, ready};
use geojson::{FeatureCollection, Value};

use fieldmap_shared::{LabelIcon, LatLng, MapOptions};

use crate::loader::{HttpFetch, HttpResponse, parse_feature_collection};
use crate::sdk::{
    ClickHandler, DataOverlay, FeatureClick, LabelMarker, MapSdk, MapWidget, StyledFeature,
};
use crate::timer::Timer;

pub fn run_local<F: Future>(future: F) -> F::Output {
    LocalPool::new().run_until(future)
}

pub fn two_point_collection() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [4.90, 52.37]},
                "properties": {"name": "Valve 7", "status": "open"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [4.91, 52.38]},
                "properties": {"name": "Valve 8", "status": "closed"}
            }
        ]
    })
    .to_string()
}

/// Two captioned points ("101", "J-7"), one line and one uncaptioned point.
pub fn labelled_node_collection() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [4.90, 52.37]},
                "properties": {"number": 101, "status": "active"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[4.90, 52.37], [4.91, 52.38]]},
                "properties": {"name": "Main 3"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [4.92, 52.39]},
                "properties": {"status": "planned"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [4.93, 52.36]},
                "properties": {"node": "J-7"}
            }
        ]
    })
    .to_string()
}

pub fn labelled_node_features() -> FeatureCollection {
    parse_feature_collection(&labelled_node_collection()).expect("labelled node fixture")
}

#[derive(Default)]
struct FetchInner {
    routes: HashMap<String, (u16, String)>,
    calls: HashMap<String, usize>,
    held: bool,
    pending: Vec<oneshot::Sender<()>>,
}

/// Routed fake `fetch`. Unrouted URLs fail at the transport level. While
/// held, responses wait until `release_all`.
#[derive(Clone, Default)]
pub struct FakeFetch {
    inner: Rc<RefCell<FetchInner>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.inner
            .borrow_mut()
            .routes
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn calls(&self, url: &str) -> usize {
        self.inner.borrow().calls.get(url).copied().unwrap_or(0)
    }

    pub fn hold(&self) {
        self.inner.borrow_mut().held = true;
    }

    pub fn release_all(&self) {
        let pending = {
            let mut inner = self.inner.borrow_mut();
            inner.held = false;
            std::mem::take(&mut inner.pending)
        };
        for tx in pending {
            let _ = tx.send(());
        }
    }
}

impl HttpFetch for FakeFetch {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, String>> {
        let mut inner = self.inner.borrow_mut();
        *inner.calls.entry(url.to_string()).or_default() += 1;
        let result = match inner.routes.get(url) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(format!("no route for {url}")),
        };
        if !inner.held {
            return ready(result).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        inner.pending.push(tx);
        async move {
            let _ = rx.await;
            result
        }
        .boxed_local()
    }
}

#[derive(Default)]
struct ClockInner {
    now: Duration,
    sleepers: Vec<(Duration, oneshot::Sender<()>)>,
}

/// Virtual clock. Sleeps complete only when `advance` passes their deadline.
#[derive(Clone, Default)]
pub struct FakeClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let due = {
            let mut inner = self.inner.borrow_mut();
            inner.now += by;
            let now = inner.now;
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.sleepers)
                .into_iter()
                .partition(|(deadline, _)| *deadline <= now);
            inner.sleepers = waiting;
            due
        };
        for (_, tx) in due {
            let _ = tx.send(());
        }
    }
}

impl Timer for FakeClock {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let mut inner = self.inner.borrow_mut();
        let deadline = inner.now + duration;
        let (tx, rx) = oneshot::channel();
        if duration.is_zero() {
            let _ = tx.send(());
        } else {
            inner.sleepers.push((deadline, tx));
        }
        async move {
            let _ = rx.await;
        }
        .boxed_local()
    }
}

#[derive(Default)]
pub struct FakeOverlayState {
    pub features: RefCell<Vec<StyledFeature>>,
    pub attached: Cell<bool>,
    pub attach_calls: Cell<usize>,
    pub styled_before_attach: Cell<bool>,
    pub cleared: Cell<bool>,
    handler: RefCell<Option<ClickHandler>>,
}

impl FakeOverlayState {
    /// Simulate a user click on the `index`-th ingested feature.
    pub fn click(&self, index: usize) {
        let click = {
            let features = self.features.borrow();
            let feature = &features[index].feature;
            let position = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::Point(p)) => LatLng::from_position(p).expect("valid point"),
                _ => LatLng { lat: 0.0, lng: 0.0 },
            };
            FeatureClick {
                position,
                properties: feature.properties.clone(),
            }
        };
        if let Some(handler) = self.handler.borrow().as_ref() {
            handler(click);
        }
    }
}

struct FakeOverlay {
    state: Rc<FakeOverlayState>,
}

impl DataOverlay for FakeOverlay {
    fn add_features(&self, features: Vec<StyledFeature>) -> usize {
        let s = &self.state;
        s.styled_before_attach
            .set(s.attach_calls.get() == 0 && !s.attached.get());
        let count = features.len();
        s.features.borrow_mut().extend(features);
        count
    }

    fn set_attached(&self, attached: bool) {
        self.state.attach_calls.set(self.state.attach_calls.get() + 1);
        self.state.attached.set(attached);
    }

    fn is_attached(&self) -> bool {
        self.state.attached.get()
    }

    fn on_click(&self, handler: ClickHandler) {
        *self.state.handler.borrow_mut() = Some(handler);
    }

    fn clear(&self) {
        self.state.features.borrow_mut().clear();
        self.state.attached.set(false);
        self.state.cleared.set(true);
    }
}

pub struct FakeMarkerState {
    pub position: LatLng,
    pub title: String,
    pub attached: Cell<bool>,
    pub attach_calls: Cell<usize>,
    pub removed: Cell<bool>,
}

struct FakeMarker {
    state: Rc<FakeMarkerState>,
}

impl LabelMarker for FakeMarker {
    fn set_attached(&self, attached: bool) {
        self.state.attach_calls.set(self.state.attach_calls.get() + 1);
        self.state.attached.set(attached);
    }

    fn is_attached(&self) -> bool {
        self.state.attached.get()
    }

    fn remove(&self) {
        self.state.attached.set(false);
        self.state.removed.set(true);
    }
}

#[derive(Default)]
pub struct FakeWidget {
    auto_idle: bool,
    idle: RefCell<Option<Box<dyn FnOnce()>>>,
    overlays: RefCell<Vec<Rc<FakeOverlayState>>>,
    markers: RefCell<Vec<Rc<FakeMarkerState>>>,
    info_windows: RefCell<Vec<(LatLng, String)>>,
    dispose_calls: Cell<usize>,
}

impl FakeWidget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn with_auto_idle(auto_idle: bool) -> Rc<Self> {
        Rc::new(Self {
            auto_idle,
            ..Self::default()
        })
    }

    pub fn fire_idle(&self) {
        let callback = self.idle.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn overlays(&self) -> Vec<Rc<FakeOverlayState>> {
        self.overlays.borrow().clone()
    }

    pub fn markers(&self) -> Vec<Rc<FakeMarkerState>> {
        self.markers.borrow().clone()
    }

    pub fn info_windows(&self) -> Vec<(LatLng, String)> {
        self.info_windows.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.dispose_calls.get() > 0
    }

    pub fn dispose_calls(&self) -> usize {
        self.dispose_calls.get()
    }
}

impl MapWidget for FakeWidget {
    fn on_first_idle(&self, callback: Box<dyn FnOnce()>) {
        if self.auto_idle {
            callback();
        } else {
            *self.idle.borrow_mut() = Some(callback);
        }
    }

    fn create_data_overlay(&self) -> Box<dyn DataOverlay> {
        let state = Rc::new(FakeOverlayState::default());
        self.overlays.borrow_mut().push(state.clone());
        Box::new(FakeOverlay { state })
    }

    fn create_label_marker(
        &self,
        position: LatLng,
        _icon: &LabelIcon,
        title: &str,
    ) -> Box<dyn LabelMarker> {
        let state = Rc::new(FakeMarkerState {
            position,
            title: title.to_string(),
            attached: Cell::new(false),
            attach_calls: Cell::new(0),
            removed: Cell::new(false),
        });
        self.markers.borrow_mut().push(state.clone());
        Box::new(FakeMarker { state })
    }

    fn open_info_window(&self, position: LatLng, html: &str) {
        self.info_windows
            .borrow_mut()
            .push((position, html.to_string()));
    }

    fn dispose(&self) {
        self.dispose_calls.set(self.dispose_calls.get() + 1);
    }
}

enum SdkMode {
    IdleImmediately,
    NeverIdle,
    Failing(String),
}

struct SdkInner {
    mode: SdkMode,
    constructed: Cell<usize>,
    widget: RefCell<Option<Rc<FakeWidget>>>,
}

/// Fake map library. `never_idle` widgets only become idle via `fire_idle`.
#[derive(Clone)]
pub struct FakeSdk {
    inner: Rc<SdkInner>,
}

impl FakeSdk {
    fn with_mode(mode: SdkMode) -> Self {
        Self {
            inner: Rc::new(SdkInner {
                mode,
                constructed: Cell::new(0),
                widget: RefCell::new(None),
            }),
        }
    }

    pub fn idle_immediately() -> Self {
        Self::with_mode(SdkMode::IdleImmediately)
    }

    pub fn never_idle() -> Self {
        Self::with_mode(SdkMode::NeverIdle)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_mode(SdkMode::Failing(message.to_string()))
    }

    pub fn constructed(&self) -> usize {
        self.inner.constructed.get()
    }

    /// The most recently constructed widget.
    pub fn widget(&self) -> Rc<FakeWidget> {
        self.inner
            .widget
            .borrow()
            .clone()
            .expect("no widget constructed yet")
    }
}

impl MapSdk for FakeSdk {
    type Container = ();

    fn create_map(
        &self,
        _container: &(),
        _api_key: &str,
        _options: &MapOptions,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn MapWidget>, String>> {
        let auto_idle = match &self.inner.mode {
            SdkMode::Failing(message) => return ready(Err(message.clone())).boxed_local(),
            SdkMode::IdleImmediately => true,
            SdkMode::NeverIdle => false,
        };
        let widget = FakeWidget::with_auto_idle(auto_idle);
        self.inner.constructed.set(self.inner.constructed.get() + 1);
        *self.inner.widget.borrow_mut() = Some(widget.clone());
        let widget: Rc<dyn MapWidget> = widget;
        ready(Ok(widget)).boxed_local()
    }
}

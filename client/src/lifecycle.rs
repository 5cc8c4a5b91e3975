#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{Either, select};
use log::{error, info, warn};

use fieldmap_shared::MapOptions;

use crate::ready::{ReadyLatch, ReadySource};
use crate::sdk::{MapSdk, MapWidget};
use crate::timer::Timer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map API key is not configured")]
    MissingApiKey,
    #[error("Map library failed to load: {0}")]
    SdkLoad(String),
    #[error("Map view was already initialized")]
    AlreadyInitialized,
    #[error("Map view was closed before it finished loading")]
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    Loading,
    Ready(ReadySource),
    Failed(MapError),
    Disposed,
}

type TeardownHook = Box<dyn FnOnce()>;

struct MapShared {
    state: RefCell<MapState>,
    widget: RefCell<Option<Rc<dyn MapWidget>>>,
    teardown: RefCell<Vec<TeardownHook>>,
}

/// Read side of a controller: readiness, the widget once ready, and teardown
/// registration for dependents. Cheap to clone.
#[derive(Clone)]
pub struct MapHandle {
    shared: Rc<MapShared>,
}

impl MapHandle {
    pub fn state(&self) -> MapState {
        self.shared.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.state.borrow(), MapState::Ready(_))
    }

    /// The widget, but only once the map is ready for layers.
    pub fn ready_widget(&self) -> Option<Rc<dyn MapWidget>> {
        if !self.is_ready() {
            return None;
        }
        self.shared.widget.borrow().clone()
    }

    pub fn error(&self) -> Option<MapError> {
        match &*self.shared.state.borrow() {
            MapState::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Run `hook` on dispose, before the widget is released.
    pub fn on_teardown(&self, hook: impl FnOnce() + 'static) {
        self.shared.teardown.borrow_mut().push(Box::new(hook));
    }
}

/// Owns construction and destruction of exactly one map widget.
pub struct MapController<S, T> {
    sdk: S,
    timer: T,
    shared: Rc<MapShared>,
}

impl<S: MapSdk, T: Timer> MapController<S, T> {
    pub fn new(sdk: S, timer: T) -> Self {
        Self {
            sdk,
            timer,
            shared: Rc::new(MapShared {
                state: RefCell::new(MapState::Uninitialized),
                widget: RefCell::new(None),
                teardown: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn handle(&self) -> MapHandle {
        MapHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn state(&self) -> MapState {
        self.shared.state.borrow().clone()
    }

    /// Build the widget and wait until it can take layers: the first idle
    /// event, or the fallback timer if idle does not arrive in time.
    pub async fn initialize(
        &self,
        container: &S::Container,
        api_key: &str,
        options: &MapOptions,
    ) -> Result<ReadySource, MapError> {
        {
            let mut state = self.shared.state.borrow_mut();
            if *state != MapState::Uninitialized {
                return Err(MapError::AlreadyInitialized);
            }
            *state = MapState::Loading;
        }

        if api_key.trim().is_empty() {
            return Err(self.fail(MapError::MissingApiKey));
        }

        let widget = match self.sdk.create_map(container, api_key, options).await {
            Ok(widget) => widget,
            Err(e) => return Err(self.fail(MapError::SdkLoad(e))),
        };
        if self.is_disposed() {
            widget.dispose();
            return Err(MapError::Disposed);
        }
        *self.shared.widget.borrow_mut() = Some(widget.clone());

        let (latch, ready_rx) = ReadyLatch::new();
        let idle_latch = latch.clone();
        widget.on_first_idle(Box::new(move || {
            idle_latch.fire(ReadySource::Idle);
        }));

        let budget = Duration::from_millis(options.ready_timeout_ms);
        if let Either::Right(_) = select(ready_rx, self.timer.sleep(budget)).await
            && latch.fire(ReadySource::Fallback)
        {
            warn!(
                "map idle event did not arrive within {}ms; continuing in degraded mode",
                budget.as_millis()
            );
        }
        let source = latch.fired().unwrap_or(ReadySource::Fallback);

        if self.is_disposed() {
            return Err(MapError::Disposed);
        }
        *self.shared.state.borrow_mut() = MapState::Ready(source);
        info!("map ready ({source:?})");
        Ok(source)
    }

    /// Release dependents first, then the widget. Safe to call more than once.
    pub fn dispose(&self) {
        let previous = self.shared.state.replace(MapState::Disposed);
        if previous == MapState::Disposed {
            return;
        }
        let hooks = std::mem::take(&mut *self.shared.teardown.borrow_mut());
        for hook in hooks {
            hook();
        }
        if let Some(widget) = self.shared.widget.borrow_mut().take() {
            widget.dispose();
        }
        info!("map disposed");
    }

    fn is_disposed(&self) -> bool {
        *self.shared.state.borrow() == MapState::Disposed
    }

    fn fail(&self, err: MapError) -> MapError {
        error!("map bootstrap failed: {err}");
        let mut state = self.shared.state.borrow_mut();
        if *state != MapState::Disposed {
            *state = MapState::Failed(err.clone());
        }
        err
    }
}

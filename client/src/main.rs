mod app;
#[cfg(target_arch = "wasm32")]
mod gmaps;
mod labels;
mod lifecycle;
mod loader;
mod map_view;
mod ready;
mod registry;
mod sdk;
#[cfg(test)]
mod test_support;
mod timer;

#[cfg(not(target_arch = "wasm32"))]
mod gmaps {
    use std::rc::Rc;

    use futures::FutureExt;
    use futures::future::{LocalBoxFuture, ready};

    use fieldmap_shared::MapOptions;

    use crate::sdk::{MapSdk, MapWidget};

    #[derive(Debug, Clone, Copy, Default)]
    pub struct GoogleMapsSdk;

    impl MapSdk for GoogleMapsSdk {
        type Container = web_sys::HtmlElement;

        fn create_map(
            &self,
            _container: &web_sys::HtmlElement,
            _api_key: &str,
            _options: &MapOptions,
        ) -> LocalBoxFuture<'static, Result<Rc<dyn MapWidget>, String>> {
            ready(Err("not wasm".to_string())).boxed_local()
        }
    }
}

use leptos::mount::mount_to;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    let _ = console_log::init_with_level(log::Level::Info);

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop a previous mount if main() is re-entered so its effects stop.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}

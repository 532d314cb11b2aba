//! `FamilyTreeViewer`: the JavaScript-facing viewer class
//!
//! Wraps a [`ViewportController`] over the live DOM. The controller is shared
//! with event closures as `Rc<RefCell<_>>`; no borrow is ever held across an
//! await or while calling back into JavaScript.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Promise};
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{AddEventListenerOptions, EventTarget, MouseEvent, TouchEvent, TouchList, WheelEvent};

use super::browser::{BlobDownload, FetchImages, FetchLoader, PerformanceClock};
use super::helpers::{self, js_message, viewer_error};
use crate::config::ViewerConfig;
use crate::controller::{Clock, GraphicLoader, ViewportController};
use crate::directory::{populate_tree, MemberDirectory, StaticDirectory, YamlDirectory};
use crate::export::{self, FileSink};
use crate::graphic::dom::DomSurface;
use crate::models::PointerInput;
use crate::{wasm_error, wasm_info, wasm_log, wasm_warn};

type Shared<T> = Rc<RefCell<T>>;
type Controller = ViewportController<DomSurface>;

#[wasm_bindgen]
pub struct FamilyTreeViewer {
    controller: Shared<Controller>,
    directory: Shared<Box<dyn MemberDirectory>>,
    on_member_click: Shared<Option<Function>>,
    input_bound: Rc<Cell<bool>>,
    tick_timer: Rc<Cell<Option<i32>>>,
}

#[wasm_bindgen]
impl FamilyTreeViewer {
    /// Viewer for the container element `container_id`; `config` may be omitted
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, config: JsValue) -> Result<FamilyTreeViewer, JsValue> {
        let config: ViewerConfig = helpers::deserialize_or_default(config, "Invalid viewer config")?;
        config.validate().map_err(viewer_error)?;
        let surface = DomSurface::attach(container_id).map_err(|e| {
            wasm_error!("Family tree container not found: {}", e);
            viewer_error(e)
        })?;

        let controller = ViewportController::new(surface, config, Box::new(PerformanceClock));
        Ok(FamilyTreeViewer {
            controller: Rc::new(RefCell::new(controller)),
            directory: Rc::new(RefCell::new(Box::new(StaticDirectory::default()))),
            on_member_click: Rc::new(RefCell::new(None)),
            input_bound: Rc::new(Cell::new(false)),
            tick_timer: Rc::new(Cell::new(None)),
        })
    }

    /// Load the tree, fill in member data and start listening for input.
    ///
    /// Resolves to `true`, or rejects with the load error.
    pub fn init(&self, on_member_click: Option<Function>) -> Promise {
        *self.on_member_click.borrow_mut() = on_member_click;

        let controller = self.controller.clone();
        let directory = self.directory.clone();
        let callback = self.on_member_click.clone();
        let input_bound = self.input_bound.clone();

        future_to_promise(async move {
            let (tree_url, data_path) = {
                let c = controller.borrow();
                (c.config().tree_url.clone(), c.config().members_data_path.clone())
            };

            controller.borrow_mut().begin_load();
            let source = FetchLoader.fetch_text(&tree_url).await;
            controller.borrow_mut().complete_load(source).map_err(viewer_error)?;

            let loaded: Box<dyn MemberDirectory> = match YamlDirectory::load(&data_path, &FetchLoader).await {
                Ok(dir) if !dir.is_empty() => Box::new(dir),
                Ok(_) => {
                    wasm_warn!("No member records found, using placeholder data");
                    Box::new(StaticDirectory::placeholder(controller.borrow().member_ids().to_vec()))
                }
                Err(e) => {
                    wasm_warn!("Error loading member data: {}; using placeholder data", e);
                    Box::new(StaticDirectory::placeholder(controller.borrow().member_ids().to_vec()))
                }
            };
            {
                let mut ctrl = controller.borrow_mut();
                let member_class = ctrl.config().member_class.clone();
                if let Err(e) = populate_tree(ctrl.surface_mut(), loaded.as_ref(), &member_class) {
                    wasm_error!("Could not populate family tree: {}", e);
                }
            }
            *directory.borrow_mut() = loaded;

            if !input_bound.replace(true) {
                bind_input(&controller)?;
            }
            bind_member_clicks(&controller, &callback)?;
            wasm_info!("Family tree viewer ready");
            Ok(JsValue::TRUE)
        })
    }

    /// Center the member on the middle of the element `viewport_element_id`
    #[wasm_bindgen(js_name = panToMember)]
    pub fn pan_to_member(&self, id: &str, viewport_element_id: &str) -> Result<(), JsValue> {
        let (x, y) = viewport_center(viewport_element_id)?;
        self.focus_element(id, x, y)
    }

    #[wasm_bindgen(js_name = focusElement)]
    pub fn focus_element(&self, id: &str, x: f64, y: f64) -> Result<(), JsValue> {
        let result = self.controller.borrow_mut().focus_element(id, x, y);
        schedule_tick(&self.controller, &self.tick_timer);
        result.map_err(viewer_error)
    }

    /// Center the configured root member on `viewport_element_id`
    #[wasm_bindgen(js_name = resetToRoot)]
    pub fn reset_to_root(&self, viewport_element_id: &str) -> Result<(), JsValue> {
        let root = self.controller.borrow().config().root_member_id.clone();
        self.pan_to_member(&root, viewport_element_id)
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        self.controller.borrow_mut().reset_view();
    }

    #[wasm_bindgen(js_name = selectMember)]
    pub fn select_member(&self, id: &str) -> bool {
        self.controller.borrow_mut().select(id)
    }

    #[wasm_bindgen(js_name = deselectAll)]
    pub fn deselect_all(&self) -> u32 {
        self.controller.borrow_mut().deselect_all() as u32
    }

    /// Highlight for `duration_ms`, or the configured default
    #[wasm_bindgen(js_name = highlightMember)]
    pub fn highlight_member(&self, id: &str, duration_ms: Option<u32>) -> bool {
        let highlighted = {
            let mut ctrl = self.controller.borrow_mut();
            let duration = duration_ms.unwrap_or(ctrl.config().highlight_ms);
            ctrl.highlight(id, duration)
        };
        schedule_tick(&self.controller, &self.tick_timer);
        highlighted
    }

    /// Search by id or name; returns `{kind, value}`
    #[wasm_bindgen(js_name = findMember)]
    pub fn find_member(&self, query: &str) -> Result<JsValue, JsValue> {
        let outcome = self.directory.borrow().find_by_name(query);
        if let Some(message) = outcome.message() {
            wasm_log!("Search \"{}\": {}", query.trim(), message);
        }
        helpers::serialize(&outcome, "Failed to serialize search outcome")
    }

    /// Full record for the detail panel, or `null`
    #[wasm_bindgen(js_name = memberProfile)]
    pub fn member_profile(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.directory.borrow().record(id) {
            Some(record) => helpers::serialize(record, "Failed to serialize member profile"),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = memberIds)]
    pub fn member_ids(&self) -> Result<JsValue, JsValue> {
        helpers::serialize(&self.controller.borrow().member_ids(), "Failed to serialize member ids")
    }

    #[wasm_bindgen(js_name = getCamera)]
    pub fn camera(&self) -> Result<JsValue, JsValue> {
        helpers::serialize(&self.controller.borrow().camera(), "Failed to serialize camera")
    }

    /// Download the displayed tree as a standalone SVG
    #[wasm_bindgen(js_name = downloadSvg)]
    pub fn download_svg(&self, filename: Option<String>) -> Promise {
        let snapshot = {
            let ctrl = self.controller.borrow();
            ctrl.export_snapshot()
                .map(|markup| (markup, ctrl.config().clone()))
        };

        future_to_promise(async move {
            let (markup, config) = snapshot.map_err(|e| {
                wasm_error!("{}", e);
                viewer_error(e)
            })?;
            let filename = filename.unwrap_or_else(|| config.export_filename.clone());

            let exported = export::prepare_export(&markup, &config, &FetchImages, &filename)
                .await
                .map_err(|e| {
                    wasm_error!("Error downloading SVG: {}", e);
                    viewer_error(e)
                })?;
            BlobDownload
                .save(&exported.filename, export::SVG_MIME, &exported.markup)
                .map_err(|e| {
                    wasm_error!("Error downloading SVG: {}", e);
                    viewer_error(e)
                })?;
            wasm_info!("✓ Family tree SVG downloaded as \"{}\"", exported.filename);
            Ok(JsValue::TRUE)
        })
    }
}

fn listen<E>(
    target: &EventTarget,
    event: &str,
    passive: bool,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        closure.as_ref().unchecked_ref(),
        &options,
    )?;
    closure.forget();
    Ok(())
}

fn touch_points(list: &TouchList) -> Vec<(f64, f64)> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| (f64::from(t.client_x()), f64::from(t.client_y())))
        .collect()
}

fn set_cursor(controller: &Shared<Controller>, cursor: &str) {
    if let Err(e) = controller
        .borrow()
        .surface()
        .wrapper()
        .style()
        .set_property("cursor", cursor)
    {
        wasm_warn!("Could not set cursor: {}", js_message(&e));
    }
}

/// Wheel, mouse and touch listeners on the wrapper and document
fn bind_input(controller: &Shared<Controller>) -> Result<(), JsValue> {
    let (wrapper, document) = {
        let c = controller.borrow();
        (c.surface().wrapper().clone(), c.surface().document().clone())
    };

    {
        let controller = controller.clone();
        let target = wrapper.clone();
        listen(&wrapper, "wheel", false, move |e: WheelEvent| {
            e.prevent_default();
            let rect = target.get_bounding_client_rect();
            controller.borrow_mut().pan_zoom(PointerInput::Wheel {
                delta_y: e.delta_y(),
                x: f64::from(e.client_x()) - rect.left(),
                y: f64::from(e.client_y()) - rect.top(),
            });
        })?;
    }
    {
        let controller = controller.clone();
        listen(&wrapper, "mousedown", true, move |e: MouseEvent| {
            controller.borrow_mut().pan_zoom(PointerInput::PointerDown {
                x: f64::from(e.client_x()),
                y: f64::from(e.client_y()),
            });
            set_cursor(&controller, "grabbing");
        })?;
    }
    {
        let controller = controller.clone();
        listen(&document, "mousemove", true, move |e: MouseEvent| {
            controller.borrow_mut().pan_zoom(PointerInput::PointerMove {
                x: f64::from(e.client_x()),
                y: f64::from(e.client_y()),
            });
        })?;
    }
    {
        let controller = controller.clone();
        listen(&document, "mouseup", true, move |_e: MouseEvent| {
            controller.borrow_mut().pan_zoom(PointerInput::PointerUp);
            set_cursor(&controller, "grab");
        })?;
    }
    {
        let controller = controller.clone();
        listen(&wrapper, "touchstart", true, move |e: TouchEvent| {
            let touches = touch_points(&e.touches());
            controller.borrow_mut().pan_zoom(PointerInput::TouchStart { touches });
        })?;
    }
    {
        let controller = controller.clone();
        listen(&wrapper, "touchmove", false, move |e: TouchEvent| {
            e.prevent_default();
            let touches = touch_points(&e.touches());
            controller.borrow_mut().pan_zoom(PointerInput::TouchMove { touches });
        })?;
    }
    {
        let controller = controller.clone();
        listen(&wrapper, "touchend", true, move |_e: TouchEvent| {
            controller.borrow_mut().pan_zoom(PointerInput::TouchEnd);
        })?;
    }
    Ok(())
}

/// Click handlers on every member element of the mounted graphic
fn bind_member_clicks(controller: &Shared<Controller>, callback: &Shared<Option<Function>>) -> Result<(), JsValue> {
    let members: Vec<_> = {
        let c = controller.borrow();
        c.member_ids()
            .iter()
            .filter_map(|id| c.surface().element(id).map(|el| (id.clone(), el)))
            .collect()
    };

    for (id, element) in members {
        let controller = controller.clone();
        let callback = callback.clone();
        listen(&element, "click", true, move |_e: MouseEvent| {
            controller.borrow_mut().handle_member_click(&id);
            let handler = callback.borrow().clone();
            if let Some(f) = handler {
                if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(&id)) {
                    wasm_error!("Member click handler failed: {}", js_message(&e));
                }
            }
        })?;
    }
    Ok(())
}

/// Run `tick` when the controller's next deadline passes.
///
/// At most one timeout is pending; scheduling again replaces it.
fn schedule_tick(controller: &Shared<Controller>, timer: &Rc<Cell<Option<i32>>>) {
    let Some(window) = web_sys::window() else {
        wasm_error!("Could not schedule deferred work: no window");
        return;
    };
    if let Some(handle) = timer.take() {
        window.clear_timeout_with_handle(handle);
    }
    let Some(deadline) = controller.borrow().next_deadline() else {
        return;
    };
    let delay = (deadline - PerformanceClock.now_ms()).max(0.0).ceil() as i32;

    let run = {
        let controller = controller.clone();
        let timer = timer.clone();
        Closure::once_into_js(move || {
            timer.set(None);
            controller.borrow_mut().tick();
            schedule_tick(&controller, &timer);
        })
    };
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(run.unchecked_ref(), delay) {
        Ok(handle) => timer.set(Some(handle)),
        Err(e) => wasm_error!("Could not schedule deferred work: {}", js_message(&e)),
    }
}

/// Client-space center of the element `id`
fn viewport_center(id: &str) -> Result<(f64, f64), JsValue> {
    let element = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .ok_or_else(|| {
            let msg = format!("'{}' Id Not found.", id);
            wasm_error!("{}", msg);
            JsValue::from_str(&msg)
        })?;
    let rect = element.get_bounding_client_rect();
    Ok((rect.left() + rect.width() / 2.0, rect.top() + rect.height() / 2.0))
}

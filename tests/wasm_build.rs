//! WASM build test
//!
//! Checks that the viewer can be constructed in a browser and fails cleanly
//! without a container.

#![cfg(target_arch = "wasm32")]

use family_tree_wasm::api::FamilyTreeViewer;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn add_container(id: &str) {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document.create_element("div").unwrap();
    div.set_id(id);
    document.body().unwrap().append_child(&div).unwrap();
}

#[wasm_bindgen_test]
fn test_viewer_creation() {
    add_container("familyTreeContainer");
    let viewer = FamilyTreeViewer::new("familyTreeContainer", JsValue::UNDEFINED);
    assert!(viewer.is_ok());
}

#[wasm_bindgen_test]
fn test_missing_container() {
    let viewer = FamilyTreeViewer::new("no-such-container", JsValue::UNDEFINED);
    assert!(viewer.is_err());
}

#[wasm_bindgen_test]
fn test_nothing_selectable_before_init() {
    add_container("idleContainer");
    let viewer = FamilyTreeViewer::new("idleContainer", JsValue::NULL).unwrap();
    assert!(!viewer.select_member("MID-0001"));
    assert_eq!(viewer.deselect_all(), 0);
    assert!(viewer.focus_element("MID-0001", 0.0, 0.0).is_err());
}

#[wasm_bindgen_test]
fn test_invalid_config_rejected() {
    add_container("badConfigContainer");
    let config = js_sys::JSON::parse(r#"{"minScale": 2.0, "maxScale": 1.0}"#).unwrap();
    assert!(FamilyTreeViewer::new("badConfigContainer", config).is_err());
}

const SMALL_TREE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 300"><g id="A" class="member" transform="translate(50 50)"><rect width="100" height="40"/></g><g id="B" class="member" transform="translate(200 150)"><rect width="100" height="40"/></g></svg>"#;

fn inline_config(highlight_ms: u32) -> JsValue {
    let url = format!(
        "data:image/svg+xml,{}",
        String::from(js_sys::encode_uri_component(SMALL_TREE))
    );
    let json = format!(
        r#"{{"treeUrl": "{}", "membersDataPath": "/no-such-members/", "highlightMs": {}}}"#,
        url, highlight_ms
    );
    js_sys::JSON::parse(&json).unwrap()
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    wasm_bindgen_futures::JsFuture::from(promise).await.unwrap();
}

fn has_class(id: &str, class: &str) -> bool {
    web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .get_element_by_id(id)
        .map(|el| el.class_list().contains(class))
        .unwrap_or(false)
}

#[wasm_bindgen_test]
async fn test_repeated_highlight_expires_once() {
    add_container("timerContainer");
    let viewer = FamilyTreeViewer::new("timerContainer", inline_config(100)).unwrap();
    wasm_bindgen_futures::JsFuture::from(viewer.init(None)).await.unwrap();

    assert!(viewer.highlight_member("A", None));
    sleep(50).await;
    assert!(viewer.highlight_member("A", Some(200)));
    sleep(100).await;
    assert!(has_class("A", "highlight"));
    sleep(200).await;
    assert!(!has_class("A", "highlight"));
}

#[wasm_bindgen_test]
async fn test_click_callback_may_reinitialise_viewer() {
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    add_container("reentryContainer");
    let viewer = Rc::new(FamilyTreeViewer::new("reentryContainer", inline_config(3000)).unwrap());
    let clicked = Rc::new(Cell::new(0));

    let on_click = {
        let viewer = viewer.clone();
        let clicked = clicked.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |_id: JsValue| {
            clicked.set(clicked.get() + 1);
            let _ = viewer.init(None);
        })
    };
    let callback: js_sys::Function = on_click.as_ref().unchecked_ref::<js_sys::Function>().clone();
    on_click.forget();
    wasm_bindgen_futures::JsFuture::from(viewer.init(Some(callback))).await.unwrap();

    let member = web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .get_element_by_id("B")
        .unwrap();
    let click = web_sys::MouseEvent::new("click").unwrap();
    member.dispatch_event(&click).unwrap();

    assert_eq!(clicked.get(), 1);
    assert!(has_class("B", "selected"));
}

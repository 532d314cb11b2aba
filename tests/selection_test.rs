// Loading, focus, selection and highlight behaviour of the viewport controller

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{controller, loaded, FakeLoader, TREE};
use family_tree_wasm::graphic::GraphicSurface;
use family_tree_wasm::{PointerInput, ViewerError, ViewerState};
use futures::executor::block_on;

#[test]
fn test_focus_scenario() {
    let (mut ctrl, _) = loaded();
    assert_eq!(ctrl.member_ids(), ["A".to_string(), "B".to_string()]);

    ctrl.focus_element("A", 100.0, 100.0)
        .expect("focus on a member should succeed");

    let camera = ctrl.camera();
    assert_eq!(camera.scale, 1.0);
    // bbox (0,0)-(200,50) centered at (100,25), moved by translate(100 100)
    assert_eq!((camera.translate_x, camera.translate_y), (-100.0, -25.0));
    assert!(ctrl.is_selected("A"));
    assert!(ctrl.is_highlighted("A"));
    assert!(!ctrl.is_selected("B"));
    assert!(!ctrl.is_highlighted("B"));
    assert_eq!(ctrl.deselect_all(), 1);
}

#[test]
fn test_focus_resets_scale() {
    let (mut ctrl, _) = loaded();
    for _ in 0..5 {
        ctrl.pan_zoom(PointerInput::Wheel { delta_y: -1.0, x: 10.0, y: 10.0 });
    }
    assert!(ctrl.camera().scale > 1.5);

    ctrl.focus_element("B", 0.0, 0.0).expect("focus should succeed");
    assert_eq!(ctrl.camera().scale, 1.0);
    assert_eq!(ctrl.surface().last_transition(), Some("transform 0.8s ease-out"));
}

#[test]
fn test_focus_missing_element_changes_nothing() {
    let (mut ctrl, _) = loaded();
    ctrl.pan_zoom(PointerInput::Wheel { delta_y: -1.0, x: 10.0, y: 10.0 });
    ctrl.select("B");
    let before = ctrl.camera();

    assert_eq!(
        ctrl.focus_element("nobody", 50.0, 50.0),
        Err(ViewerError::ElementNotFound("nobody".to_string()))
    );
    assert_eq!(ctrl.camera(), before);
    assert!(ctrl.is_selected("B"));
    assert_eq!(ctrl.pending_tasks(), 0);
}

#[test]
fn test_focus_before_load() {
    let (mut ctrl, _) = controller();
    assert_eq!(ctrl.focus_element("A", 0.0, 0.0), Err(ViewerError::NotLoaded));
}

#[test]
fn test_deselect_then_select_leaves_one() {
    let (mut ctrl, _) = loaded();
    assert!(ctrl.select("A"));
    assert!(ctrl.select("B"));
    assert!(ctrl.select("A"));

    assert_eq!(ctrl.deselect_all(), 2);
    assert!(ctrl.select("B"));
    let selected: Vec<_> = ctrl.surface().ids_with_class("selected");
    assert_eq!(selected, vec!["B".to_string()]);
}

#[test]
fn test_select_only_members() {
    let (mut ctrl, _) = loaded();
    assert!(!ctrl.select("frame"), "non-member elements are not selectable");
    assert!(!ctrl.select("missing"));
    assert!(!ctrl.select("  "));
    assert!(!ctrl.is_selected("frame"));
}

#[test]
fn test_highlight_restart_keeps_one_timer() {
    let (mut ctrl, clock) = loaded();
    assert!(ctrl.highlight("A", 3000));
    clock.advance(2000.0);
    assert!(ctrl.highlight("A", 3000));

    assert_eq!(ctrl.pending_tasks(), 1);
    assert_eq!(ctrl.surface().reflow_count(), 1);
    let tree = ctrl.surface().tree().expect("tree mounted");
    let node = tree.find_by_id("A").expect("member A");
    let classes: Vec<_> = tree.element(node).expect("element").classes().collect();
    assert_eq!(classes.iter().filter(|&&c| c == "highlight").count(), 1);

    // the first deadline passes without clearing the restarted highlight
    clock.advance(1500.0);
    ctrl.tick();
    assert!(ctrl.is_highlighted("A"));

    clock.advance(1500.0);
    assert_eq!(ctrl.tick(), 1);
    assert!(!ctrl.is_highlighted("A"));
    assert_eq!(ctrl.pending_tasks(), 0);
}

#[test]
fn test_highlights_expire_independently() {
    let (mut ctrl, clock) = loaded();
    ctrl.highlight("A", 1000);
    ctrl.highlight("B", 2000);
    assert_eq!(ctrl.next_deadline(), Some(1000.0));

    clock.set(1000.0);
    ctrl.tick();
    assert!(!ctrl.is_highlighted("A"));
    assert!(ctrl.is_highlighted("B"));

    clock.set(2000.0);
    ctrl.tick();
    assert!(!ctrl.is_highlighted("B"));
}

#[test]
fn test_focus_highlight_uses_default_duration() {
    let (mut ctrl, clock) = loaded();
    ctrl.focus_element("A", 0.0, 0.0).expect("focus should succeed");

    clock.advance(800.0);
    assert_eq!(ctrl.tick(), 1, "settle runs first");
    assert_eq!(ctrl.surface().last_transition(), Some("transform 0.1s ease-out"));
    assert!(ctrl.is_highlighted("A"));

    clock.advance(2200.0);
    assert_eq!(ctrl.tick(), 1);
    assert!(!ctrl.is_highlighted("A"));
    assert!(ctrl.is_selected("A"), "selection outlives the highlight");
}

#[test]
fn test_member_click() {
    let (mut ctrl, _) = loaded();
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let seen = clicks.clone();
    ctrl.on_member_click(Box::new(move |id| seen.borrow_mut().push(id.to_string())));

    ctrl.select("A");
    assert!(ctrl.handle_member_click("B"));
    assert!(!ctrl.is_selected("A"));
    assert!(ctrl.is_selected("B"));
    assert!(!ctrl.handle_member_click(""));
    assert_eq!(*clicks.borrow(), vec!["B".to_string()]);
}

#[test]
fn test_load_through_loader() {
    let (mut ctrl, _) = controller();
    let loader = FakeLoader::default().with("tree.svg", TREE);

    block_on(ctrl.load(&loader, "tree.svg")).expect("load should succeed");
    assert_eq!(ctrl.state(), ViewerState::Ready);
    assert_eq!(ctrl.member_ids().len(), 2);
    assert_eq!(*loader.requests.borrow(), vec!["tree.svg".to_string()]);
}

#[test]
fn test_first_load_failure_shows_message() {
    let (mut ctrl, _) = controller();
    let loader = FakeLoader::default();

    let err = block_on(ctrl.load(&loader, "missing.svg")).expect_err("404 should fail");
    assert!(matches!(err, ViewerError::FetchFailed { .. }));
    assert_eq!(ctrl.state(), ViewerState::Unloaded);
    assert_eq!(
        ctrl.surface().error_message(),
        Some("Error loading family tree. Check console.")
    );
}

#[test]
fn test_failed_reload_keeps_graphic() {
    let (mut ctrl, _) = loaded();
    ctrl.select("A");

    ctrl.begin_load();
    assert_eq!(ctrl.state(), ViewerState::Loading);
    let err = ctrl
        .complete_load(Ok("<html><body>not a tree</body></html>".to_string()))
        .expect_err("non-svg markup should be rejected");
    assert!(matches!(err, ViewerError::InvalidGraphic(_)));

    assert_eq!(ctrl.state(), ViewerState::Ready);
    assert_eq!(ctrl.member_ids().len(), 2);
    assert!(ctrl.is_selected("A"));
    assert_eq!(ctrl.surface().error_message(), None);
}

#[test]
fn test_reload_resets_gesture_and_tasks() {
    let (mut ctrl, _) = loaded();
    ctrl.pan_zoom(PointerInput::PointerDown { x: 5.0, y: 5.0 });
    ctrl.highlight("A", 500);
    assert!(ctrl.gesture().dragging);

    ctrl.begin_load();
    ctrl.complete_load(Ok(TREE.to_string())).expect("reload should succeed");
    assert!(!ctrl.gesture().dragging);
    assert_eq!(ctrl.pending_tasks(), 0);
    assert!(!ctrl.is_highlighted("A"));
}

/// Controller with `markup` loaded
fn loaded_with(markup: &str) -> common::TestController {
    let (mut ctrl, _) = controller();
    ctrl.begin_load();
    ctrl.complete_load(Ok(markup.to_string()))
        .expect("markup should load");
    ctrl
}

const ODD_GEOMETRY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 800 600">
  <g id="dash" class="member" transform="translate(100 100)"><path d="M10 10 LMINUS5 20"/></g>
  <g id="nbsp" class="member" transform="translate(10NBSP20)"><rect width="20" height="10"/></g>
  <g id="empty" class="member" transform="translate(50 60)"/>
  <g id="mixed" class="member" transform="translate(0 0) wobble(3)"><circle cx="5" cy="5" r="5"/></g>
</svg>"#;

fn odd_geometry() -> String {
    ODD_GEOMETRY.replace("MINUS", "\u{2212}").replace("NBSP", "\u{a0}")
}

#[test]
fn test_focus_path_with_non_ascii_minus() {
    let mut ctrl = loaded_with(&odd_geometry());
    // The path is read up to its first bad command, leaving the point (10, 10)
    ctrl.focus_element("dash", 0.0, 0.0)
        .expect("focus should succeed");
    let camera = ctrl.camera();
    assert_eq!((camera.translate_x, camera.translate_y), (-110.0, -110.0));
    assert!(ctrl.is_selected("dash"));
}

#[test]
fn test_focus_with_unparsable_transform_uses_identity() {
    let mut ctrl = loaded_with(&odd_geometry());

    ctrl.focus_element("nbsp", 0.0, 0.0).expect("focus should succeed");
    let camera = ctrl.camera();
    assert_eq!((camera.translate_x, camera.translate_y), (-10.0, -5.0));

    ctrl.focus_element("mixed", 0.0, 0.0).expect("focus should succeed");
    let camera = ctrl.camera();
    assert_eq!((camera.translate_x, camera.translate_y), (-5.0, -5.0));
    assert!(ctrl.is_highlighted("mixed"));
}

#[test]
fn test_focus_empty_group_centers_on_its_origin() {
    let mut ctrl = loaded_with(&odd_geometry());
    ctrl.focus_element("empty", 400.0, 300.0)
        .expect("focus should succeed");
    let camera = ctrl.camera();
    assert_eq!((camera.translate_x, camera.translate_y), (350.0, 240.0));
    assert!(ctrl.is_selected("empty"));
}

#[test]
fn test_odd_geometry_members_all_focusable() {
    let mut ctrl = loaded_with(&odd_geometry());
    assert_eq!(ctrl.member_ids().len(), 4);
    for id in ctrl.member_ids().to_vec() {
        assert!(ctrl.focus_element(&id, 0.0, 0.0).is_ok(), "focus {}", id);
    }
    assert!(matches!(
        ctrl.focus_element("missing", 0.0, 0.0),
        Err(ViewerError::ElementNotFound(_))
    ));
}

#[test]
fn test_memory_ctm_excludes_root_view_box_scale() {
    let ctrl = loaded_with(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 800 600">
  <g id="A" class="member" transform="translate(100 100)"><rect width="10" height="10"/></g>
</svg>"#,
    );
    let ctm = ctrl.surface().ctm("A").expect("member has a ctm");
    assert_eq!(ctm.as_coeffs(), [1.0, 0.0, 0.0, 1.0, 100.0, 100.0]);
}

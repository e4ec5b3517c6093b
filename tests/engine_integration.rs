/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Integration tests for `ShowcaseEngine` driving a `Page`.
//!
//! Every test builds its own page with list-section markup, mounts the
//! engine, and drives it through clicks, key presses, frame load signals and
//! the virtual clock. Nothing touches the network or a real browser.

use std::cell::RefCell;
use std::rc::Rc;

use website_showcase::{
    ClickOutcome, Document, Layout, NodeId, Page, PopupState, Selector, SettingsOverride,
    ShowcaseConfig, ShowcaseEngine, ShowcaseEvent, ShowcaseOptions, EDIT_MODE_CLASS,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const ORIGIN: &str = "https://studio.example.com/work";
const SECTION_ID: &str = "website-showcase-1";

const ACME_PAYLOAD: &str = r#"{"userItems":[
    {"title":"Acme","description":"<p>Co</p>","button":{"buttonLink":"/work/acme","buttonText":"View"}}
]}"#;

const THREE_PAYLOAD: &str = r#"{
    "userItems": [
        {"title": "One", "description": "", "button": {"buttonLink": "https://one.example.org", "buttonText": "Open one"}},
        {"title": "Two", "description": "<em>2</em>", "button": {"buttonLink": "/two", "buttonText": "Open two"}},
        {"title": "Three", "description": "", "button": {"buttonLink": "/three", "buttonText": "Open three"}}
    ],
    "options": {"customOptions": {"customTitleFontSize": {"value": 2.4, "unit": "rem"}}}
}"#;

/// Build a page with one carousel section holding `item_count` items.
fn section_page(payload: Option<&str>, item_count: usize) -> (Page, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let wrapper = doc.append_element(body, "div", &[]);
    doc.set_attribute(wrapper, "id", "siteWrapper");
    let root = doc.append_element(wrapper, "section", &["page-section"]);
    doc.set_attribute(root, "id", SECTION_ID);
    doc.set_attribute(root, "data-section-theme", "bright");

    let container = doc.append_element(root, "div", &["user-items-list-item-container"]);
    if let Some(payload) = payload {
        doc.set_attribute(container, "data-current-context", payload);
    }
    for _ in 0..item_count {
        let item = doc.append_element(container, "li", &["list-item"]);
        let media = doc.append_element(item, "div", &["user-items-list-carousel__media-container"]);
        let inner = doc.append_element(media, "div", &["user-items-list-carousel__media-inner"]);
        doc.append_element(inner, "img", &[]);
    }
    (Page::with_document(ORIGIN, doc).unwrap(), root)
}

fn engine_with(config: ShowcaseConfig) -> ShowcaseEngine {
    ShowcaseEngine::new(ShowcaseOptions::default(), config)
}

fn mounted(payload: Option<&str>, item_count: usize) -> (Page, ShowcaseEngine, NodeId) {
    let (mut page, root) = section_page(payload, item_count);
    let mut engine = engine_with(ShowcaseConfig::new());
    engine.mount(&mut page);
    (page, engine, root)
}

/// Collect event names delivered to every instance mounted afterwards.
fn record_events(engine: &mut ShowcaseEngine) -> Rc<RefCell<Vec<ShowcaseEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    engine.on_event(Rc::new(move |event: &ShowcaseEvent| {
        sink.borrow_mut().push(event.clone());
    }));
    seen
}

fn overlays(page: &Page, root: NodeId) -> Vec<NodeId> {
    page.document()
        .query_selector_all(root, &Selector::class("wm-showcase-overlay"))
}

fn popups(page: &Page) -> Vec<NodeId> {
    let doc = page.document();
    doc.query_selector_all(doc.root(), &Selector::class("wm-showcase-popup"))
}

fn find(page: &Page, scope: NodeId, class: &str) -> NodeId {
    page.document()
        .query_selector(scope, &Selector::class(class))
        .unwrap_or_else(|| panic!("no .{class} under scope"))
}

fn open_first(page: &mut Page, engine: &mut ShowcaseEngine, root: NodeId) -> NodeId {
    let overlay = overlays(page, root)[0];
    engine.click(page, overlay).unwrap();
    engine.instance(root).unwrap().popup().element().unwrap()
}

// ---------------------------------------------------------------------------
// Group 1: Overlay binding
// ---------------------------------------------------------------------------

#[test]
fn test_cloned_items_bind_by_modulo() {
    let (page, _engine, root) = mounted(Some(THREE_PAYLOAD), 7);
    let overlays = overlays(&page, root);
    assert_eq!(overlays.len(), 7);

    let titles: Vec<String> = overlays
        .iter()
        .map(|o| page.document().attribute(*o, "data-item-title").unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["One", "Two", "Three", "One", "Two", "Three", "One"]
    );
}

#[test]
fn test_rebinding_is_idempotent() {
    let (mut page, mut engine, root) = mounted(Some(THREE_PAYLOAD), 3);
    assert_eq!(engine.rebind(&mut page), 0);
    assert_eq!(engine.rebind(&mut page), 0);
    assert_eq!(overlays(&page, root).len(), 3);

    let doc = page.document();
    for media in doc.query_selector_all(root, &Selector::class("wm-showcase-media")) {
        assert_eq!(
            doc.query_selector_all(media, &Selector::class("wm-showcase-overlay"))
                .len(),
            1
        );
    }
}

#[test]
fn test_rebind_covers_fresh_clones() {
    let (mut page, mut engine, root) = mounted(Some(THREE_PAYLOAD), 3);
    let container = find(&page, root, "user-items-list-item-container");

    // A clone made before binding carries no overlay.
    let doc = page.document_mut();
    let blank = doc.append_element(container, "li", &["list-item"]);
    doc.append_element(blank, "div", &["user-items-list__media-inner"]);
    // A clone of a bound item already carries one.
    let first_item = doc.query_selector(container, &Selector::class("list-item")).unwrap();
    let copy = doc.clone_subtree(first_item).unwrap();
    doc.append_child(container, copy);

    assert_eq!(engine.rebind(&mut page), 1);
    assert_eq!(overlays(&page, root).len(), 5);
}

#[test]
fn test_zero_records_create_no_overlays() {
    let (page, engine, root) = mounted(Some(r#"{"userItems": []}"#), 4);
    assert!(overlays(&page, root).is_empty());
    assert!(engine.instance(root).unwrap().data().records.is_empty());
}

#[test]
fn test_bad_record_does_not_block_other_items() {
    let payload = r#"{"userItems": [
        {"title": "Good", "button": {"buttonLink": "/good", "buttonText": "Go"}},
        {"title": 2024, "button": {"buttonLink": "/year", "buttonText": 7}}
    ]}"#;
    let (page, _engine, root) = mounted(Some(payload), 2);
    let overlays = overlays(&page, root);
    assert_eq!(overlays.len(), 2);

    let doc = page.document();
    assert_eq!(doc.attribute(overlays[0], "data-item-title").as_deref(), Some("Good"));
    assert_eq!(doc.attribute(overlays[1], "data-item-title").as_deref(), Some("2024"));
    assert_eq!(doc.attribute(overlays[1], "data-button-text").as_deref(), Some("7"));
}

#[test]
fn test_unusable_font_size_keeps_overlays() {
    let payload = r#"{
        "userItems": [{"title": "Acme", "button": {"buttonLink": "/work/acme"}}],
        "options": {"customOptions": {"customTitleFontSize": {"unit": "rem"}}}
    }"#;
    let (mut page, mut engine, root) = mounted(Some(payload), 1);
    assert_eq!(overlays(&page, root).len(), 1);

    let popup = open_first(&mut page, &mut engine, root);
    assert_eq!(page.document().style(popup, "--popup-info-title-size"), None);
}

#[test]
fn test_missing_payload_still_stamps_root() {
    let (page, engine, root) = mounted(None, 2);
    assert!(overlays(&page, root).is_empty());
    let doc = page.document();
    assert_eq!(
        doc.attribute(root, "data-wm-plugin").as_deref(),
        Some("website-showcase")
    );
    assert_eq!(doc.attribute(root, "data-wm-layout").as_deref(), Some("basic"));
    assert_eq!(engine.instances().len(), 1);
}

#[test]
fn test_broken_section_does_not_affect_others() {
    let (mut page, _) = section_page(Some("{ nope"), 2);
    let body = page.document().body();
    let doc = page.document_mut();
    let second = doc.append_element(body, "section", &[]);
    doc.set_attribute(second, "id", "website-showcase-2");
    let container = doc.append_element(second, "div", &["user-items-list-item-container"]);
    doc.set_attribute(container, "data-current-context", ACME_PAYLOAD);
    let item = doc.append_element(container, "div", &["user-items-list-simple__item"]);
    doc.append_element(item, "div", &["user-items-list-simple__media-inner"]);

    let mut engine = engine_with(ShowcaseConfig::new());
    assert_eq!(engine.mount(&mut page), 2);
    assert_eq!(overlays(&page, second).len(), 1);
}

// ---------------------------------------------------------------------------
// Group 2: Opening
// ---------------------------------------------------------------------------

#[test]
fn test_overlay_click_opens_resolved_popup() {
    let (mut page, root) = section_page(Some(ACME_PAYLOAD), 1);
    let mut engine = engine_with(ShowcaseConfig::new().with_section(
        SECTION_ID,
        SettingsOverride {
            layout: Some(Layout::Info),
            ..Default::default()
        },
    ));
    let events = record_events(&mut engine);
    engine.mount(&mut page);

    // Click lands on the overlay's text span, not the overlay itself.
    let overlay = overlays(&page, root)[0];
    let span = find(&page, overlay, "wm-showcase-overlay-text");
    let outcome = engine.click(&mut page, span).unwrap();
    assert_eq!(
        outcome,
        ClickOutcome {
            handled: true,
            default_prevented: true,
            propagation_stopped: true,
        }
    );

    let instance = engine.instance(root).unwrap();
    let popup = instance.popup().element().unwrap();
    let doc = page.document();
    let frame = find(&page, popup, "wm-showcase-iframe");
    assert_eq!(
        doc.attribute(frame, "src").as_deref(),
        Some("https://studio.example.com/work/acme")
    );
    let title = find(&page, popup, "wm-showcase-popup-info-title");
    assert_eq!(doc.text_content(title), "Acme");
    let description = find(&page, popup, "wm-showcase-popup-info-description");
    assert_eq!(doc.inner_html(description), "<p>Co</p>");

    // Popup lives beside the section, not inside it.
    let wrapper = doc.element_by_id("siteWrapper").unwrap();
    assert_eq!(doc.parent(popup), Some(wrapper));
    assert!(!doc.contains(root, popup));
    assert_eq!(
        doc.attribute(popup, "data-section-theme").as_deref(),
        Some("bright")
    );
    assert!(page.is_scroll_locked());

    assert!(matches!(
        events.borrow().last(),
        Some(ShowcaseEvent::PopupOpen { url, title, .. })
            if url == "/work/acme" && title == "Acme"
    ));
}

#[test]
fn test_visible_class_added_on_next_frame() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let instance_state = |engine: &ShowcaseEngine| engine.instance(root).unwrap().popup_state();

    assert_eq!(instance_state(&engine), PopupState::Opening);
    assert!(!page.document().has_class(popup, "wm-showcase-popup--visible"));

    engine.advance_time(&mut page, 16);
    assert_eq!(instance_state(&engine), PopupState::Loading);
    assert!(page.document().has_class(popup, "wm-showcase-popup--visible"));
}

#[test]
fn test_second_open_replaces_first() {
    let (mut page, _) = section_page(Some(THREE_PAYLOAD), 3);
    let mut engine = engine_with(ShowcaseConfig::new());
    let events = record_events(&mut engine);
    engine.mount(&mut page);
    let root = engine.instances()[0].root();
    let items = overlays(&page, root);

    engine.click(&mut page, items[0]).unwrap();
    engine.advance_time(&mut page, 16);
    engine.click(&mut page, items[1]).unwrap();

    let all = popups(&page);
    assert_eq!(all.len(), 1);
    let frame = find(&page, all[0], "wm-showcase-iframe");
    assert_eq!(
        page.document().attribute(frame, "src").as_deref(),
        Some("https://studio.example.com/two")
    );

    let names: Vec<&str> = events.borrow().iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "wm-website-showcase:beforeInit",
            "wm-website-showcase:afterInit",
            "wm-website-showcase:popupOpen",
            "wm-website-showcase:popupClose",
            "wm-website-showcase:popupOpen",
        ]
    );

    // The replaced popup's scroll lock was released on teardown.
    engine.key_down(&mut page, "Escape");
    engine.advance_time(&mut page, 300);
    assert!(!page.is_scroll_locked());
    assert!(popups(&page).is_empty());
}

#[test]
fn test_font_size_overrides_become_popup_variables() {
    let (mut page, mut engine, root) = mounted(Some(THREE_PAYLOAD), 3);
    let popup = open_first(&mut page, &mut engine, root);
    let doc = page.document();
    assert_eq!(doc.style(popup, "--popup-info-title-size"), Some("2.4rem"));
    assert_eq!(doc.style(popup, "--popup-info-description-size"), None);
}

#[test]
fn test_popup_without_site_wrapper_goes_to_body() {
    let mut doc = Document::new();
    let body = doc.body();
    let root = doc.append_element(body, "div", &[]);
    doc.set_attribute(root, "id", "website-showcase-simple");
    let container = doc.append_element(root, "div", &["user-items-list-item-container"]);
    doc.set_attribute(container, "data-current-context", ACME_PAYLOAD);
    let item = doc.append_element(container, "div", &["preFade"]);
    doc.append_element(item, "div", &["list-item-media-container"]);
    let mut page = Page::with_document(ORIGIN, doc).unwrap();

    let mut engine = engine_with(ShowcaseConfig::new());
    engine.mount(&mut page);
    let popup = open_first(&mut page, &mut engine, root);
    assert_eq!(page.document().parent(popup), Some(page.document().body()));
}

// ---------------------------------------------------------------------------
// Group 3: Load detection
// ---------------------------------------------------------------------------

#[test]
fn test_fast_load_is_treated_as_blocked() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");

    engine.advance_time(&mut page, 80);
    let state = engine.frame_loaded(&mut page, frame).unwrap();
    assert_eq!(state, Some(PopupState::Blocked));

    let doc = page.document();
    let loader = find(&page, popup, "wm-showcase-popup-loader");
    let error = find(&page, popup, "wm-showcase-popup-error");
    assert_eq!(doc.style(loader, "display"), Some("none"));
    assert_eq!(doc.style(error, "z-index"), Some("2"));
}

#[test]
fn test_slow_load_is_treated_as_loaded() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");

    engine.advance_time(&mut page, 900);
    let state = engine.frame_loaded(&mut page, frame).unwrap();
    assert_eq!(state, Some(PopupState::Loaded));

    let doc = page.document();
    let loader = find(&page, popup, "wm-showcase-popup-loader");
    let error = find(&page, popup, "wm-showcase-popup-error");
    assert_eq!(doc.style(loader, "display"), Some("none"));
    assert_eq!(doc.style(error, "z-index"), None);
}

#[test]
fn test_threshold_boundary_and_tuning() {
    let (mut page, root) = section_page(Some(ACME_PAYLOAD), 1);
    let mut engine = ShowcaseEngine::new(
        ShowcaseOptions {
            load_block_threshold_ms: 50,
            ..Default::default()
        },
        ShowcaseConfig::new(),
    );
    engine.mount(&mut page);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");

    engine.advance_time(&mut page, 50);
    assert_eq!(
        engine.frame_loaded(&mut page, frame).unwrap(),
        Some(PopupState::Loaded)
    );
}

#[test]
fn test_frame_error_is_blocked() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");

    engine.advance_time(&mut page, 2000);
    assert_eq!(
        engine.frame_failed(&mut page, frame).unwrap(),
        Some(PopupState::Blocked)
    );
    let error = find(&page, popup, "wm-showcase-popup-error");
    assert_eq!(page.document().style(error, "z-index"), Some("2"));
}

#[test]
fn test_load_from_replaced_frame_is_ignored() {
    let (mut page, mut engine, root) = mounted(Some(THREE_PAYLOAD), 3);
    let items = overlays(&page, root);
    engine.click(&mut page, items[0]).unwrap();
    let old_frame = engine.instance(root).unwrap().popup().frame().unwrap();
    engine.click(&mut page, items[1]).unwrap();

    engine.advance_time(&mut page, 500);
    assert_eq!(engine.frame_loaded(&mut page, old_frame).unwrap(), None);
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Loading
    );
}

#[test]
fn test_load_before_first_frame_still_reveals() {
    let (mut page, root) = section_page(Some(ACME_PAYLOAD), 1);
    let mut engine = ShowcaseEngine::new(
        ShowcaseOptions {
            load_block_threshold_ms: 0,
            ..Default::default()
        },
        ShowcaseConfig::new(),
    );
    engine.mount(&mut page);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");

    assert_eq!(
        engine.frame_loaded(&mut page, frame).unwrap(),
        Some(PopupState::Loaded)
    );
    engine.advance_time(&mut page, 16);
    assert!(page.document().has_class(popup, "wm-showcase-popup--visible"));
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Loaded
    );
}

// ---------------------------------------------------------------------------
// Group 4: Closing
// ---------------------------------------------------------------------------

#[test]
fn test_escape_removes_popup_after_close_delay() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    engine.advance_time(&mut page, 500);

    assert!(engine.key_down(&mut page, "Escape"));
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Closing
    );
    assert!(!page.document().has_class(popup, "wm-showcase-popup--visible"));

    engine.advance_time(&mut page, 299);
    assert!(page.document().is_connected(popup));
    assert!(page.is_scroll_locked());

    engine.advance_time(&mut page, 1);
    assert!(!page.document().is_connected(popup));
    assert!(!page.is_scroll_locked());
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Closed
    );
}

#[test]
fn test_backdrop_click_matches_escape() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    engine.advance_time(&mut page, 500);

    let backdrop = find(&page, popup, "wm-showcase-popup-backdrop");
    let outcome = engine.click(&mut page, backdrop).unwrap();
    assert!(outcome.handled);
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Closing
    );
    engine.advance_time(&mut page, 300);
    assert!(!page.document().is_connected(popup));
    assert!(popups(&page).is_empty());
}

#[test]
fn test_close_button_icon_click_closes() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let close = find(&page, popup, "wm-showcase-popup-close");
    engine.click(&mut page, close).unwrap();
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Closing
    );
}

#[test]
fn test_click_inside_content_does_not_close() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let popup = open_first(&mut page, &mut engine, root);
    let frame = find(&page, popup, "wm-showcase-iframe");
    let outcome = engine.click(&mut page, frame).unwrap();
    assert!(!outcome.handled);
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Opening
    );
}

#[test]
fn test_close_without_popup_is_silent() {
    let (mut page, _) = section_page(Some(ACME_PAYLOAD), 1);
    let mut engine = engine_with(ShowcaseConfig::new());
    let events = record_events(&mut engine);
    engine.mount(&mut page);
    let before = page.document().to_html();

    assert!(!engine.key_down(&mut page, "Escape"));
    assert_eq!(page.document().to_html(), before);
    assert!(events
        .borrow()
        .iter()
        .all(|e| !matches!(e, ShowcaseEvent::PopupClose { .. })));
}

#[test]
fn test_repeated_close_is_a_no_op() {
    let (mut page, _) = section_page(Some(ACME_PAYLOAD), 1);
    let mut engine = engine_with(ShowcaseConfig::new());
    let events = record_events(&mut engine);
    engine.mount(&mut page);
    let root = engine.instances()[0].root();
    let popup = open_first(&mut page, &mut engine, root);
    let backdrop = find(&page, popup, "wm-showcase-popup-backdrop");

    engine.click(&mut page, backdrop).unwrap();
    engine.advance_time(&mut page, 100);
    // Escape listener is already gone; a second backdrop click is ignored.
    assert!(!engine.key_down(&mut page, "Escape"));
    engine.click(&mut page, backdrop).unwrap();
    engine.advance_time(&mut page, 1000);

    let closes = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, ShowcaseEvent::PopupClose { .. }))
        .count();
    assert_eq!(closes, 1);
    assert!(page.pending_tasks().is_empty());
    assert!(!page.is_scroll_locked());
}

#[test]
fn test_other_keys_are_ignored() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    open_first(&mut page, &mut engine, root);
    assert!(!engine.key_down(&mut page, "Enter"));
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Opening
    );
}

#[test]
fn test_reopen_during_close_animation() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let first = open_first(&mut page, &mut engine, root);
    engine.key_down(&mut page, "Escape");
    engine.advance_time(&mut page, 100);

    let second = open_first(&mut page, &mut engine, root);
    assert!(!page.document().is_connected(first));
    assert_eq!(popups(&page), vec![second]);

    // The first popup's pending removal must not touch the second.
    engine.advance_time(&mut page, 250);
    assert!(page.document().is_connected(second));
    assert!(page.is_scroll_locked());
    assert_eq!(
        engine.instance(root).unwrap().popup_state(),
        PopupState::Loading
    );
}

// ---------------------------------------------------------------------------
// Group 5: Multiple instances and teardown
// ---------------------------------------------------------------------------

fn two_section_page() -> (Page, NodeId, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let mut roots = Vec::new();
    for id in ["website-showcase-a", "website-showcase-b"] {
        let root = doc.append_element(body, "section", &[]);
        doc.set_attribute(root, "id", id);
        let container = doc.append_element(root, "div", &["user-items-list-item-container"]);
        doc.set_attribute(container, "data-current-context", ACME_PAYLOAD);
        let item = doc.append_element(container, "div", &["list-item"]);
        doc.append_element(item, "div", &["list-item-media-inner"]);
        roots.push(root);
    }
    (Page::with_document(ORIGIN, doc).unwrap(), roots[0], roots[1])
}

#[test]
fn test_per_section_settings() {
    let (mut page, a, b) = two_section_page();
    let config = ShowcaseConfig::from_json(r#"{"website-showcase-b": {"layout": "info"}}"#).unwrap();
    let mut engine = engine_with(config);
    engine.mount(&mut page);

    assert_eq!(engine.instance(a).unwrap().settings().layout, Layout::Basic);
    assert_eq!(engine.instance(b).unwrap().settings().layout, Layout::Info);
    assert_eq!(
        page.document().attribute(b, "data-wm-layout").as_deref(),
        Some("info")
    );
}

#[test]
fn test_scroll_lock_held_until_last_popup_closes() {
    let (mut page, a, b) = two_section_page();
    let mut engine = engine_with(ShowcaseConfig::new());
    engine.mount(&mut page);

    open_first(&mut page, &mut engine, a);
    let popup_b = open_first(&mut page, &mut engine, b);
    assert_eq!(popups(&page).len(), 2);

    let backdrop = find(&page, popup_b, "wm-showcase-popup-backdrop");
    engine.click(&mut page, backdrop).unwrap();
    engine.advance_time(&mut page, 300);
    assert!(page.is_scroll_locked());
    assert_eq!(engine.instance(a).unwrap().popup_state(), PopupState::Loading);

    assert!(engine.key_down(&mut page, "Escape"));
    engine.advance_time(&mut page, 300);
    assert!(!page.is_scroll_locked());
}

#[test]
fn test_edit_mode_tears_down_framed_page_once() {
    let (mut page, a, b) = two_section_page();
    page.set_framed(true);
    let mut engine = engine_with(ShowcaseConfig::new());
    let events = record_events(&mut engine);
    engine.mount(&mut page);
    assert!(engine.is_edit_mode_armed());
    let popup = open_first(&mut page, &mut engine, a);

    // Unrelated body change: nothing happens.
    assert!(!engine.notify_body_changed(&mut page));

    let body = page.document().body();
    page.document_mut().add_class(body, EDIT_MODE_CLASS);
    assert!(engine.notify_body_changed(&mut page));
    assert!(!engine.is_edit_mode_armed());
    assert!(!engine.notify_body_changed(&mut page));

    let doc = page.document();
    for root in [a, b] {
        assert!(overlays(&page, root).is_empty());
        assert!(doc.query_selector(root, &Selector::class("wm-showcase-media")).is_none());
        assert!(!doc.has_attribute(root, "data-wm-plugin"));
        assert!(!doc.has_attribute(root, "data-wm-layout"));
        assert!(engine.instance(root).unwrap().is_destroyed());
    }

    let destroys = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, ShowcaseEvent::Destroy { .. }))
        .count();
    assert_eq!(destroys, 2);

    // The open popup finishes its close animation.
    engine.advance_time(&mut page, 300);
    assert!(!page.document().is_connected(popup));
    assert!(!page.is_scroll_locked());
}

#[test]
fn test_edit_mode_ignored_on_top_level_page() {
    let (mut page, a, _) = two_section_page();
    let mut engine = engine_with(ShowcaseConfig::new());
    engine.mount(&mut page);
    let body = page.document().body();
    page.document_mut().add_class(body, EDIT_MODE_CLASS);
    assert!(!engine.notify_body_changed(&mut page));
    assert_eq!(overlays(&page, a).len(), 1);
}

#[test]
fn test_destroyed_instance_ignores_overlay_clicks() {
    let (mut page, mut engine, root) = mounted(Some(ACME_PAYLOAD), 1);
    let item = find(&page, root, "list-item");
    engine.teardown_all(&mut page);

    // Even a stray overlay left in the markup no longer opens anything.
    let stray = page.document_mut().append_element(item, "div", &["wm-showcase-overlay"]);
    let outcome = engine.click(&mut page, stray).unwrap();
    assert_eq!(outcome, ClickOutcome::default());
    assert!(popups(&page).is_empty());
    assert_eq!(engine.rebind(&mut page), 0);
}

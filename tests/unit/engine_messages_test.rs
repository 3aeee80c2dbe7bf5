//! Unit tests for inbound engine message handling.

#[path = "../common/mod.rs"]
mod common;

use serde_json::json;

use common::{BridgeCall, Harness};
use fennec_tabs::managers::tab_registry::NewTab;
use fennec_tabs::types::errors::MessageError;
use fennec_tabs::types::events::TabEvent;
use fennec_tabs::types::message::{EngineEnvelope, EngineMessage, LoadFlags, NavigationState};
use fennec_tabs::types::tab::{LoadState, Lifecycle};

fn send(h: &Harness, value: serde_json::Value) -> Result<(), MessageError> {
    h.registry.handle_message(&value.to_string())
}

// ─── parsing ───

#[test]
fn test_envelope_defaults_to_current_version() {
    let envelope: EngineEnvelope =
        serde_json::from_str(r#"{"type":"Tab:Select","tabID":4}"#).unwrap();
    assert_eq!(envelope.version, 1);
    assert_eq!(envelope.message, EngineMessage::TabSelect { tab_id: 4 });
    assert_eq!(envelope.message.tab_id(), Some(4));
}

#[test]
fn test_state_change_parses_lowercase_state() {
    let envelope: EngineEnvelope = serde_json::from_str(
        r#"{"type":"Content:StateChange","tabID":1,"state":"stop","success":true}"#,
    )
    .unwrap();
    assert_eq!(
        envelope.message,
        EngineMessage::StateChange {
            tab_id: 1,
            state: NavigationState::Stop,
            success: true,
            uri: None
        }
    );
}

#[test]
fn test_restore_end_has_no_tab() {
    let envelope: EngineEnvelope =
        serde_json::from_str(r#"{"type":"Session:RestoreEnd"}"#).unwrap();
    assert_eq!(envelope.message, EngineMessage::SessionRestoreEnd);
    assert_eq!(envelope.message.tab_id(), None);
}

#[test]
fn test_malformed_messages_are_rejected() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));

    for raw in [
        "not json",
        r#"{"type":"Tab:Select"}"#,
        r#"{"type":"Tab:Explode","tabID":1}"#,
        r#"{"tabID":1}"#,
        r#"{"type":"Tab:Move","tabID":1,"index":"first"}"#,
    ] {
        let result = h.registry.handle_message(raw);
        assert!(
            matches!(result, Err(MessageError::Malformed(_))),
            "{raw} should be malformed"
        );
    }
    h.settle();
    assert!(h.listener.events().is_empty());
}

#[test]
fn test_unsupported_version_is_rejected() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    let result = send(&h, json!({"version": 2, "type": "Tab:Select", "tabID": 1}));

    assert!(matches!(result, Err(MessageError::UnsupportedVersion(2))));
    assert!(h.registry.selected_tab().is_none());
}

#[test]
fn test_unknown_tab_is_dropped() {
    let h = Harness::new();
    let result = send(&h, json!({"type": "DOMTitleChanged", "tabID": 77, "title": "x"}));
    h.settle();

    assert!(matches!(result, Err(MessageError::UnknownTab(77))));
    assert!(h.listener.events().is_empty());
}

#[test]
fn test_handle_json_accepts_parsed_values() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry
        .handle_json(json!({"type": "Tab:Select", "tabID": 1}))
        .unwrap();
    assert!(h.registry.is_selected(1));
}

// ─── tab lifecycle ───

#[test]
fn test_stub_confirmation_opens_tab() {
    let h = Harness::new();
    let tab = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .unwrap();
    assert_eq!(tab.lifecycle(), Lifecycle::Stub);

    send(&h, json!({"type": "Tab:Added", "tabID": tab.id(), "stub": true})).unwrap();

    assert_eq!(tab.lifecycle(), Lifecycle::Open);
    assert_eq!(h.registry.len(), 1);
}

#[test]
fn test_stub_confirmation_for_closed_tab_is_dropped() {
    let h = Harness::new();
    let result = send(&h, json!({"type": "Tab:Added", "tabID": 8, "stub": true}));
    assert!(matches!(result, Err(MessageError::UnknownTab(8))));
    assert!(h.registry.is_empty());
}

#[test]
fn test_engine_created_tab_is_registered() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    send(
        &h,
        json!({
            "type": "Tab:Added",
            "tabID": 20,
            "uri": "https://engine.example/",
            "title": "Engine",
            "parentId": 1,
            "isPrivate": true,
            "selected": true,
            "desktopMode": true,
            "tabIndex": 0
        }),
    )
    .unwrap();
    h.settle();

    let tab = h.registry.get_tab(20).expect("engine tab registered");
    assert_eq!(tab.lifecycle(), Lifecycle::Open);
    assert!(tab.is_private());
    assert!(tab.desktop_mode());
    assert_eq!(tab.parent_id(), Some(1));
    assert_eq!(tab.title(), "Engine");
    assert_eq!(h.registry.snapshot().ids(), vec![20, 1]);
    assert!(h.registry.is_selected(20));
    assert_eq!(
        h.listener.events(),
        vec![
            (Some(1), TabEvent::Added),
            (Some(20), TabEvent::Added),
            (Some(20), TabEvent::Selected)
        ]
    );

    let local = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .unwrap();
    assert!(local.id() > 20);
}

#[test]
fn test_engine_added_delayed_tab() {
    let h = Harness::new();
    send(
        &h,
        json!({"type": "Tab:Added", "tabID": 3, "uri": "https://a.example/", "delayLoad": true}),
    )
    .unwrap();
    let tab = h.registry.get_tab(3).unwrap();
    assert_eq!(tab.load_state(), LoadState::Delayed);
    assert!(h.registry.selected_tab().is_none());
}

#[test]
fn test_engine_added_with_unset_parent_and_index() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    send(
        &h,
        json!({
            "type": "Tab:Added",
            "tabID": 5,
            "uri": "https://a.example/",
            "parentId": -1,
            "tabIndex": -1
        }),
    )
    .unwrap();

    let tab = h.registry.get_tab(5).expect("engine tab registered");
    assert_eq!(tab.parent_id(), None);
    assert_eq!(h.registry.snapshot().ids(), vec![1, 5]);
}

#[test]
fn test_stub_confirmation_keeps_background_tab_unselected() {
    let h = Harness::new();
    let front = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .unwrap();
    let background = h
        .registry
        .load_url(
            "https://b.example/",
            None,
            None,
            None,
            LoadFlags::NEW_TAB | LoadFlags::BACKGROUND,
        )
        .unwrap();
    h.settle();
    h.listener.clear();

    send(
        &h,
        json!({"type": "Tab:Added", "tabID": background.id(), "stub": true, "selected": true}),
    )
    .unwrap();
    h.settle();

    assert_eq!(background.lifecycle(), Lifecycle::Open);
    assert!(h.registry.is_selected(front.id()));
    assert_eq!(h.listener.count(TabEvent::Selected), 0);
}

#[test]
fn test_engine_close_hands_selection_over() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry.add_tab(NewTab::new(2, None));
    h.registry.select_tab(2);
    h.bridge.clear();

    send(&h, json!({"type": "Tab:Close", "tabID": 2, "showUndoToast": true})).unwrap();

    assert_eq!(h.registry.snapshot().ids(), vec![1]);
    assert!(h.registry.is_selected(1));
    assert_eq!(
        h.bridge.calls(),
        vec![BridgeCall::Selected(1), BridgeCall::Closed(2, true)]
    );
}

#[test]
fn test_engine_select_and_move() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry.add_tab(NewTab::new(2, None));

    send(&h, json!({"type": "Tab:Select", "tabID": 2})).unwrap();
    send(&h, json!({"type": "Tab:Move", "tabID": 2, "index": 0})).unwrap();

    assert!(h.registry.is_selected(2));
    assert_eq!(h.registry.snapshot().ids(), vec![2, 1]);
}

#[test]
fn test_restore_end_finishes_restore() {
    let h = Harness::restoring(std::time::Duration::from_secs(60));
    send(&h, json!({"type": "Session:RestoreEnd"})).unwrap();
    h.settle();

    assert!(!h.registry.is_restoring());
    assert_eq!(h.listener.events(), vec![(None, TabEvent::Restored)]);
}

// ─── content ───

#[test]
fn test_navigation_updates_tab_state() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, Some("https://a.example/")));
    h.settle();
    h.listener.clear();

    send(
        &h,
        json!({"type": "Content:StateChange", "tabID": 1, "state": "start", "uri": "https://b.example/"}),
    )
    .unwrap();
    let tab = h.registry.get_tab(1).unwrap();
    assert_eq!(tab.load_state(), LoadState::Loading);
    assert_eq!(tab.url().as_deref(), Some("https://b.example/"));

    send(&h, json!({"type": "Content:LocationChange", "tabID": 1, "uri": "https://b.example/"}))
        .unwrap();
    send(&h, json!({"type": "DOMContentLoaded", "tabID": 1, "bgColor": "#ffffff"})).unwrap();
    send(&h, json!({"type": "DOMTitleChanged", "tabID": 1, "title": "B"})).unwrap();
    send(&h, json!({"type": "Content:PageShow", "tabID": 1})).unwrap();
    send(
        &h,
        json!({"type": "Content:StateChange", "tabID": 1, "state": "stop", "success": true}),
    )
    .unwrap();
    h.settle();

    assert_eq!(tab.load_state(), LoadState::Success);
    assert_eq!(tab.title(), "B");
    assert_eq!(tab.background_color().as_deref(), Some("#ffffff"));
    assert_eq!(
        h.listener.seen(),
        vec![
            (Some(1), TabEvent::Start, Some("https://b.example/".to_string())),
            (
                Some(1),
                TabEvent::LocationChange,
                Some("https://b.example/".to_string())
            ),
            (Some(1), TabEvent::Loaded, None),
            (Some(1), TabEvent::Title, Some("B".to_string())),
            (Some(1), TabEvent::PageShow, None),
            (Some(1), TabEvent::Stop, None),
        ]
    );
}

#[test]
fn test_failed_load_sets_error_state() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    let tab = h.registry.get_tab(1).unwrap();

    send(&h, json!({"type": "Content:StateChange", "tabID": 1, "state": "stop"})).unwrap();
    assert_eq!(tab.load_state(), LoadState::Error);

    send(&h, json!({"type": "Content:LoadError", "tabID": 1})).unwrap();
    h.settle();
    assert_eq!(tab.load_state(), LoadState::Error);
    assert_eq!(h.listener.count(TabEvent::LoadError), 1);
}

#[test]
fn test_location_change_clears_favicons_only_for_new_document() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, Some("https://a.example/page")));
    let tab = h.registry.get_tab(1).unwrap();

    send(
        &h,
        json!({"type": "Link:Favicon", "tabID": 1, "href": "https://a.example/icon.png", "size": 16}),
    )
    .unwrap();
    send(
        &h,
        json!({"type": "Link:Favicon", "tabID": 1, "href": "https://a.example/big.png", "size": 64}),
    )
    .unwrap();
    assert_eq!(tab.favicons().len(), 2);
    assert_eq!(
        tab.best_favicon().map(|f| f.href).as_deref(),
        Some("https://a.example/big.png")
    );

    send(
        &h,
        json!({"type": "Content:LocationChange", "tabID": 1, "uri": "https://a.example/page#section"}),
    )
    .unwrap();
    assert_eq!(tab.favicons().len(), 2);

    send(&h, json!({"type": "Content:LocationChange", "tabID": 1, "uri": "https://c.example/"}))
        .unwrap();
    assert!(tab.favicons().is_empty());
    assert_eq!(tab.url().as_deref(), Some("https://c.example/"));
}

#[test]
fn test_desktop_mode_change() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, None));
    send(&h, json!({"type": "DesktopMode:Changed", "tabID": 1, "desktopMode": true})).unwrap();
    h.settle();

    assert!(h.registry.get_tab(1).unwrap().desktop_mode());
    assert_eq!(h.listener.count(TabEvent::DesktopModeChange), 1);
}

//! Unit tests for TabRegistry::load_url: flag handling, tab creation and
//! application-id reuse.

#[path = "../common/mod.rs"]
mod common;

use common::Harness;
use fennec_tabs::managers::tab_registry::NewTab;
use fennec_tabs::types::events::TabEvent;
use fennec_tabs::types::message::{IntentContext, LoadFlags};
use fennec_tabs::types::tab::{LoadState, Lifecycle};

fn intent(app_id: &str, create_new_tab: bool) -> IntentContext {
    IntentContext {
        application_id: Some(app_id.to_string()),
        create_new_tab,
    }
}

#[test]
fn test_new_private_background_tab() {
    let h = Harness::new();
    let tab = h
        .registry
        .load_url(
            "https://a.example/",
            None,
            None,
            None,
            LoadFlags::NEW_TAB | LoadFlags::PRIVATE | LoadFlags::BACKGROUND,
        )
        .expect("a tab is created");
    h.settle();

    assert!(tab.is_private());
    assert_eq!(tab.lifecycle(), Lifecycle::Stub);
    assert!(h.registry.selected_tab().is_none());
    assert_eq!(h.listener.events(), vec![(Some(tab.id()), TabEvent::Added)]);

    let loads = h.bridge.loads();
    assert_eq!(loads.len(), 1);
    let request = &loads[0];
    assert_eq!(request.url, "https://a.example/");
    assert!(request.new_tab);
    assert!(request.is_private);
    assert!(!request.selected);
    assert!(!request.delay_load);
    assert_eq!(request.tab_id, Some(tab.id()));
}

#[test]
fn test_new_foreground_tab_is_selected() {
    let h = Harness::new();
    let tab = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .expect("a tab is created");
    h.settle();

    assert!(h.registry.is_selected(tab.id()));
    assert_eq!(
        h.listener.events(),
        vec![
            (Some(tab.id()), TabEvent::Added),
            (Some(tab.id()), TabEvent::Selected)
        ]
    );
    assert!(h.bridge.loads()[0].selected);
}

#[test]
fn test_delay_load_implies_background() {
    let h = Harness::new();
    let tab = h
        .registry
        .load_url(
            "https://a.example/",
            None,
            None,
            None,
            LoadFlags::NEW_TAB | LoadFlags::DELAY_LOAD,
        )
        .expect("a tab is created");

    assert_eq!(tab.load_state(), LoadState::Delayed);
    assert!(h.registry.selected_tab().is_none());
    let request = &h.bridge.loads()[0];
    assert!(request.delay_load);
    assert!(!request.selected);
}

#[test]
fn test_plain_load_creates_nothing_but_notifies_engine() {
    let h = Harness::new();
    let result = h.registry.load_url(
        "https://a.example/",
        Some("duckduckgo"),
        None,
        None,
        LoadFlags::USER_ENTERED,
    );

    assert!(result.is_none());
    assert!(h.registry.is_empty());
    let loads = h.bridge.loads();
    assert_eq!(loads.len(), 1);
    assert!(!loads[0].new_tab);
    assert!(loads[0].user_entered);
    assert_eq!(loads[0].engine.as_deref(), Some("duckduckgo"));
    assert_eq!(loads[0].tab_id, None);
}

#[test]
fn test_stub_url_only_for_absolute_uris() {
    let h = Harness::new();
    let search = h
        .registry
        .load_url("rust ownership", None, None, None, LoadFlags::NEW_TAB)
        .expect("a tab is created");
    let page = h
        .registry
        .load_url("https://b.example/", None, None, None, LoadFlags::NEW_TAB)
        .expect("a tab is created");

    assert_eq!(search.url(), None);
    assert_eq!(search.title(), "rust ownership");
    assert_eq!(page.url().as_deref(), Some("https://b.example/"));
}

#[test]
fn test_flags_flow_into_tab_and_request() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(1, Some("https://parent.example/")));
    let tab = h
        .registry
        .load_url(
            "https://a.example/",
            None,
            Some(1),
            None,
            LoadFlags::NEW_TAB | LoadFlags::DESKTOP | LoadFlags::EXTERNAL | LoadFlags::PINNED,
        )
        .expect("a tab is created");

    assert!(tab.desktop_mode());
    assert!(tab.is_external());
    assert_eq!(tab.parent_id(), Some(1));

    let request = &h.bridge.loads()[0];
    assert!(request.desktop_mode);
    assert!(request.pinned);
    assert_eq!(request.parent_id, Some(1));
}

#[test]
fn test_application_id_reuses_open_tab() {
    let h = Harness::new();
    let first = h
        .registry
        .load_url(
            "https://a.example/",
            None,
            None,
            Some(&intent("org.example.mail", false)),
            LoadFlags::BACKGROUND,
        )
        .expect("the first app load creates a tab");
    assert_eq!(first.application_id().as_deref(), Some("org.example.mail"));
    assert!(h.registry.selected_tab().is_none());
    h.bridge.clear();

    let reused = h
        .registry
        .load_url(
            "https://b.example/",
            None,
            None,
            Some(&intent("org.example.mail", false)),
            LoadFlags::NEW_TAB | LoadFlags::DELAY_LOAD,
        )
        .expect("the open tab is reused");

    assert_eq!(reused.id(), first.id());
    assert_eq!(h.registry.len(), 1);
    assert!(h.registry.is_selected(first.id()));

    let request = &h.bridge.loads()[0];
    assert!(!request.new_tab);
    assert!(!request.delay_load);
    assert!(request.selected);
    assert_eq!(request.tab_id, Some(first.id()));
}

#[test]
fn test_application_id_forced_new_tab() {
    let h = Harness::new();
    let app = intent("org.example.reader", false);
    let first = h
        .registry
        .load_url("https://a.example/", None, None, Some(&app), LoadFlags::empty())
        .expect("a tab is created");
    let second = h
        .registry
        .load_url(
            "https://b.example/",
            None,
            None,
            Some(&intent("org.example.reader", true)),
            LoadFlags::empty(),
        )
        .expect("a fresh tab is forced");

    assert_ne!(first.id(), second.id());
    assert_eq!(h.registry.len(), 2);
}

#[test]
fn test_home_pages_get_builtin_favicon() {
    let h = Harness::new();
    let home = h.registry.add_tab_for_home(false).expect("home tab");
    let page = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .expect("a tab is created");

    let icon = home.best_favicon().expect("home tab has an icon");
    assert_eq!(icon.size, Some(32));
    assert!(page.favicons().is_empty());
}

#[test]
fn test_private_home_tab() {
    let h = Harness::new();
    let home = h.registry.add_tab_for_home(true).expect("home tab");
    assert!(home.is_private());
    assert_eq!(home.url().as_deref(), Some(h.registry.homepage()));
}

#[test]
fn test_local_ids_skip_engine_ids() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(10, None));
    let tab = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB)
        .expect("a tab is created");
    assert!(tab.id() > 10);
}

#[test]
fn test_new_tab_refused_once_ids_run_out() {
    let h = Harness::new();
    h.registry.add_tab(NewTab::new(u32::MAX, Some("https://last.example/")));

    let tab = h
        .registry
        .load_url("https://a.example/", None, None, None, LoadFlags::NEW_TAB);

    assert!(tab.is_none());
    assert_eq!(h.registry.len(), 1);
    assert!(h.bridge.loads().is_empty());
    let last = h.registry.get_tab(u32::MAX).expect("existing tab kept");
    assert_eq!(last.url().as_deref(), Some("https://last.example/"));
}

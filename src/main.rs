//! Tab host demo.
//!
//! Runs the registry against an in-memory database and prints the engine
//! notices and tab events a short browsing session produces.

use std::io;
use std::sync::Arc;

use fennec_tabs::app::App;
use fennec_tabs::database::Database;
use fennec_tabs::managers::bookmark_manager::{BookmarkManagerTrait, SavedKind};
use fennec_tabs::managers::session_manager::SessionManagerTrait;
use fennec_tabs::services::engine_bridge::JsonLinesBridge;
use fennec_tabs::services::settings_engine::SettingsEngine;
use fennec_tabs::types::events::TabEvent;
use fennec_tabs::types::message::LoadFlags;
use fennec_tabs::types::tab::Tab;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::temp_dir().join("fennec-tabs-demo").join("settings.json");
    let db = Arc::new(Database::open_in_memory()?);
    let bridge = Arc::new(JsonLinesBridge::new(io::stdout()));
    let app = App::new(SettingsEngine::new(Some(settings_path)), db, bridge)?;

    app.registry.add_listener(Arc::new(
        |tab: Option<&Arc<Tab>>, event: TabEvent, data: Option<&str>| match tab {
            Some(tab) => println!("  [event] {:?} tab={} {}", event, tab.id(), data.unwrap_or("")),
            None => println!("  [event] {:?}", event),
        },
    ));

    section("Start-up");
    app.startup()?;
    app.registry.flush_notifications();

    section("Open tabs");
    let news = app
        .registry
        .load_url("https://news.example", None, None, None, LoadFlags::NEW_TAB | LoadFlags::USER_ENTERED);
    let private = app.registry.load_url(
        "https://private.example",
        None,
        None,
        None,
        LoadFlags::NEW_TAB | LoadFlags::PRIVATE | LoadFlags::BACKGROUND,
    );
    app.registry.flush_notifications();

    section("Engine messages");
    if let Some(news) = &news {
        let id = news.id();
        for raw in [
            format!(r#"{{"type":"Tab:Added","tabID":{id},"uri":"https://news.example","stub":true}}"#),
            format!(r#"{{"type":"Content:StateChange","tabID":{id},"state":"start"}}"#),
            format!(r#"{{"type":"DOMTitleChanged","tabID":{id},"title":"News"}}"#),
            format!(r#"{{"type":"Content:StateChange","tabID":{id},"state":"stop","success":true}}"#),
            r#"{"type":"Tab:Added""#.to_string(),
        ] {
            if let Err(e) = app.registry.handle_message(&raw) {
                println!("  dropped: {}", e);
            }
        }
    }
    app.registry.flush_notifications();

    section("Bookmarks");
    app.bookmarks.add("https://news.example", "News", SavedKind::Bookmark)?;
    app.registry.flush_notifications();

    section("Close tabs");
    if let Some(private) = &private {
        app.registry.close_tab_default(private);
    }
    if let Some(news) = &news {
        app.registry.close_tab_default(news);
    }
    app.registry.flush_notifications();

    section("Shutdown");
    app.shutdown()?;
    if let Some(session) = app.sessions.restore_session()? {
        println!("  saved {} tabs in session {}", session.tabs.len(), session.id);
    }
    Ok(())
}

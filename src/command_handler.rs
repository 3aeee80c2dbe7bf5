//! UI command handler for the tab host JSON-lines protocol.
//!
//! Split from `bridge_server.rs` so it can be unit-tested. `handle_method`
//! dispatches one command to the registry or the bookmark store.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::{BookmarkManagerTrait, SavedKind};
use crate::types::message::{IntentContext, LoadFlags};
use crate::types::tab::{Tab, TabId};

/// JSON view of a tab for command responses.
pub fn tab_json(tab: &Tab, selected: bool) -> Value {
    json!({
        "id": tab.id(),
        "url": tab.url(),
        "title": tab.display_title(),
        "private": tab.is_private(),
        "parent_id": tab.parent_id(),
        "load_state": tab.load_state(),
        "lifecycle": tab.lifecycle(),
        "desktop_mode": tab.desktop_mode(),
        "favicon": tab.best_favicon().map(|f| f.href),
        "bookmarked": tab.is_bookmarked(),
        "selected": selected,
    })
}

fn tab_id_param(params: &Value, key: &str) -> Result<TabId, String> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| TabId::try_from(v).ok())
        .ok_or_else(|| format!("missing {}", key))
}

fn parse_flags(params: &Value) -> Result<LoadFlags, String> {
    let Some(names) = params.get("flags") else {
        return Ok(LoadFlags::empty());
    };
    let names = names.as_array().ok_or("flags must be an array")?;
    names.iter().try_fold(LoadFlags::empty(), |flags, name| -> Result<LoadFlags, String> {
        let name = name.as_str().ok_or("flag names must be strings")?;
        LoadFlags::from_name(name)
            .map(|flag| flags | flag)
            .ok_or_else(|| format!("unknown flag: {}", name))
    })
}

fn maybe_tab(app: &App, tab: Option<Arc<Tab>>) -> Value {
    match tab {
        Some(tab) => tab_json(&tab, app.registry.is_selected(tab.id())),
        None => Value::Null,
    }
}

/// Dispatch a command to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    let registry = &app.registry;
    match method {
        // ─── Tabs ───
        "tabs.load" => {
            let url = params.get("url").and_then(Value::as_str).ok_or("missing url")?;
            let engine = params.get("engine").and_then(Value::as_str);
            let parent_id = params
                .get("parent_id")
                .and_then(Value::as_u64)
                .and_then(|v| TabId::try_from(v).ok());
            let flags = parse_flags(params)?;
            let intent = params
                .get("application_id")
                .and_then(Value::as_str)
                .map(|app_id| IntentContext {
                    application_id: Some(app_id.to_string()),
                    create_new_tab: params
                        .get("create_new_tab")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                });
            let tab = registry.load_url(url, engine, parent_id, intent.as_ref(), flags);
            Ok(maybe_tab(app, tab))
        }
        "tabs.select" => {
            let id = tab_id_param(params, "id")?;
            if registry.get_tab(id).is_none() {
                return Err(format!("unknown tab: {}", id));
            }
            let changed = registry.select_tab(id).is_some();
            Ok(json!({"changed": changed}))
        }
        "tabs.close" => {
            let id = tab_id_param(params, "id")?;
            let tab = registry.get_tab(id).ok_or_else(|| format!("unknown tab: {}", id))?;
            let undo = params
                .get("show_undo_toast")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let next = registry.get_next_tab(&tab);
            registry.close_tab(&tab, next, undo);
            Ok(maybe_tab(app, registry.selected_tab()))
        }
        "tabs.close_private" => {
            registry.close_all_private_tabs();
            Ok(json!({"count": registry.len()}))
        }
        "tabs.move" => {
            let id = tab_id_param(params, "id")?;
            let index = params
                .get("index")
                .and_then(Value::as_u64)
                .ok_or("missing index")? as usize;
            if !registry.move_tab(id, index) {
                return Err(format!("unknown tab: {}", id));
            }
            Ok(json!(registry.snapshot().ids()))
        }
        "tabs.list" => {
            let selected = registry.selected_tab().map(|t| t.id());
            let arr: Vec<Value> = registry
                .tabs()
                .iter()
                .map(|t| tab_json(t, Some(t.id()) == selected))
                .collect();
            Ok(json!(arr))
        }
        "tabs.selected" => Ok(maybe_tab(app, registry.selected_tab())),
        "tabs.persist" => {
            registry.persist_now().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Bookmarks ───
        "bookmarks.add" | "bookmarks.remove" => {
            let url = params.get("url").and_then(Value::as_str).ok_or("missing url")?;
            let kind = if params
                .get("reading_list")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                SavedKind::ReadingList
            } else {
                SavedKind::Bookmark
            };
            if method == "bookmarks.add" {
                let title = params.get("title").and_then(Value::as_str).unwrap_or(url);
                app.bookmarks.add(url, title, kind).map_err(|e| e.to_string())?;
            } else {
                app.bookmarks.remove(url, kind).map_err(|e| e.to_string())?;
            }
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}

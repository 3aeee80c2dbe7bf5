//! Tab host bridge: JSON-lines over stdin/stdout between the engine, the UI
//! shell and the tab registry.
//!
//! Protocol: one JSON object per line.
//! Engine message: {"type":"Tab:Added","tabID":3,"uri":"https://..."}
//! UI command:     {"id":1, "method":"tabs.load", "params":{"url":"...","flags":["NEW_TAB"]}}
//! Response:       {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Engine notices: {"event":"Tab:Load", ...} written by the registry's bridge.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use fennec_tabs::app::App;
use fennec_tabs::command_handler::handle_method;
use fennec_tabs::platform;
use fennec_tabs::services::engine_bridge::JsonLinesBridge;

use serde_json::{json, Value};

fn respond(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
        log::error!("stdout closed; response lost");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = platform::get_data_dir();
    let bridge = Arc::new(JsonLinesBridge::new(io::stdout()));
    let app = match App::open(&data_dir, bridge) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to start tab host: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match app.startup() {
        Ok(restored) => log::info!("Started with {} restored tabs", restored),
        Err(e) => log::error!("Session restore failed: {}", e),
    }

    respond(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                respond(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        if message.get("type").is_some() {
            // Engine notifications are fire-and-forget; failures are logged inside.
            let _ = app.registry.handle_json(message);
            continue;
        }

        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let method = message.get("method").and_then(Value::as_str).unwrap_or("");
        let params = message.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        respond(&response);
    }

    if let Err(e) = app.shutdown() {
        log::error!("Failed to save tabs on shutdown: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

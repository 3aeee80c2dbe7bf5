//! Outbound channel from the tab registry to the browser engine.
//!
//! The registry calls these hooks while it holds its mutation lock, so an
//! implementation must not call back into the registry synchronously.

use std::io::Write;

use parking_lot::Mutex;

use crate::types::message::{LoadRequest, OutboundMessage};
use crate::types::tab::TabId;

/// Notices the registry sends to the engine.
pub trait EngineBridge: Send + Sync {
    /// A tab became the selected tab.
    fn tab_selected(&self, tab_id: TabId);
    /// Navigate, possibly in a new tab. Sent for every `load_url` call.
    fn load_requested(&self, request: &LoadRequest);
    /// A tab was closed on the UI side.
    fn tab_closed(&self, tab_id: TabId, show_undo_toast: bool);
}

/// Discards everything. Useful when no engine is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl EngineBridge for NullBridge {
    fn tab_selected(&self, _tab_id: TabId) {}
    fn load_requested(&self, _request: &LoadRequest) {}
    fn tab_closed(&self, _tab_id: TabId, _show_undo_toast: bool) {}
}

/// Writes each notice as one JSON object per line.
pub struct JsonLinesBridge<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesBridge<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the writer, e.g. to inspect a buffer in tests.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn send(&self, message: &OutboundMessage) {
        let line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to encode engine notice {:?}: {}", message, e);
                return;
            }
        };
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            log::error!("Failed to write engine notice: {}", e);
        }
    }
}

impl<W: Write + Send> EngineBridge for JsonLinesBridge<W> {
    fn tab_selected(&self, tab_id: TabId) {
        self.send(&OutboundMessage::TabSelected { tab_id });
    }

    fn load_requested(&self, request: &LoadRequest) {
        self.send(&OutboundMessage::TabLoad(request.clone()));
    }

    fn tab_closed(&self, tab_id: TabId, show_undo_toast: bool) {
        self.send(&OutboundMessage::TabClosed {
            tab_id,
            show_undo_toast,
        });
    }
}

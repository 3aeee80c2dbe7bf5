//! Typed messages exchanged with the browser engine.
//!
//! Inbound notifications arrive as one JSON object per message, tagged by a
//! `type` field and wrapped in a versioned envelope. They are validated here,
//! at the boundary, so the registry only ever sees well-formed variants.

use bitflags::bitflags;
use serde::{de, Deserialize, Deserializer, Serialize};

use super::tab::TabId;

/// Envelope version this build understands.
pub const PROTOCOL_VERSION: u32 = 1;

fn default_version() -> u32 {
    PROTOCOL_VERSION
}

/// The engine writes `-1` for "no parent" and "append".
fn negative_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match Option::<i64>::deserialize(deserializer)? {
        Some(value) if value >= 0 => T::try_from(value)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("value out of range: {}", value))),
        _ => Ok(None),
    }
}

bitflags! {
    /// Options for [`TabRegistry::load_url`](crate::managers::tab_registry::TabRegistry::load_url).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LoadFlags: u32 {
        const NEW_TAB = 1 << 0;
        const PRIVATE = 1 << 1;
        const DESKTOP = 1 << 2;
        const EXTERNAL = 1 << 3;
        const BACKGROUND = 1 << 4;
        /// Create the tab but let the engine defer the load. Implies BACKGROUND.
        const DELAY_LOAD = 1 << 5;
        const USER_ENTERED = 1 << 6;
        const PINNED = 1 << 7;
    }
}

/// The launching context of a load request, when it came from another app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentContext {
    pub application_id: Option<String>,
    /// The caller insists on a fresh tab even if one exists for its app.
    #[serde(default)]
    pub create_new_tab: bool,
}

/// Arguments sent to the engine for every `load_url` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub url: String,
    pub engine: Option<String>,
    pub parent_id: Option<TabId>,
    pub user_entered: bool,
    pub is_private: bool,
    pub pinned: bool,
    pub desktop_mode: bool,
    pub new_tab: bool,
    pub delay_load: bool,
    pub selected: bool,
    #[serde(rename = "tabID")]
    pub tab_id: Option<TabId>,
}

/// Navigation phase reported by `Content:StateChange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationState {
    Start,
    Stop,
}

/// Versioned wrapper around every inbound engine message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEnvelope {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub message: EngineMessage,
}

/// Notifications the engine sends about tabs it hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineMessage {
    #[serde(rename = "Tab:Added", rename_all = "camelCase")]
    TabAdded {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        uri: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, deserialize_with = "negative_as_none")]
        parent_id: Option<TabId>,
        #[serde(default)]
        external: bool,
        #[serde(default)]
        is_private: bool,
        /// The tab was created locally by `load_url` and is being confirmed.
        #[serde(default)]
        stub: bool,
        #[serde(default)]
        selected: bool,
        #[serde(default)]
        delay_load: bool,
        #[serde(default)]
        desktop_mode: bool,
        #[serde(default, deserialize_with = "negative_as_none")]
        tab_index: Option<usize>,
    },
    #[serde(rename = "Tab:Close")]
    TabClose {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        #[serde(default, rename = "showUndoToast")]
        show_undo_toast: bool,
    },
    #[serde(rename = "Tab:Select")]
    TabSelect {
        #[serde(rename = "tabID")]
        tab_id: TabId,
    },
    #[serde(rename = "Tab:Move")]
    TabMove {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        index: usize,
    },
    #[serde(rename = "Content:LocationChange")]
    LocationChange {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        uri: String,
    },
    #[serde(rename = "Content:StateChange")]
    StateChange {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        state: NavigationState,
        #[serde(default)]
        success: bool,
        #[serde(default)]
        uri: Option<String>,
    },
    #[serde(rename = "Content:LoadError")]
    LoadError {
        #[serde(rename = "tabID")]
        tab_id: TabId,
    },
    #[serde(rename = "Content:PageShow")]
    PageShow {
        #[serde(rename = "tabID")]
        tab_id: TabId,
    },
    #[serde(rename = "DOMContentLoaded")]
    ContentLoaded {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        #[serde(default, rename = "bgColor")]
        background_color: Option<String>,
    },
    #[serde(rename = "DOMTitleChanged")]
    TitleChanged {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        title: String,
    },
    #[serde(rename = "Link:Favicon")]
    Favicon {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        href: String,
        #[serde(default)]
        size: Option<u32>,
    },
    #[serde(rename = "DesktopMode:Changed")]
    DesktopModeChanged {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        #[serde(rename = "desktopMode")]
        desktop_mode: bool,
    },
    #[serde(rename = "Session:RestoreEnd")]
    SessionRestoreEnd,
}

impl EngineMessage {
    /// The tab the message refers to, if any.
    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            EngineMessage::TabAdded { tab_id, .. }
            | EngineMessage::TabClose { tab_id, .. }
            | EngineMessage::TabSelect { tab_id }
            | EngineMessage::TabMove { tab_id, .. }
            | EngineMessage::LocationChange { tab_id, .. }
            | EngineMessage::StateChange { tab_id, .. }
            | EngineMessage::LoadError { tab_id }
            | EngineMessage::PageShow { tab_id }
            | EngineMessage::ContentLoaded { tab_id, .. }
            | EngineMessage::TitleChanged { tab_id, .. }
            | EngineMessage::Favicon { tab_id, .. }
            | EngineMessage::DesktopModeChanged { tab_id, .. } => Some(*tab_id),
            EngineMessage::SessionRestoreEnd => None,
        }
    }
}

/// Notices the registry sends to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum OutboundMessage {
    #[serde(rename = "Tab:Selected")]
    TabSelected {
        #[serde(rename = "tabID")]
        tab_id: TabId,
    },
    #[serde(rename = "Tab:Load")]
    TabLoad(LoadRequest),
    #[serde(rename = "Tab:Closed")]
    TabClosed {
        #[serde(rename = "tabID")]
        tab_id: TabId,
        #[serde(rename = "showUndoToast")]
        show_undo_toast: bool,
    },
}

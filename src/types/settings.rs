use serde::{Deserialize, Serialize};

/// User-tunable settings for the tab host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TabsSettings {
    /// Url opened when a new tab has nowhere else to go.
    pub homepage: String,
    /// Quiet period before the open tab list is written out.
    pub persist_debounce_ms: u64,
    /// Reopen the previous session's tabs on start-up.
    pub restore_session: bool,
    /// File name of the SQLite database inside the data directory.
    pub database_file: String,
}

impl Default for TabsSettings {
    fn default() -> Self {
        Self {
            homepage: "about:home".to_string(),
            persist_debounce_ms: 5_000,
            restore_session: true,
            database_file: "tabs.db".to_string(),
        }
    }
}

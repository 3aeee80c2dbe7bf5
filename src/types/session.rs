use serde::{Deserialize, Serialize};

use super::tab::TabId;

/// A tab's state as handed to the persistence sink, in tab-strip order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedTab {
    pub id: TabId,
    pub url: Option<String>,
    pub title: String,
    pub is_private: bool,
    pub selected: bool,
}

/// The most recent snapshot read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub tabs: Vec<PersistedTab>,
    pub saved_at: i64,
}

impl SessionSnapshot {
    pub fn selected(&self) -> Option<&PersistedTab> {
        self.tabs.iter().find(|t| t.selected)
    }
}

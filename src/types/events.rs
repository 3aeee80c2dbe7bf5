use serde::{Deserialize, Serialize};

/// Tab lifecycle events delivered to registered listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabEvent {
    Added,
    Closed,
    Selected,
    Unselected,
    Start,
    Stop,
    Loaded,
    LoadError,
    LocationChange,
    PageShow,
    Title,
    Favicon,
    DesktopModeChange,
    Moved,
    /// Session restore finished. Delivered without a tab.
    Restored,
    BookmarkAdded,
    BookmarkRemoved,
    ReadingListAdded,
    ReadingListRemoved,
}

impl TabEvent {
    /// Events after which the open tab list is written out.
    pub fn triggers_persist(self) -> bool {
        matches!(
            self,
            TabEvent::Selected | TabEvent::Unselected | TabEvent::LocationChange
        )
    }
}

/// A change reported by the bookmark / reading-list store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataChange {
    BookmarkAdded,
    BookmarkRemoved,
    ReadingListAdded,
    ReadingListRemoved,
}

impl DataChange {
    pub fn as_tab_event(self) -> TabEvent {
        match self {
            DataChange::BookmarkAdded => TabEvent::BookmarkAdded,
            DataChange::BookmarkRemoved => TabEvent::BookmarkRemoved,
            DataChange::ReadingListAdded => TabEvent::ReadingListAdded,
            DataChange::ReadingListRemoved => TabEvent::ReadingListRemoved,
        }
    }
}

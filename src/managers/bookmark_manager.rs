//! Bookmark and reading-list store.
//!
//! Implements `BookmarkManagerTrait` over SQLite and publishes every change
//! through [`DataChangeFeed`] so open tabs can reflect their bookmark state.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rusqlite::params;

use crate::database::connection::Database;
use crate::types::errors::BookmarkError;
use crate::types::events::DataChange;

/// Callback for a changed url.
pub type DataChangeObserver = Arc<dyn Fn(&str, DataChange) + Send + Sync>;

/// Source of bookmark / reading-list change notifications.
pub trait DataChangeFeed: Send + Sync {
    fn subscribe(&self, observer: DataChangeObserver);
    /// Current membership of `url` in a saved list.
    fn is_saved(&self, url: &str, kind: SavedKind) -> bool;
}

/// Which list a saved url belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedKind {
    Bookmark,
    ReadingList,
}

impl SavedKind {
    fn as_str(self) -> &'static str {
        match self {
            SavedKind::Bookmark => "bookmark",
            SavedKind::ReadingList => "reading_list",
        }
    }

    fn added(self) -> DataChange {
        match self {
            SavedKind::Bookmark => DataChange::BookmarkAdded,
            SavedKind::ReadingList => DataChange::ReadingListAdded,
        }
    }

    fn removed(self) -> DataChange {
        match self {
            SavedKind::Bookmark => DataChange::BookmarkRemoved,
            SavedKind::ReadingList => DataChange::ReadingListRemoved,
        }
    }
}

/// Trait defining bookmark management operations.
pub trait BookmarkManagerTrait {
    fn add(&self, url: &str, title: &str, kind: SavedKind) -> Result<(), BookmarkError>;
    fn remove(&self, url: &str, kind: SavedKind) -> Result<(), BookmarkError>;
    fn contains(&self, url: &str, kind: SavedKind) -> Result<bool, BookmarkError>;
    fn list(&self, kind: SavedKind) -> Result<Vec<String>, BookmarkError>;
}

/// Bookmark manager backed by the shared SQLite database.
pub struct BookmarkManager {
    db: Arc<Database>,
    observers: Mutex<Vec<DataChangeObserver>>,
}

impl BookmarkManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            observers: Mutex::new(Vec::new()),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Observers run outside the observer lock; they may take other locks.
    fn publish(&self, url: &str, change: DataChange) {
        let observers: Vec<DataChangeObserver> = self.observers.lock().clone();
        for observer in observers {
            observer(url, change);
        }
    }
}

impl DataChangeFeed for BookmarkManager {
    fn subscribe(&self, observer: DataChangeObserver) {
        self.observers.lock().push(observer);
    }

    fn is_saved(&self, url: &str, kind: SavedKind) -> bool {
        self.contains(url, kind).unwrap_or_else(|e| {
            log::warn!("Failed to look up {} in {}: {}", url, kind.as_str(), e);
            false
        })
    }
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Saves a url. Saving an already saved url only refreshes its title.
    fn add(&self, url: &str, title: &str, kind: SavedKind) -> Result<(), BookmarkError> {
        let existed = self.contains(url, kind)?;
        self.db.connection().execute(
            "INSERT INTO bookmarks (url, kind, title, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url, kind) DO UPDATE SET title = excluded.title",
            params![url, kind.as_str(), title, Self::now()],
        )?;
        if !existed {
            log::debug!("Saved {} as {}", url, kind.as_str());
            self.publish(url, kind.added());
        }
        Ok(())
    }

    fn remove(&self, url: &str, kind: SavedKind) -> Result<(), BookmarkError> {
        let removed = self.db.connection().execute(
            "DELETE FROM bookmarks WHERE url = ?1 AND kind = ?2",
            params![url, kind.as_str()],
        )?;
        if removed == 0 {
            return Err(BookmarkError::NotFound(url.to_string()));
        }
        self.publish(url, kind.removed());
        Ok(())
    }

    fn contains(&self, url: &str, kind: SavedKind) -> Result<bool, BookmarkError> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE url = ?1 AND kind = ?2",
            params![url, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list(&self, kind: SavedKind) -> Result<Vec<String>, BookmarkError> {
        let conn = self.db.connection();
        let mut stmt =
            conn.prepare("SELECT url FROM bookmarks WHERE kind = ?1 ORDER BY created_at, url")?;
        let urls = stmt
            .query_map(params![kind.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }
}

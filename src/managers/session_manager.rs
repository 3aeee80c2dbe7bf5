//! Session store for the open tab list.
//!
//! Receives debounced snapshots from the registry and keeps the latest one in
//! SQLite so the next start-up can reopen the same tabs. Private tabs are
//! never written.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::params;
use uuid::Uuid;

use crate::database::connection::Database;
use crate::services::persist_scheduler::PersistenceSink;
use crate::types::errors::SessionError;
use crate::types::session::{PersistedTab, SessionSnapshot};

/// Trait defining session management operations.
pub trait SessionManagerTrait {
    fn save_session(&self, tabs: &[PersistedTab]) -> Result<String, SessionError>;
    fn restore_session(&self) -> Result<Option<SessionSnapshot>, SessionError>;
    fn has_session(&self) -> bool;
    fn clear_session(&self) -> Result<(), SessionError>;
}

/// Session store backed by SQLite.
pub struct SessionManager {
    db: Arc<Database>,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl SessionManagerTrait for SessionManager {
    /// Replaces the stored session with `tabs` in one transaction.
    /// Returns the new session id.
    fn save_session(&self, tabs: &[PersistedTab]) -> Result<String, SessionError> {
        let id = Uuid::new_v4().to_string();
        let mut conn = self.db.connection();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM session_tabs", [])?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute(
            "INSERT INTO sessions (id, saved_at) VALUES (?1, ?2)",
            params![id, Self::now()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO session_tabs (session_id, position, tab_id, url, title, selected)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, tab) in tabs.iter().filter(|t| !t.is_private).enumerate() {
                insert.execute(params![
                    id,
                    position as i64,
                    tab.id,
                    tab.url,
                    tab.title,
                    tab.selected
                ])?;
            }
        }
        tx.commit()?;
        Ok(id)
    }

    /// Returns the most recently saved session, if any.
    fn restore_session(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        let conn = self.db.connection();

        let session = conn.query_row(
            "SELECT id, saved_at FROM sessions ORDER BY saved_at DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );
        let (id, saved_at) = match session {
            Ok(found) => found,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            "SELECT tab_id, url, title, selected FROM session_tabs
             WHERE session_id = ?1 ORDER BY position",
        )?;
        let tabs = stmt
            .query_map(params![id], |row| {
                Ok(PersistedTab {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    is_private: false,
                    selected: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(SessionSnapshot { id, tabs, saved_at }))
    }

    fn has_session(&self) -> bool {
        self.db
            .connection()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, i64>(0))
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM session_tabs", [])?;
        conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

impl PersistenceSink for SessionManager {
    fn persist(&self, tabs: &[PersistedTab]) -> Result<(), SessionError> {
        let id = self.save_session(tabs)?;
        log::debug!("Saved session {} ({} tabs offered)", id, tabs.len());
        Ok(())
    }
}

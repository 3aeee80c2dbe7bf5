//! App core for the tab host.
//!
//! Composition root: builds the database, session store, bookmark store and
//! tab registry, wires them together, and runs start-up and shutdown.

use std::path::Path;
use std::sync::Arc;

use crate::database::connection::Database;
use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::managers::tab_registry::{RegistryOptions, TabRegistry};
use crate::services::engine_bridge::EngineBridge;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::AppError;
use crate::types::message::LoadFlags;

/// Central application struct holding the registry and its collaborators.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub sessions: Arc<SessionManager>,
    pub bookmarks: Arc<BookmarkManager>,
    pub registry: Arc<TabRegistry>,
}

impl App {
    /// Assembles the app from an already loaded settings engine and database.
    pub fn new(
        settings_engine: SettingsEngine,
        db: Arc<Database>,
        bridge: Arc<dyn EngineBridge>,
    ) -> Result<Self, AppError> {
        let sessions = Arc::new(SessionManager::new(Arc::clone(&db)));
        let bookmarks = Arc::new(BookmarkManager::new(Arc::clone(&db)));

        let options = RegistryOptions::from(settings_engine.get_settings());
        let registry = TabRegistry::new(bridge, sessions.clone(), options)?;
        registry.set_data_feed(bookmarks.clone());

        Ok(Self {
            db,
            settings_engine,
            sessions,
            bookmarks,
            registry,
        })
    }

    /// Loads settings from the platform config path and opens the database
    /// inside `data_dir`.
    pub fn open(data_dir: &Path, bridge: Arc<dyn EngineBridge>) -> Result<Self, AppError> {
        let mut settings_engine = SettingsEngine::new(None);
        let settings = settings_engine.load()?;

        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(&settings.database_file);
        log::info!("Opening tab database at {}", db_path.display());
        let db = Arc::new(Database::open(db_path)?);

        Self::new(settings_engine, db, bridge)
    }

    /// Start-up: reopen the previous session if enabled, make sure a tab is
    /// selected, then end the restore phase. Returns the number of restored tabs.
    pub fn startup(&self) -> Result<usize, AppError> {
        let restored = if self.settings_engine.get_settings().restore_session {
            self.restore_tabs()?
        } else {
            0
        };

        if self.registry.is_empty() {
            self.registry.add_tab_for_home(false);
        } else if self.registry.selected_tab().is_none() {
            if let Some(first) = self.registry.tabs().first() {
                self.registry.select_tab(first.id());
            }
        }

        self.registry.finish_restore();
        Ok(restored)
    }

    /// Shutdown: write the final tab list immediately.
    pub fn shutdown(&self) -> Result<(), AppError> {
        self.registry.persist_now()?;
        log::info!("Tab host shut down with {} tabs", self.registry.len());
        Ok(())
    }

    /// Reopens saved tabs. Only the previously selected tab loads right away;
    /// the rest wait in the delayed state.
    fn restore_tabs(&self) -> Result<usize, AppError> {
        let Some(snapshot) = self.sessions.restore_session()? else {
            return Ok(0);
        };

        let mut restored = 0;
        for saved in &snapshot.tabs {
            let Some(url) = saved.url.as_deref() else {
                continue;
            };
            let mut flags = LoadFlags::NEW_TAB;
            if !saved.selected {
                flags |= LoadFlags::DELAY_LOAD;
            }
            if let Some(tab) = self.registry.load_url(url, None, None, None, flags) {
                if !saved.title.is_empty() {
                    tab.set_title(&saved.title);
                }
                restored += 1;
            }
        }
        log::info!("Restored {} tabs from session {}", restored, snapshot.id);
        Ok(restored)
    }
}

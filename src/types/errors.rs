use thiserror::Error;

use super::tab::TabId;

// === MessageError ===

/// Reasons an inbound engine message is dropped.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The payload is not valid JSON or does not match any known variant.
    #[error("Malformed engine message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The envelope carries a protocol version this build does not speak.
    #[error("Unsupported engine message version: {0}")]
    UnsupportedVersion(u32),
    /// The message names a tab the registry does not know.
    #[error("Engine message for unknown tab: {0}")]
    UnknownTab(TabId),
}

// === SessionError ===

/// Errors related to tab list persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to serialize or deserialize session data.
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Database operation failed.
    #[error("Session database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// === BookmarkError ===

/// Errors related to the bookmark and reading-list store.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// Database operation failed.
    #[error("Bookmark database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// No bookmark exists for the url.
    #[error("Bookmark not found: {0}")]
    NotFound(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The settings key does not exist.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
}

// === SchedulerError ===

/// Errors starting a background worker.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker thread or runtime could not be started.
    #[error("Failed to start background worker: {0}")]
    Spawn(#[from] std::io::Error),
}

// === AppError ===

/// Errors surfaced while assembling or shutting down the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Database open failed: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Data directory error: {0}")]
    Io(#[from] std::io::Error),
}

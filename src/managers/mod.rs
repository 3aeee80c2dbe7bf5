// Tab host state managers
// Managers own state: the tab registry, its listeners, saved sessions and bookmarks.

pub mod bookmark_manager;
pub mod listeners;
pub mod session_manager;
pub mod tab_registry;

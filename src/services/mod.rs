// Tab host services
// Services provide the plumbing around the registry: the engine bridge, the UI
// thread, debounced persistence and settings.

pub mod engine_bridge;
pub mod persist_scheduler;
pub mod settings_engine;
pub mod ui_dispatcher;

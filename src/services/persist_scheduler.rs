//! Debounced background writer for the open tab list.
//!
//! Every `schedule()` call cancels the pending write and starts a new quiet
//! period, so a burst of selection or navigation changes collapses into one
//! write of the state at the end of the burst.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::types::errors::{SchedulerError, SessionError};
use crate::types::session::PersistedTab;

/// Durable storage for the tab list. Writes must be idempotent.
pub trait PersistenceSink: Send + Sync {
    fn persist(&self, tabs: &[PersistedTab]) -> Result<(), SessionError>;
}

/// Produces the tab list at write time.
pub type SnapshotSource = Arc<dyn Fn() -> Vec<PersistedTab> + Send + Sync>;

pub struct PersistScheduler {
    runtime: Runtime,
    sink: Arc<dyn PersistenceSink>,
    source: SnapshotSource,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl PersistScheduler {
    /// Starts a one-thread worker runtime for persistence.
    pub fn new(
        sink: Arc<dyn PersistenceSink>,
        source: SnapshotSource,
        debounce: Duration,
    ) -> Result<Self, SchedulerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tabs-persist")
            .enable_time()
            .build()?;

        Ok(Self {
            runtime,
            sink,
            source,
            debounce,
            pending: Mutex::new(None),
        })
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Replaces any pending write with one that fires after the debounce window.
    pub fn schedule(&self) {
        let mut pending = self.pending.lock();
        if let Some(task) = pending.take() {
            task.abort();
        }

        let sink = Arc::clone(&self.sink);
        let source = Arc::clone(&self.source);
        let debounce = self.debounce;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let write = tokio::task::spawn_blocking(move || {
                let tabs = source();
                log::debug!("Persisting {} tabs", tabs.len());
                sink.persist(&tabs)
            });
            match write.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Failed to persist tabs: {}", e),
                Err(e) => log::error!("Tab persistence task failed: {}", e),
            }
        }));
    }

    /// True while a write is waiting out its debounce window or running.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Cancels the pending write and persists the current list on this thread.
    pub fn flush_now(&self) -> Result<(), SessionError> {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
        let tabs = (self.source)();
        log::info!("Flushing {} tabs to storage", tabs.len());
        self.sink.persist(&tabs)
    }
}

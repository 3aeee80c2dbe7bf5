//! Registered observers of tab events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::events::TabEvent;
use crate::types::tab::Tab;

/// Receives tab events on the UI thread.
///
/// `tab` is `None` only for registry-wide events such as
/// [`TabEvent::Restored`]. `data` carries event-specific detail, for example
/// the new url on [`TabEvent::LocationChange`].
pub trait TabsListener: Send + Sync {
    fn on_tab_changed(&self, tab: Option<&Arc<Tab>>, event: TabEvent, data: Option<&str>);
}

impl<F> TabsListener for F
where
    F: Fn(Option<&Arc<Tab>>, TabEvent, Option<&str>) + Send + Sync,
{
    fn on_tab_changed(&self, tab: Option<&Arc<Tab>>, event: TabEvent, data: Option<&str>) {
        self(tab, event, data)
    }
}

/// Handle returned by registration; pass it back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// One queued notification.
#[derive(Clone)]
pub(crate) struct Notification {
    pub tab: Option<Arc<Tab>>,
    pub event: TabEvent,
    pub data: Option<String>,
}

#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn TabsListener>)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn TabsListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    /// Returns false if the id was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers a batch to everyone registered right now. The list is copied
    /// first so a listener may unregister itself from inside the callback.
    pub(crate) fn deliver(&self, batch: &[Notification]) {
        let listeners: Vec<Arc<dyn TabsListener>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for note in batch {
            for listener in &listeners {
                listener.on_tab_changed(note.tab.as_ref(), note.event, note.data.as_deref());
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::tab::{Tab, TabId};

/// Immutable snapshot of the open tabs: strip order plus an id index.
///
/// Mutators never edit a published list. They build a new one and swap it
/// in, so both containers always describe the same set of tabs.
#[derive(Debug, Default, Clone)]
pub struct TabList {
    order: Vec<Arc<Tab>>,
    by_id: HashMap<TabId, Arc<Tab>>,
}

impl TabList {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of entries in the id index. Always equal to [`len`](Self::len).
    pub fn indexed_len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: TabId) -> Option<&Arc<Tab>> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tab>> {
        self.order.iter()
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.order.iter().map(|t| t.id()).collect()
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.order.iter().position(|t| t.id() == id)
    }

    pub fn last(&self) -> Option<&Arc<Tab>> {
        self.order.last()
    }

    pub(crate) fn at(&self, index: usize) -> Option<&Arc<Tab>> {
        self.order.get(index)
    }

    /// Copy with `tab` at `index` (clamped), or appended when `None`.
    pub(crate) fn with_inserted(&self, tab: Arc<Tab>, index: Option<usize>) -> TabList {
        let mut next = self.clone();
        let at = index.unwrap_or(next.order.len()).min(next.order.len());
        next.by_id.insert(tab.id(), Arc::clone(&tab));
        next.order.insert(at, tab);
        next
    }

    /// Copy without `id`, plus the removed tab. `None` if absent.
    pub(crate) fn without(&self, id: TabId) -> Option<(TabList, Arc<Tab>)> {
        let index = self.index_of(id)?;
        let mut next = self.clone();
        let removed = next.order.remove(index);
        next.by_id.remove(&id);
        Some((next, removed))
    }

    /// Copy with `id` moved to `index` (clamped). `None` if absent.
    pub(crate) fn with_moved(&self, id: TabId, index: usize) -> Option<TabList> {
        let from = self.index_of(id)?;
        let mut next = self.clone();
        let tab = next.order.remove(from);
        let to = index.min(next.order.len());
        next.order.insert(to, tab);
        Some(next)
    }
}

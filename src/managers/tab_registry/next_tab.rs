//! Which tab takes over the selection when a tab closes.

use std::sync::Arc;

use super::tab_list::TabList;
use crate::types::tab::Tab;

/// Picks the tab to select after `tab` closes. Evaluated while `tab` is
/// still in `list`.
///
/// Same-mode neighbours win, looking right first and then left. A private
/// tab with no private neighbours falls back to the last normal tab. An open
/// parent beats everything except a sibling.
pub(crate) fn next_tab(list: &TabList, selected: Option<&Arc<Tab>>, tab: &Tab) -> Option<Arc<Tab>> {
    if selected.map(|s| s.id()) != Some(tab.id()) {
        return selected.cloned();
    }

    let private = tab.is_private();
    let index = list.index_of(tab.id());

    let mut next = index
        .and_then(|i| following(list, i, private))
        .or_else(|| index.and_then(|i| preceding(list, i, private)));

    if next.is_none() && private {
        // No private tabs left: go back to the last normal tab. When the last
        // tab is itself private, walk left from it instead. Only this one
        // fallback looks past the closing tab's own position.
        if let Some(last) = list.last() {
            next = if !last.is_private() {
                Some(Arc::clone(last))
            } else {
                list.index_of(last.id())
                    .and_then(|i| preceding(list, i, false))
            };
        }
    }

    if let Some(parent) = tab.parent_id().and_then(|id| list.get(id)) {
        return match next {
            Some(candidate) if candidate.parent_id() == tab.parent_id() => Some(candidate),
            _ => Some(Arc::clone(parent)),
        };
    }

    next
}

fn following(list: &TabList, index: usize, private: bool) -> Option<Arc<Tab>> {
    list.iter()
        .skip(index + 1)
        .find(|t| t.is_private() == private)
        .cloned()
}

fn preceding(list: &TabList, index: usize, private: bool) -> Option<Arc<Tab>> {
    (0..index)
        .rev()
        .filter_map(|i| list.at(i))
        .find(|t| t.is_private() == private)
        .cloned()
}

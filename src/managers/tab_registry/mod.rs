//! Process-wide registry of open tabs.
//!
//! The registry owns the tab order, the id index and the selection. It turns
//! UI load requests and engine notifications into tab state changes, tells
//! the engine what the UI did, and fans tab events out to listeners on the
//! UI thread.
//!
//! Structural mutators serialise on one mutation lock. Readers never take it:
//! they load an immutable [`TabList`] snapshot and the selected tab from
//! atomically swapped references.

mod engine_messages;
mod next_tab;
mod tab_list;

pub use tab_list::TabList;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, MutexGuard};

use crate::managers::bookmark_manager::{DataChangeFeed, SavedKind};
use crate::managers::listeners::{ListenerId, ListenerSet, Notification, TabsListener};
use crate::services::engine_bridge::EngineBridge;
use crate::services::persist_scheduler::{PersistScheduler, PersistenceSink, SnapshotSource};
use crate::services::ui_dispatcher::UiDispatcher;
use crate::types::errors::{SchedulerError, SessionError};
use crate::types::events::{DataChange, TabEvent};
use crate::types::message::{IntentContext, LoadFlags, LoadRequest};
use crate::types::session::PersistedTab;
use crate::types::settings::TabsSettings;
use crate::types::tab::{Favicon, LoadState, Tab, TabId, TabKind};

/// Proof that the caller holds the mutation lock.
type Guard<'a> = MutexGuard<'a, ()>;

/// `about:` pages whose icon ships with the browser.
const BUILTIN_ICON_PAGES: &[&str] = &[
    "about:home",
    "about:privatebrowsing",
    "about:config",
    "about:downloads",
    "about:logins",
];
const BUILTIN_FAVICON: &str = "chrome://branding/content/favicon32.png";

/// Construction options for [`TabRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Url for the replacement tab when the last tab closes.
    pub homepage: String,
    pub persist_debounce: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::from(&TabsSettings::default())
    }
}

impl From<&TabsSettings> for RegistryOptions {
    fn from(settings: &TabsSettings) -> Self {
        Self {
            homepage: settings.homepage.clone(),
            persist_debounce: Duration::from_millis(settings.persist_debounce_ms),
        }
    }
}

/// Everything needed to register a tab.
#[derive(Debug, Clone)]
pub struct NewTab {
    pub id: TabId,
    pub url: Option<String>,
    pub title: Option<String>,
    pub parent_id: Option<TabId>,
    pub external: bool,
    pub kind: TabKind,
    /// Position in the strip; appended when `None`.
    pub insert_index: Option<usize>,
}

impl NewTab {
    pub fn new(id: TabId, url: Option<&str>) -> Self {
        Self {
            id,
            url: url.map(str::to_string),
            title: None,
            parent_id: None,
            external: false,
            kind: TabKind::Normal,
            insert_index: None,
        }
    }

    pub fn private(mut self) -> Self {
        self.kind = TabKind::Private;
        self
    }

    pub fn with_parent(mut self, parent_id: TabId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.insert_index = Some(index);
        self
    }
}

pub struct TabRegistry {
    list: Arc<ArcSwap<TabList>>,
    selected: Arc<ArcSwapOption<Tab>>,
    mutation: Mutex<()>,
    /// Next free local id. Wider than `TabId` so exhaustion is visible.
    next_id: AtomicU64,
    /// Set until session restore completes; suppresses `Added` events.
    restoring: AtomicBool,
    observers_registered: AtomicBool,
    data_feed: Mutex<Option<Arc<dyn DataChangeFeed>>>,
    homepage: String,
    bridge: Arc<dyn EngineBridge>,
    listeners: Arc<ListenerSet>,
    ui: UiDispatcher,
    persister: PersistScheduler,
    self_ref: Weak<TabRegistry>,
}

impl TabRegistry {
    /// Builds a registry and starts its UI thread and persistence worker.
    ///
    /// The registry starts in its restore phase: `Added` events are held back
    /// until [`finish_restore`](Self::finish_restore) is called.
    pub fn new(
        bridge: Arc<dyn EngineBridge>,
        sink: Arc<dyn PersistenceSink>,
        options: RegistryOptions,
    ) -> Result<Arc<Self>, SchedulerError> {
        let list = Arc::new(ArcSwap::from_pointee(TabList::default()));
        let selected: Arc<ArcSwapOption<Tab>> = Arc::new(ArcSwapOption::empty());

        let source: SnapshotSource = {
            let list = Arc::clone(&list);
            let selected = Arc::clone(&selected);
            Arc::new(move || persisted_tabs(&list.load_full(), selected.load_full().as_ref()))
        };
        let persister = PersistScheduler::new(sink, source, options.persist_debounce)?;
        let ui = UiDispatcher::spawn()?;

        log::info!(
            "Tab registry ready (homepage {}, persist debounce {:?})",
            options.homepage,
            options.persist_debounce
        );

        Ok(Arc::new_cyclic(|weak| Self {
            list,
            selected,
            mutation: Mutex::new(()),
            next_id: AtomicU64::new(0),
            restoring: AtomicBool::new(true),
            observers_registered: AtomicBool::new(false),
            data_feed: Mutex::new(None),
            homepage: options.homepage,
            bridge,
            listeners: Arc::new(ListenerSet::new()),
            ui,
            persister,
            self_ref: weak.clone(),
        }))
    }

    // ─── Reads ───

    /// Current tab list. Never blocks and never observes a half-applied change.
    pub fn snapshot(&self) -> Arc<TabList> {
        self.list.load_full()
    }

    pub fn tabs(&self) -> Vec<Arc<Tab>> {
        self.list.load().iter().cloned().collect()
    }

    pub fn get_tab(&self, id: TabId) -> Option<Arc<Tab>> {
        self.list.load().get(id).cloned()
    }

    pub fn selected_tab(&self) -> Option<Arc<Tab>> {
        self.selected.load_full()
    }

    pub fn is_selected(&self, id: TabId) -> bool {
        self.selected.load_full().is_some_and(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.list.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.load().is_empty()
    }

    /// Tabs shown in the strip. Private tabs count only when asked for.
    pub fn display_count(&self, include_private: bool) -> usize {
        self.list
            .load()
            .iter()
            .filter(|t| include_private || !t.is_private())
            .count()
    }

    pub fn first_tab_for_url(&self, url: &str, is_private: bool) -> Option<Arc<Tab>> {
        self.list
            .load()
            .iter()
            .find(|t| t.is_private() == is_private && t.url().as_deref() == Some(url))
            .cloned()
    }

    pub fn tab_for_application_id(&self, application_id: &str) -> Option<Arc<Tab>> {
        self.list
            .load()
            .iter()
            .find(|t| t.application_id().as_deref() == Some(application_id))
            .cloned()
    }

    pub fn is_open(&self, url: &str) -> bool {
        self.list.load().iter().any(|t| t.url().as_deref() == Some(url))
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.load(Ordering::Acquire)
    }

    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Tab to select if `tab` closed now. See [`next_tab::next_tab`].
    pub fn get_next_tab(&self, tab: &Tab) -> Option<Arc<Tab>> {
        next_tab::next_tab(&self.list.load(), self.selected.load_full().as_ref(), tab)
    }

    // ─── Listeners ───

    pub fn add_listener(&self, listener: Arc<dyn TabsListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Blocks until every notification queued so far has been delivered.
    /// Must not be called from a listener.
    pub fn flush_notifications(&self) {
        self.ui.flush();
    }

    /// Wires the bookmark / reading-list store. Subscription itself happens
    /// when the first tab is added.
    pub fn set_data_feed(&self, feed: Arc<dyn DataChangeFeed>) {
        *self.data_feed.lock() = Some(feed);
    }

    // ─── Mutators ───

    /// Registers a tab and emits `Added` once restore has finished.
    ///
    /// Re-adding a known id returns the existing tab unchanged.
    pub fn add_tab(&self, new_tab: NewTab) -> Arc<Tab> {
        let guard = self.mutation.lock();
        self.add_tab_locked(&guard, new_tab)
    }

    /// Drops a tab from the registry without any events. Unknown ids are ignored.
    pub fn remove_tab(&self, id: TabId) -> Option<Arc<Tab>> {
        let guard = self.mutation.lock();
        self.remove_tab_locked(&guard, id)
    }

    /// Makes `id` the selected tab. `None` when the id is unknown or already
    /// selected, in which case nothing is emitted.
    pub fn select_tab(&self, id: TabId) -> Option<Arc<Tab>> {
        let guard = self.mutation.lock();
        self.select_tab_locked(&guard, id)
    }

    /// Closes `tab`, selecting `next_tab` or, without one, a fresh home tab.
    pub fn close_tab(&self, tab: &Arc<Tab>, next_tab: Option<Arc<Tab>>, show_undo_toast: bool) {
        let guard = self.mutation.lock();
        self.close_tab_locked(&guard, tab, next_tab, show_undo_toast);
    }

    /// Closes `tab` and hands the selection to [`get_next_tab`](Self::get_next_tab).
    pub fn close_tab_default(&self, tab: &Arc<Tab>) {
        let guard = self.mutation.lock();
        let next = self.get_next_tab(tab);
        self.close_tab_locked(&guard, tab, next, false);
    }

    /// Closes every private tab, leaving at least one tab open.
    pub fn close_all_private_tabs(&self) {
        let guard = self.mutation.lock();
        let private: Vec<Arc<Tab>> = self
            .list
            .load()
            .iter()
            .filter(|t| t.is_private())
            .cloned()
            .collect();
        for tab in &private {
            let next = self.get_next_tab(tab);
            self.close_tab_locked(&guard, tab, next, false);
        }
    }

    /// Moves a tab within the strip. Returns false for an unknown id.
    pub fn move_tab(&self, id: TabId, index: usize) -> bool {
        let guard = self.mutation.lock();
        self.move_tab_locked(&guard, id, index)
    }

    /// Asks the engine to load `url`, creating or reusing a tab as `flags`
    /// and `intent` dictate.
    ///
    /// Returns the tab the load is bound to, or `None` for a plain load in
    /// whatever the engine has current.
    pub fn load_url(
        &self,
        url: &str,
        search_engine: Option<&str>,
        parent_id: Option<TabId>,
        intent: Option<&IntentContext>,
        flags: LoadFlags,
    ) -> Option<Arc<Tab>> {
        let guard = self.mutation.lock();
        self.load_url_locked(&guard, url, search_engine, parent_id, intent, flags)
    }

    /// Opens the homepage in a new selected tab.
    pub fn add_tab_for_home(&self, is_private: bool) -> Option<Arc<Tab>> {
        let mut flags = LoadFlags::NEW_TAB;
        if is_private {
            flags |= LoadFlags::PRIVATE;
        }
        let homepage = self.homepage.clone();
        self.load_url(&homepage, None, None, None, flags)
    }

    /// Ends the restore phase and emits `Restored`. Later calls do nothing.
    pub fn finish_restore(&self) {
        let guard = self.mutation.lock();
        self.finish_restore_locked(&guard);
    }

    /// Queues a debounced write of the tab list.
    pub fn schedule_persist(&self) {
        self.persister.schedule();
    }

    /// Writes the tab list now, cancelling any pending debounced write.
    pub fn persist_now(&self) -> Result<(), SessionError> {
        self.persister.flush_now()
    }

    // ─── Locked helpers ───

    /// `None` once every id up to `TabId::MAX` has been handed out.
    fn next_tab_id(&self) -> Option<TabId> {
        self.next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                TabId::try_from(next).ok().map(|_| next + 1)
            })
            .ok()
            .and_then(|next| TabId::try_from(next).ok())
    }

    fn publish(&self, _guard: &Guard<'_>, list: TabList) {
        self.list.store(Arc::new(list));
    }

    fn add_tab_locked(&self, guard: &Guard<'_>, new_tab: NewTab) -> Arc<Tab> {
        let current = self.list.load_full();
        if let Some(existing) = current.get(new_tab.id) {
            log::warn!("Tab {} is already registered", new_tab.id);
            return Arc::clone(existing);
        }

        // Ids handed out locally must never collide with engine-chosen ones.
        self.next_id
            .fetch_max(u64::from(new_tab.id) + 1, Ordering::SeqCst);

        let tab = Arc::new(Tab::new(
            new_tab.id,
            new_tab.kind,
            new_tab.url,
            new_tab.title,
            new_tab.parent_id,
            new_tab.external,
        ));
        self.publish(guard, current.with_inserted(Arc::clone(&tab), new_tab.insert_index));
        log::debug!("Added tab {} ({:?})", tab.id(), tab.kind());

        self.register_data_observers();
        let saved = self.refresh_saved_state(&tab);

        if !self.is_restoring() {
            let mut batch = vec![Notification {
                tab: Some(Arc::clone(&tab)),
                event: TabEvent::Added,
                data: None,
            }];
            batch.extend(saved);
            self.notify(batch);
        }
        tab
    }

    fn remove_tab_locked(&self, guard: &Guard<'_>, id: TabId) -> Option<Arc<Tab>> {
        let (next, removed) = self.list.load().without(id)?;
        self.publish(guard, next);
        log::debug!("Removed tab {}", id);
        Some(removed)
    }

    fn select_tab_locked(&self, _guard: &Guard<'_>, id: TabId) -> Option<Arc<Tab>> {
        let tab = self.get_tab(id)?;
        let previous = self.selected.load_full();
        if previous.as_ref().is_some_and(|p| p.id() == id) {
            return None;
        }

        self.selected.store(Some(Arc::clone(&tab)));

        // A tab is always selected before the old one is unselected.
        let mut batch = vec![Notification {
            tab: Some(Arc::clone(&tab)),
            event: TabEvent::Selected,
            data: None,
        }];
        if let Some(previous) = previous {
            batch.push(Notification {
                tab: Some(previous),
                event: TabEvent::Unselected,
                data: None,
            });
        }
        self.notify(batch);
        self.bridge.tab_selected(id);
        Some(tab)
    }

    fn close_tab_locked(
        &self,
        guard: &Guard<'_>,
        tab: &Arc<Tab>,
        next_tab: Option<Arc<Tab>>,
        show_undo_toast: bool,
    ) {
        let tab_id = tab.id();
        if self.remove_tab_locked(guard, tab_id).is_none() {
            log::debug!("Tab {} already closed", tab_id);
            return;
        }

        let next_tab = next_tab.filter(|n| n.id() != tab_id && self.list.load().contains(n.id()));
        let next_tab = match next_tab {
            Some(next) => Some(next),
            None => {
                let homepage = self.homepage.clone();
                self.load_url_locked(guard, &homepage, None, None, None, LoadFlags::NEW_TAB)
            }
        };
        if let Some(next) = next_tab {
            self.select_tab_locked(guard, next.id());
        }

        tab.on_destroy();
        self.notify(vec![Notification {
            tab: Some(Arc::clone(tab)),
            event: TabEvent::Closed,
            data: None,
        }]);
        self.bridge.tab_closed(tab_id, show_undo_toast);
        log::info!("Closed tab {}", tab_id);
    }

    fn move_tab_locked(&self, guard: &Guard<'_>, id: TabId, index: usize) -> bool {
        let Some(next) = self.list.load().with_moved(id, index) else {
            return false;
        };
        let tab = next.get(id).cloned();
        let position = next.index_of(id).unwrap_or(index);
        self.publish(guard, next);
        self.notify(vec![Notification {
            tab,
            event: TabEvent::Moved,
            data: Some(position.to_string()),
        }]);
        true
    }

    fn load_url_locked(
        &self,
        guard: &Guard<'_>,
        url: &str,
        search_engine: Option<&str>,
        parent_id: Option<TabId>,
        intent: Option<&IntentContext>,
        flags: LoadFlags,
    ) -> Option<Arc<Tab>> {
        let mut delay_load = flags.contains(LoadFlags::DELAY_LOAD);
        let mut background = delay_load || flags.contains(LoadFlags::BACKGROUND);
        let is_private = flags.contains(LoadFlags::PRIVATE);
        let desktop_mode = flags.contains(LoadFlags::DESKTOP);

        let application_id = intent.and_then(|i| i.application_id.clone());
        let mut target: Option<Arc<Tab>> = None;

        let needs_new_tab = match &application_id {
            None => flags.contains(LoadFlags::NEW_TAB),
            Some(app_id) => {
                let forced = intent.is_some_and(|i| i.create_new_tab);
                match self.tab_for_application_id(app_id) {
                    Some(existing) if !forced => {
                        delay_load = false;
                        background = false;
                        existing.set_application_id(Some(app_id.clone()));
                        target = Some(existing);
                        false
                    }
                    _ => true,
                }
            }
        };

        let mut request = LoadRequest {
            url: url.to_string(),
            engine: search_engine.map(str::to_string),
            parent_id,
            user_entered: flags.contains(LoadFlags::USER_ENTERED),
            is_private,
            pinned: flags.contains(LoadFlags::PINNED),
            desktop_mode,
            new_tab: needs_new_tab,
            delay_load,
            selected: !background,
            tab_id: target.as_ref().map(|t| t.id()),
        };

        if needs_new_tab {
            let Some(tab_id) = self.next_tab_id() else {
                log::error!("Tab ids exhausted, dropping load of {}", url);
                return None;
            };
            request.tab_id = Some(tab_id);
            let tab = self.add_tab_locked(
                guard,
                NewTab {
                    id: tab_id,
                    url: stub_url(url),
                    title: Some(url.to_string()),
                    parent_id,
                    external: flags.contains(LoadFlags::EXTERNAL),
                    kind: if is_private {
                        TabKind::Private
                    } else {
                        TabKind::Normal
                    },
                    insert_index: None,
                },
            );
            tab.set_desktop_mode(desktop_mode);
            tab.set_application_id(application_id);
            if delay_load {
                tab.set_load_state(LoadState::Delayed);
            }
            target = Some(tab);
        }

        self.bridge.load_requested(&request);

        let tab = target?;
        if !delay_load && !background {
            self.select_tab_locked(guard, tab.id());
        }
        if BUILTIN_ICON_PAGES.contains(&url) {
            tab.add_favicon(Favicon {
                href: BUILTIN_FAVICON.to_string(),
                size: Some(32),
            });
        }
        Some(tab)
    }

    fn finish_restore_locked(&self, _guard: &Guard<'_>) {
        if self.restoring.swap(false, Ordering::AcqRel) {
            log::info!("Session restore finished with {} tabs", self.len());
            self.notify(vec![Notification {
                tab: None,
                event: TabEvent::Restored,
                data: None,
            }]);
        }
    }

    /// Lazily subscribes to bookmark / reading-list changes, once.
    fn register_data_observers(&self) {
        if self.observers_registered.load(Ordering::Acquire) {
            return;
        }
        let Some(feed) = self.data_feed.lock().clone() else {
            return;
        };
        if self.observers_registered.swap(true, Ordering::AcqRel) {
            return;
        }
        let registry = self.self_ref.clone();
        feed.subscribe(Arc::new(move |url: &str, change: DataChange| {
            if let Some(registry) = registry.upgrade() {
                registry.on_data_change(url, change);
            }
        }));
        log::debug!("Subscribed to bookmark changes");
    }

    /// Re-reads the tab's bookmark and reading-list flags from the data feed.
    /// Returns the events for the flags that flipped.
    fn refresh_saved_state(&self, tab: &Arc<Tab>) -> Vec<Notification> {
        let Some(feed) = self.data_feed.lock().clone() else {
            return Vec::new();
        };
        let url = tab.url();
        let saved = |kind| url.as_deref().is_some_and(|u| feed.is_saved(u, kind));
        let bookmarked = saved(SavedKind::Bookmark);
        let in_reading_list = saved(SavedKind::ReadingList);

        let mut changes = Vec::new();
        if tab.is_bookmarked() != bookmarked {
            tab.set_bookmarked(bookmarked);
            changes.push(if bookmarked {
                DataChange::BookmarkAdded
            } else {
                DataChange::BookmarkRemoved
            });
        }
        if tab.is_in_reading_list() != in_reading_list {
            tab.set_in_reading_list(in_reading_list);
            changes.push(if in_reading_list {
                DataChange::ReadingListAdded
            } else {
                DataChange::ReadingListRemoved
            });
        }
        changes
            .into_iter()
            .map(|change| Notification {
                tab: Some(Arc::clone(tab)),
                event: change.as_tab_event(),
                data: None,
            })
            .collect()
    }

    fn on_data_change(&self, url: &str, change: DataChange) {
        let _guard = self.mutation.lock();
        let mut batch = Vec::new();
        for tab in self.list.load().iter() {
            if tab.url().as_deref() != Some(url) {
                continue;
            }
            match change {
                DataChange::BookmarkAdded => tab.set_bookmarked(true),
                DataChange::BookmarkRemoved => tab.set_bookmarked(false),
                DataChange::ReadingListAdded => tab.set_in_reading_list(true),
                DataChange::ReadingListRemoved => tab.set_in_reading_list(false),
            }
            batch.push(Notification {
                tab: Some(Arc::clone(tab)),
                event: change.as_tab_event(),
                data: None,
            });
        }
        self.notify(batch);
    }

    /// Queues a batch for the UI thread. Called with the mutation lock held so
    /// batches reach listeners in mutation order.
    fn notify(&self, batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        if batch.iter().any(|n| n.event.triggers_persist()) {
            self.persister.schedule();
        }
        let listeners = Arc::clone(&self.listeners);
        self.ui.post(move || listeners.deliver(&batch));
    }
}

/// Keeps the url only when it parses as an absolute URI with a scheme.
fn stub_url(url: &str) -> Option<String> {
    url::Url::parse(url).ok().map(|_| url.to_string())
}

fn persisted_tabs(list: &TabList, selected: Option<&Arc<Tab>>) -> Vec<PersistedTab> {
    let selected_id = selected.map(|t| t.id());
    list.iter()
        .map(|tab| PersistedTab {
            id: tab.id(),
            url: tab.url(),
            title: tab.title(),
            is_private: tab.is_private(),
            selected: Some(tab.id()) == selected_id,
        })
        .collect()
}

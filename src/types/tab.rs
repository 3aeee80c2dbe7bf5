use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Process-unique tab identifier.
pub type TabId = u32;

/// Whether a tab belongs to normal or private browsing. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    Normal,
    Private,
}

/// Load progress of the tab's current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    None,
    Loading,
    Delayed,
    Success,
    Error,
}

/// Where the tab is in its engine-confirmed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Created locally, not yet confirmed by the engine.
    #[default]
    Stub,
    Open,
    Closed,
}

/// A favicon candidate announced by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favicon {
    pub href: String,
    pub size: Option<u32>,
}

#[derive(Debug, Default)]
struct TabState {
    url: Option<String>,
    title: String,
    load_state: LoadState,
    lifecycle: Lifecycle,
    desktop_mode: bool,
    application_id: Option<String>,
    favicons: Vec<Favicon>,
    background_color: Option<String>,
    bookmarked: bool,
    in_reading_list: bool,
}

/// One open browsing context.
///
/// Identity, privacy and parentage are fixed at construction. Everything the
/// engine can change lives behind a lock so a `Tab` can be shared as
/// `Arc<Tab>` between the registry, listeners and the persistence worker.
#[derive(Debug)]
pub struct Tab {
    id: TabId,
    kind: TabKind,
    parent_id: Option<TabId>,
    external: bool,
    state: RwLock<TabState>,
}

impl Tab {
    pub fn new(
        id: TabId,
        kind: TabKind,
        url: Option<String>,
        title: Option<String>,
        parent_id: Option<TabId>,
        external: bool,
    ) -> Self {
        Self {
            id,
            kind,
            parent_id,
            external,
            state: RwLock::new(TabState {
                url,
                title: title.unwrap_or_default(),
                ..TabState::default()
            }),
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn kind(&self) -> TabKind {
        self.kind
    }

    pub fn is_private(&self) -> bool {
        self.kind == TabKind::Private
    }

    pub fn parent_id(&self) -> Option<TabId> {
        self.parent_id
    }

    /// True when the tab was opened on behalf of another application.
    pub fn is_external(&self) -> bool {
        self.external
    }

    pub fn url(&self) -> Option<String> {
        self.state.read().url.clone()
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    /// Title shown in the tab strip: the page title, else the url.
    pub fn display_title(&self) -> String {
        let state = self.state.read();
        if !state.title.trim().is_empty() {
            return state.title.clone();
        }
        state.url.clone().unwrap_or_else(|| "about:blank".to_string())
    }

    pub fn load_state(&self) -> LoadState {
        self.state.read().load_state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.read().lifecycle
    }

    pub fn desktop_mode(&self) -> bool {
        self.state.read().desktop_mode
    }

    pub fn application_id(&self) -> Option<String> {
        self.state.read().application_id.clone()
    }

    pub fn favicons(&self) -> Vec<Favicon> {
        self.state.read().favicons.clone()
    }

    /// The largest announced favicon. Unsized icons lose to sized ones.
    pub fn best_favicon(&self) -> Option<Favicon> {
        self.state
            .read()
            .favicons
            .iter()
            .max_by_key(|f| f.size.unwrap_or(0))
            .cloned()
    }

    pub fn background_color(&self) -> Option<String> {
        self.state.read().background_color.clone()
    }

    pub fn is_bookmarked(&self) -> bool {
        self.state.read().bookmarked
    }

    pub fn is_in_reading_list(&self) -> bool {
        self.state.read().in_reading_list
    }

    pub(crate) fn set_title(&self, title: &str) {
        self.state.write().title = title.to_string();
    }

    pub(crate) fn set_load_state(&self, load_state: LoadState) {
        self.state.write().load_state = load_state;
    }

    pub(crate) fn set_desktop_mode(&self, enabled: bool) {
        self.state.write().desktop_mode = enabled;
    }

    pub(crate) fn set_application_id(&self, application_id: Option<String>) {
        self.state.write().application_id = application_id;
    }

    pub(crate) fn set_background_color(&self, color: Option<String>) {
        self.state.write().background_color = color;
    }

    pub(crate) fn set_bookmarked(&self, bookmarked: bool) {
        self.state.write().bookmarked = bookmarked;
    }

    pub(crate) fn set_in_reading_list(&self, in_reading_list: bool) {
        self.state.write().in_reading_list = in_reading_list;
    }

    /// Engine confirmed the tab. A closed tab stays closed.
    pub(crate) fn confirm_open(&self) {
        let mut state = self.state.write();
        if state.lifecycle == Lifecycle::Stub {
            state.lifecycle = Lifecycle::Open;
        }
    }

    /// Adds or replaces a favicon with the same href.
    pub(crate) fn add_favicon(&self, favicon: Favicon) {
        let mut state = self.state.write();
        match state.favicons.iter_mut().find(|f| f.href == favicon.href) {
            Some(existing) => *existing = favicon,
            None => state.favicons.push(favicon),
        }
    }

    /// Applies a committed navigation. Returns true if the document changed,
    /// in which case the favicon set is cleared.
    pub(crate) fn handle_location_change(&self, url: &str) -> bool {
        let mut state = self.state.write();
        let changed = state.url.as_deref().map(strip_fragment) != Some(strip_fragment(url));
        state.url = Some(url.to_string());
        if changed {
            state.favicons.clear();
            state.background_color = None;
        }
        changed
    }

    pub(crate) fn handle_document_start(&self, url: Option<&str>) {
        let mut state = self.state.write();
        state.load_state = LoadState::Loading;
        if let Some(url) = url {
            state.url = Some(url.to_string());
        }
    }

    pub(crate) fn handle_document_stop(&self, success: bool) {
        self.state.write().load_state = if success {
            LoadState::Success
        } else {
            LoadState::Error
        };
    }

    /// Terminal: the tab has left the registry.
    pub(crate) fn on_destroy(&self) {
        self.state.write().lifecycle = Lifecycle::Closed;
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map(|(base, _)| base).unwrap_or(url)
}

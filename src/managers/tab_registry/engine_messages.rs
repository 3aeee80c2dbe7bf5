//! Applies engine notifications to the registry.
//!
//! A message that fails validation, or names a tab that is gone, is logged
//! and dropped before any state is touched.

use std::sync::Arc;

use super::{NewTab, TabRegistry};
use crate::managers::listeners::Notification;
use crate::types::errors::MessageError;
use crate::types::events::TabEvent;
use crate::types::message::{EngineEnvelope, EngineMessage, NavigationState, PROTOCOL_VERSION};
use crate::types::tab::{Favicon, LoadState, Tab, TabId, TabKind};

impl TabRegistry {
    /// Parses one JSON-encoded engine message and applies it.
    pub fn handle_message(&self, raw: &str) -> Result<(), MessageError> {
        let envelope = serde_json::from_str::<EngineEnvelope>(raw).map_err(|e| {
            log::warn!("Dropping malformed engine message: {}", e);
            MessageError::from(e)
        })?;
        self.handle_envelope(envelope)
    }

    /// Same as [`handle_message`](Self::handle_message) for an already-parsed value.
    pub fn handle_json(&self, value: serde_json::Value) -> Result<(), MessageError> {
        let envelope = serde_json::from_value::<EngineEnvelope>(value).map_err(|e| {
            log::warn!("Dropping malformed engine message: {}", e);
            MessageError::from(e)
        })?;
        self.handle_envelope(envelope)
    }

    fn handle_envelope(&self, envelope: EngineEnvelope) -> Result<(), MessageError> {
        if envelope.version != PROTOCOL_VERSION {
            log::warn!(
                "Dropping engine message with version {} (expected {})",
                envelope.version,
                PROTOCOL_VERSION
            );
            return Err(MessageError::UnsupportedVersion(envelope.version));
        }
        self.handle_engine_message(envelope.message)
    }

    /// Applies a validated engine message.
    pub fn handle_engine_message(&self, message: EngineMessage) -> Result<(), MessageError> {
        let guard = self.mutation.lock();

        match message {
            EngineMessage::TabAdded {
                tab_id,
                uri,
                title,
                parent_id,
                external,
                is_private,
                stub,
                selected,
                delay_load,
                desktop_mode,
                tab_index,
            } => {
                let tab = if stub {
                    // Created by load_url, which already decided its selection.
                    // A missing stub means it was closed before the engine
                    // caught up.
                    let tab = self.require(tab_id)?;
                    tab.confirm_open();
                    tab
                } else {
                    let tab = self.add_tab_locked(
                        &guard,
                        NewTab {
                            id: tab_id,
                            url: uri,
                            title,
                            parent_id,
                            external,
                            kind: if is_private {
                                TabKind::Private
                            } else {
                                TabKind::Normal
                            },
                            insert_index: tab_index,
                        },
                    );
                    tab.confirm_open();
                    if selected {
                        self.select_tab_locked(&guard, tab_id);
                    }
                    tab
                };
                if delay_load {
                    tab.set_load_state(LoadState::Delayed);
                }
                if desktop_mode {
                    tab.set_desktop_mode(true);
                }
            }
            EngineMessage::TabClose {
                tab_id,
                show_undo_toast,
            } => {
                let tab = self.require(tab_id)?;
                let next = self.get_next_tab(&tab);
                self.close_tab_locked(&guard, &tab, next, show_undo_toast);
            }
            EngineMessage::TabSelect { tab_id } => {
                self.require(tab_id)?;
                self.select_tab_locked(&guard, tab_id);
            }
            EngineMessage::TabMove { tab_id, index } => {
                self.require(tab_id)?;
                self.move_tab_locked(&guard, tab_id, index);
            }
            EngineMessage::LocationChange { tab_id, uri } => {
                let tab = self.require(tab_id)?;
                tab.handle_location_change(&uri);
                let mut batch = vec![Notification {
                    tab: Some(Arc::clone(&tab)),
                    event: TabEvent::LocationChange,
                    data: Some(uri),
                }];
                batch.extend(self.refresh_saved_state(&tab));
                self.notify(batch);
            }
            EngineMessage::StateChange {
                tab_id,
                state,
                success,
                uri,
            } => {
                let tab = self.require(tab_id)?;
                match state {
                    NavigationState::Start => {
                        tab.handle_document_start(uri.as_deref());
                        self.emit(&tab, TabEvent::Start, uri);
                    }
                    NavigationState::Stop => {
                        tab.handle_document_stop(success);
                        self.emit(&tab, TabEvent::Stop, None);
                    }
                }
            }
            EngineMessage::LoadError { tab_id } => {
                let tab = self.require(tab_id)?;
                tab.set_load_state(LoadState::Error);
                self.emit(&tab, TabEvent::LoadError, None);
            }
            EngineMessage::PageShow { tab_id } => {
                let tab = self.require(tab_id)?;
                self.emit(&tab, TabEvent::PageShow, None);
            }
            EngineMessage::ContentLoaded {
                tab_id,
                background_color,
            } => {
                let tab = self.require(tab_id)?;
                tab.set_background_color(background_color);
                self.emit(&tab, TabEvent::Loaded, None);
            }
            EngineMessage::TitleChanged { tab_id, title } => {
                let tab = self.require(tab_id)?;
                tab.set_title(&title);
                self.emit(&tab, TabEvent::Title, Some(title));
            }
            EngineMessage::Favicon { tab_id, href, size } => {
                let tab = self.require(tab_id)?;
                tab.add_favicon(Favicon {
                    href: href.clone(),
                    size,
                });
                self.emit(&tab, TabEvent::Favicon, Some(href));
            }
            EngineMessage::DesktopModeChanged {
                tab_id,
                desktop_mode,
            } => {
                let tab = self.require(tab_id)?;
                tab.set_desktop_mode(desktop_mode);
                self.emit(&tab, TabEvent::DesktopModeChange, None);
            }
            EngineMessage::SessionRestoreEnd => {
                self.finish_restore_locked(&guard);
            }
        }
        Ok(())
    }

    fn require(&self, tab_id: TabId) -> Result<Arc<Tab>, MessageError> {
        self.get_tab(tab_id).ok_or_else(|| {
            log::debug!("Dropping engine message for unknown tab {}", tab_id);
            MessageError::UnknownTab(tab_id)
        })
    }

    fn emit(&self, tab: &Arc<Tab>, event: TabEvent, data: Option<String>) {
        self.notify(vec![Notification {
            tab: Some(Arc::clone(tab)),
            event,
            data,
        }]);
    }
}

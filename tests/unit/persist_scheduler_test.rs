//! Unit tests for debounced tab list persistence.

#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{Harness, RecordingSink};
use fennec_tabs::managers::tab_registry::NewTab;
use fennec_tabs::services::persist_scheduler::{PersistScheduler, PersistenceSink, SnapshotSource};
use fennec_tabs::types::errors::SessionError;
use fennec_tabs::types::session::PersistedTab;

const DEBOUNCE: Duration = Duration::from_millis(150);
const SETTLE: Duration = Duration::from_millis(700);

fn harness() -> Harness {
    let h = Harness::restoring(DEBOUNCE);
    h.registry.finish_restore();
    h
}

fn fixed_source(tabs: Vec<PersistedTab>) -> SnapshotSource {
    Arc::new(move || tabs.clone())
}

#[test]
fn test_burst_of_selections_collapses_into_one_write() {
    let h = harness();
    for id in 0..4 {
        h.registry
            .add_tab(NewTab::new(id, Some(&format!("https://t{}.example/", id))));
    }
    h.registry.move_tab(3, 0);

    for i in 0..10u32 {
        h.registry.select_tab(i % 4);
    }
    thread::sleep(SETTLE);

    let writes = h.sink.writes();
    assert_eq!(writes.len(), 1);
    let written = &writes[0];
    assert_eq!(
        written.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![3, 0, 1, 2]
    );
    let selected: Vec<u32> = written.iter().filter(|t| t.selected).map(|t| t.id).collect();
    assert_eq!(selected, vec![1]);
}

#[test]
fn test_nothing_is_written_inside_the_window() {
    let h = harness();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry.select_tab(1);

    assert!(h.sink.writes().is_empty());
    thread::sleep(SETTLE);
    assert_eq!(h.sink.writes().len(), 1);
}

#[test]
fn test_non_persisting_events_do_not_schedule() {
    let h = harness();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry
        .handle_message(r#"{"type":"DOMTitleChanged","tabID":1,"title":"T"}"#)
        .unwrap();
    thread::sleep(SETTLE);

    assert!(h.sink.writes().is_empty());
}

#[test]
fn test_location_change_schedules_write() {
    let h = harness();
    h.registry.add_tab(NewTab::new(1, Some("https://a.example/")));
    h.registry
        .handle_message(r#"{"type":"Content:LocationChange","tabID":1,"uri":"https://b.example/"}"#)
        .unwrap();
    thread::sleep(SETTLE);

    let writes = h.sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0][0].url.as_deref(), Some("https://b.example/"));
}

#[test]
fn test_persist_now_cancels_pending_write() {
    let h = harness();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry.select_tab(1);

    h.registry.persist_now().unwrap();
    assert_eq!(h.sink.writes().len(), 1);

    thread::sleep(SETTLE);
    assert_eq!(h.sink.writes().len(), 1);
}

#[test]
fn test_snapshot_marks_private_tabs() {
    let h = harness();
    h.registry.add_tab(NewTab::new(1, None));
    h.registry.add_tab(NewTab::new(2, None).private());
    h.registry.persist_now().unwrap();

    let written = &h.sink.writes()[0];
    assert_eq!(written.len(), 2);
    assert!(!written[0].is_private);
    assert!(written[1].is_private);
}

#[test]
fn test_scheduler_replaces_pending_write() {
    let sink = Arc::new(RecordingSink::default());
    let scheduler = PersistScheduler::new(sink.clone(), fixed_source(Vec::new()), DEBOUNCE).unwrap();
    assert_eq!(scheduler.debounce(), DEBOUNCE);
    assert!(!scheduler.has_pending());

    scheduler.schedule();
    scheduler.schedule();
    scheduler.schedule();
    assert!(scheduler.has_pending());

    thread::sleep(SETTLE);
    assert_eq!(sink.writes().len(), 1);
    assert!(!scheduler.has_pending());
}

struct FailingSink {
    attempts: AtomicUsize,
}

impl PersistenceSink for FailingSink {
    fn persist(&self, _tabs: &[PersistedTab]) -> Result<(), SessionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SessionError::Database(rusqlite::Error::InvalidQuery))
    }
}

#[test]
fn test_failed_write_does_not_stop_scheduler() {
    let sink = Arc::new(FailingSink {
        attempts: AtomicUsize::new(0),
    });
    let scheduler = PersistScheduler::new(sink.clone(), fixed_source(Vec::new()), DEBOUNCE).unwrap();

    scheduler.schedule();
    thread::sleep(SETTLE);
    scheduler.schedule();
    thread::sleep(SETTLE);

    assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    assert!(scheduler.flush_now().is_err());
}

//! Single UI thread that runs queued jobs in submission order.
//!
//! Listener notifications are marshalled here no matter which thread caused
//! them, so listeners observe events in mutation order and never run
//! concurrently with each other.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use crate::types::errors::SchedulerError;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    Run(Job),
    Shutdown,
}

pub struct UiDispatcher {
    tx: Sender<Command>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl UiDispatcher {
    /// Spawns the UI thread.
    pub fn spawn() -> Result<Self, SchedulerError> {
        let (tx, rx) = mpsc::channel::<Command>();
        let handle = thread::Builder::new()
            .name("tabs-ui".to_string())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        Command::Run(job) => {
                            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                                log::error!("UI job panicked; continuing with the next one");
                            }
                        }
                        Command::Shutdown => break,
                    }
                }
                log::debug!("UI thread exiting");
            })?;

        Ok(Self {
            tx,
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    /// Queues a job behind everything already posted.
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Command::Run(Box::new(job))).is_err() {
            log::warn!("UI thread is gone; dropping job");
        }
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Blocks until every job posted before this call has run.
    ///
    /// Returns immediately when called on the UI thread itself.
    pub fn flush(&self) {
        if self.is_ui_thread() {
            return;
        }
        let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);
        self.post(move || {
            let _ = done_tx.send(());
        });
        let _ = done_rx.recv();
    }
}

impl Drop for UiDispatcher {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

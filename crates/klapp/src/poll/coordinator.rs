//! Scheduled inbox refresh
//!
//! Runs the unread fetch on a fixed interval in a background thread and
//! publishes the latest state as an [`InboxSnapshot`]. A failed refresh
//! keeps the previous messages and flags the snapshot unavailable; the
//! schedule carries on regardless.

use log::{info, warn};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::api::{KlappClient, KlappError};
use crate::models::InboxSnapshot;

/// State shared between the poller handle and its worker thread
struct PollerCore {
    client: Arc<KlappClient>,
    snapshot: Mutex<InboxSnapshot>,
    // Serializes scheduled and on-demand refreshes.
    refresh_gate: Mutex<()>,
}

impl PollerCore {
    fn refresh(&self) -> Result<(), KlappError> {
        let _gate = self.refresh_gate.lock().unwrap();
        match self.client.get_unread_messages() {
            Ok(messages) => {
                info!("inbox refreshed: {} unread", messages.len());
                *self.snapshot.lock().unwrap() = InboxSnapshot::fresh(messages);
                Ok(())
            }
            Err(err) => {
                warn!("inbox refresh failed: {err}");
                let mut snapshot = self.snapshot.lock().unwrap();
                snapshot.available = false;
                snapshot.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

/// Periodic inbox poller.
///
/// Construction runs the first refresh synchronously so a broken
/// account fails setup instead of surfacing later; afterwards a worker
/// thread repeats the fetch on the configured interval. Dropping the
/// poller stops the worker and waits for it.
pub struct Poller {
    core: Arc<PollerCore>,
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start polling. Fails if the initial refresh fails.
    pub fn start(client: Arc<KlappClient>, interval: Duration) -> Result<Self, KlappError> {
        let core = Arc::new(PollerCore {
            client,
            snapshot: Mutex::new(InboxSnapshot::default()),
            refresh_gate: Mutex::new(()),
        });

        core.refresh()?;

        let (stop_tx, stop_rx) = mpsc::channel();
        let worker_core = Arc::clone(&core);
        let worker = std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        // A failed refresh degrades the snapshot but
                        // never ends the schedule.
                        let _ = worker_core.refresh();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self {
            core,
            stop_tx,
            worker: Some(worker),
        })
    }

    /// The latest published state
    pub fn snapshot(&self) -> InboxSnapshot {
        self.core.snapshot.lock().unwrap().clone()
    }

    /// Run a refresh immediately, outside the schedule
    pub fn refresh_now(&self) -> Result<(), KlappError> {
        self.core.refresh()
    }

    /// Stop the worker and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// Manual impl: the client holds a ureq Agent, which has no Debug.
impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller").finish_non_exhaustive()
    }
}

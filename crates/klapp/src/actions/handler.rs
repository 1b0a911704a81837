//! Action handler for read receipts
//!
//! Coordinates between the KLAPP API and the poller for mutations.

use log::{debug, info};
use std::sync::Arc;

use crate::api::{KlappClient, KlappError};
use crate::models::MessageId;
use crate::poll::Poller;

/// Handler for mark-as-read commands.
///
/// Commands are performed in two steps:
/// 1. Call the KLAPP API to update server state
/// 2. Force a refresh so the published snapshot reflects the change
pub struct ActionHandler {
    client: Arc<KlappClient>,
    poller: Arc<Poller>,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(client: Arc<KlappClient>, poller: Arc<Poller>) -> Self {
        Self { client, poller }
    }

    /// Mark a single message as read
    pub fn mark_read(&self, id: &MessageId) -> Result<(), KlappError> {
        info!("marking message {} as read", id.as_str());
        self.client.mark_as_read(id)?;
        self.refresh_after_change();
        Ok(())
    }

    /// Mark every currently tracked unread message as read.
    ///
    /// Returns the number of messages acknowledged. With nothing
    /// tracked this is a no-op: no request is sent and no refresh runs.
    pub fn mark_all_read(&self) -> Result<usize, KlappError> {
        let ids = self.poller.snapshot().unread_ids();
        if ids.is_empty() {
            debug!("no unread messages to mark");
            return Ok(0);
        }

        info!("marking {} messages as read", ids.len());
        self.client.mark_many_as_read(&ids)?;
        self.refresh_after_change();
        Ok(ids.len())
    }

    // The command already succeeded; a failed refresh here only leaves
    // the snapshot stale until the next scheduled run.
    fn refresh_after_change(&self) {
        let _ = self.poller.refresh_now();
    }
}

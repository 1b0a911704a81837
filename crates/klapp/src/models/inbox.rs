//! Published inbox state and its display projection

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{MessageDetail, MessageId};

/// Inbox state published by the poller.
///
/// `messages` holds the result of the most recent successful fetch.
/// A failed refresh keeps the previous list and flips `available` to
/// false, so consumers see stale data rather than nothing.
#[derive(Debug, Clone, Default)]
pub struct InboxSnapshot {
    pub messages: Vec<MessageDetail>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub available: bool,
    pub last_error: Option<String>,
}

impl InboxSnapshot {
    /// Snapshot for a fetch that just succeeded
    pub fn fresh(messages: Vec<MessageDetail>) -> Self {
        Self {
            messages,
            last_success_at: Some(Utc::now()),
            available: true,
            last_error: None,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.messages.len()
    }

    /// IDs of the tracked messages, skipping records without one
    pub fn unread_ids(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter_map(|m| m.id())
            .filter(|id| !id.is_empty())
            .map(MessageId::new)
            .collect()
    }

    /// Project the snapshot into its display form
    pub fn report(&self) -> InboxReport {
        let latest = self.messages.first();
        InboxReport {
            total_unread: self.messages.len(),
            latest_subject: latest.and_then(|m| m.subject()).map(str::to_string),
            latest_body: latest.and_then(|m| m.body_html()).map(str::to_string),
            latest_id: latest.and_then(|m| m.id()).map(str::to_string),
            latest_sent_at: latest.and_then(|m| m.sent_at()).map(str::to_string),
            messages: self.messages.iter().map(MessageBrief::from_detail).collect(),
            available: self.available,
            last_success_at: self.last_success_at,
        }
    }
}

/// Display projection of an [`InboxSnapshot`].
///
/// The first message in the snapshot is the most recent; the `latest_*`
/// fields are taken from it.
#[derive(Debug, Clone, Serialize)]
pub struct InboxReport {
    pub total_unread: usize,
    pub latest_subject: Option<String>,
    pub latest_body: Option<String>,
    pub latest_id: Option<String>,
    pub latest_sent_at: Option<String>,
    pub messages: Vec<MessageBrief>,
    pub available: bool,
    pub last_success_at: Option<DateTime<Utc>>,
}

/// One line of the report's message list
#[derive(Debug, Clone, Serialize)]
pub struct MessageBrief {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub sent_at: Option<String>,
}

impl MessageBrief {
    fn from_detail(detail: &MessageDetail) -> Self {
        Self {
            id: detail.id().map(str::to_string),
            subject: detail.subject().map(str::to_string),
            sent_at: detail.sent_at().map(str::to_string),
        }
    }
}

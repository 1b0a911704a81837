//! KLAPP API HTTP client
//!
//! Provides the message operations of the KLAPP parent API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Mutex;
use std::time::Duration;
use ureq::Agent;

use super::wire::{MessageSummary, ReadRequest, UnreadQuery};
use super::{KlappAuth, KlappError};
use crate::config::Account;
use crate::models::{MessageDetail, MessageId};

/// Lazily created HTTP transport shared by all API calls.
///
/// The agent pools connections across requests. `close` drops it; the
/// next call transparently creates a new one, so a closed client stays
/// usable.
struct Transport {
    agent: Mutex<Option<Agent>>,
    timeout: Duration,
}

impl Transport {
    fn new(timeout: Duration) -> Self {
        Self {
            agent: Mutex::new(None),
            timeout,
        }
    }

    /// Get the shared agent, creating it on first use
    fn acquire(&self) -> Agent {
        let mut slot = self.agent.lock().unwrap();
        slot.get_or_insert_with(|| {
            Agent::config_builder()
                .timeout_global(Some(self.timeout))
                .http_status_as_error(false)
                .build()
                .new_agent()
        })
        .clone()
    }

    /// Drop the agent. Safe to call repeatedly or before first use.
    fn close(&self) {
        self.agent.lock().unwrap().take();
    }
}

/// KLAPP API client scoped to a single parent account.
///
/// Every protected operation renews the token and retries at most once
/// when the server answers 401; a second 401 after a successful renewal
/// is surfaced as an auth error.
pub struct KlappClient {
    base_url: String,
    auth: KlappAuth,
    transport: Transport,
    lookback_days: u32,
}

impl KlappClient {
    /// KLAPP API base URL
    const BASE_URL: &'static str = "https://api.klapp.mobi";

    /// Timeout applied to each individual request
    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new client against the production API
    pub fn new(account: Account, lookback_days: u32) -> Self {
        Self::with_base_url(account, lookback_days, Self::BASE_URL)
    }

    /// Create a client against a non-default endpoint (staging, tests)
    pub fn with_base_url(
        account: Account,
        lookback_days: u32,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            auth: KlappAuth::new(account, &base_url),
            transport: Transport::new(Self::TIMEOUT),
            base_url,
            lookback_days,
        }
    }

    /// Replace the per-request timeout (shortened in tests)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = Transport::new(timeout);
        self
    }

    /// Fetch unread messages with full details.
    ///
    /// The time constraint is pushed to the server: the query carries a
    /// `from_date` of now minus the configured lookback, so only recent
    /// unread messages come back. Each summary the query yields is then
    /// expanded through [`Self::get_message_details`], in order;
    /// entries without an id are skipped.
    pub fn get_unread_messages(&self) -> Result<Vec<MessageDetail>, KlappError> {
        let agent = self.transport.acquire();
        let mut token = self.auth.ensure(&agent)?;
        let mut renewed = false;

        let url = format!("{}/v4/messages/parent?include_drafts=true", self.base_url);
        let summaries: Vec<MessageSummary> = loop {
            let query = UnreadQuery::unread_since(lookback_window(Utc::now(), self.lookback_days));
            let result = agent
                .post(&url)
                .header("accept", "application/json")
                .header("authorization", &format!("Bearer {}", token))
                .header("user-role", "parent")
                .send_json(&query);

            match result {
                Ok(mut response) => match response.status().as_u16() {
                    200 => {
                        break response.body_mut().read_json().map_err(|e| {
                            KlappError::connection(format!("invalid message list: {e}"))
                        })?;
                    }
                    401 if !renewed => {
                        token = self.auth.authenticate(&agent)?;
                        renewed = true;
                    }
                    401 => return Err(KlappError::auth("unauthorized after token renewal")),
                    status => return Err(KlappError::connection(format!("HTTP {status}"))),
                },
                Err(err) => return Err(KlappError::from_transport(err)),
            }
        };

        let mut details = Vec::with_capacity(summaries.len());
        for summary in summaries {
            if let Some(id) = summary.id
                && !id.is_empty()
            {
                details.push(self.get_message_details(&MessageId::new(id))?);
            }
        }
        Ok(details)
    }

    /// Get the full record of a specific message
    pub fn get_message_details(&self, id: &MessageId) -> Result<MessageDetail, KlappError> {
        let agent = self.transport.acquire();
        let mut token = self.auth.ensure(&agent)?;
        let mut renewed = false;

        let url = format!(
            "{}/v4/messages/{}/parent?include_drafts=true",
            self.base_url,
            urlencoding::encode(id.as_str())
        );

        loop {
            let result = agent
                .get(&url)
                .header("accept", "application/json")
                .header("authorization", &format!("Bearer {}", token))
                .header("user-role", "parent")
                .call();

            match result {
                Ok(mut response) => match response.status().as_u16() {
                    200 => {
                        return response.body_mut().read_json().map_err(|e| {
                            KlappError::connection(format!("invalid message detail: {e}"))
                        });
                    }
                    401 if !renewed => {
                        token = self.auth.authenticate(&agent)?;
                        renewed = true;
                    }
                    401 => return Err(KlappError::auth("unauthorized after token renewal")),
                    status => return Err(KlappError::connection(format!("HTTP {status}"))),
                },
                Err(err) => return Err(KlappError::from_transport(err)),
            }
        }
    }

    /// Acknowledge a single message
    pub fn mark_as_read(&self, id: &MessageId) -> Result<(), KlappError> {
        self.mark_many_as_read(std::slice::from_ref(id))
    }

    /// Acknowledge a batch of messages in one request.
    ///
    /// An empty batch is a local no-op: no connection is opened and no
    /// authentication is triggered.
    pub fn mark_many_as_read(&self, ids: &[MessageId]) -> Result<(), KlappError> {
        if ids.is_empty() {
            return Ok(());
        }

        let agent = self.transport.acquire();
        let mut token = self.auth.ensure(&agent)?;
        let mut renewed = false;

        let url = format!("{}/v3/messages/read-request", self.base_url);
        let request = ReadRequest::new(ids);

        loop {
            let result = agent
                .post(&url)
                .header("accept", "application/json")
                .header("authorization", &format!("Bearer {}", token))
                .send_json(&request);

            match result {
                Ok(response) => match response.status().as_u16() {
                    200 => return Ok(()),
                    401 if !renewed => {
                        token = self.auth.authenticate(&agent)?;
                        renewed = true;
                    }
                    401 => return Err(KlappError::auth("unauthorized after token renewal")),
                    status => return Err(KlappError::connection(format!("HTTP {status}"))),
                },
                Err(err) => return Err(KlappError::from_transport(err)),
            }
        }
    }

    /// Drop the pooled connection. The token is kept; the next call
    /// reconnects without re-authenticating.
    pub fn close(&self) {
        self.transport.close();
    }

    /// Whether an API token is currently held
    pub fn has_token(&self) -> bool {
        self.auth.has_token()
    }
}

/// Compute the RFC 3339 lower bound for the unread query.
///
/// Seconds precision, UTC offset spelled out, matching what the server
/// expects in `from_date`.
fn lookback_window(now: DateTime<Utc>, days: u32) -> String {
    (now - chrono::Duration::days(days as i64)).to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lookback_window_subtracts_days() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(lookback_window(now, 3), "2024-05-07T12:00:00+00:00");
    }

    #[test]
    fn test_lookback_window_truncates_subseconds() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(lookback_window(now, 0), "2024-05-10T12:00:00+00:00");
    }

    #[test]
    fn test_lookback_window_crosses_months() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap();
        assert_eq!(lookback_window(now, 3), "2024-02-27T06:30:00+00:00");
    }

    #[test]
    fn test_transport_close_is_idempotent() {
        let transport = Transport::new(Duration::from_secs(1));
        transport.close();
        transport.close();

        let _agent = transport.acquire();
        transport.close();
    }
}

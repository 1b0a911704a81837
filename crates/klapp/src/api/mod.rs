//! KLAPP API integration
//!
//! This module provides:
//! - Password-grant authentication with token renewal
//! - API client for unread message queries and read receipts

mod auth;
mod client;

pub use auth::KlappAuth;
pub use client::KlappClient;

/// Error surfaced by the KLAPP API client.
///
/// Every failure is one of two kinds: `Auth` for rejected credentials
/// or authorization, `Connection` for everything else (transport
/// failures, timeouts, unexpected statuses, unparseable bodies).
#[derive(Debug, thiserror::Error)]
pub enum KlappError {
    #[error("authentication failed: {message}")]
    Auth { message: String },

    #[error("connection failed: {message}")]
    Connection { message: String },
}

impl KlappError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Map a transport-level failure onto the connection kind.
    pub(crate) fn from_transport(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Self::connection("request timeout"),
            other => Self::connection(format!("connection error: {other}")),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// KLAPP API request and response types
pub mod wire {
    use serde::{Deserialize, Serialize};

    use crate::config::Account;
    use crate::models::MessageId;

    /// Body for the authenticate endpoint
    #[derive(Debug, Serialize)]
    pub struct AuthRequest<'a> {
        pub email: &'a str,
        pub password: &'a str,
        pub grant_type: &'static str,
    }

    impl<'a> AuthRequest<'a> {
        pub fn new(account: &'a Account) -> Self {
            Self {
                email: &account.email,
                password: &account.password,
                grant_type: "authenticate",
            }
        }
    }

    /// Response from the authenticate endpoint
    #[derive(Debug, Deserialize)]
    pub struct AuthResponse {
        pub refresh_token: Option<String>,
    }

    /// Filter body for the unread message query.
    ///
    /// Everything except `from_date` is fixed: the parent role sees
    /// active, non-archived, unread messages only.
    #[derive(Debug, Serialize)]
    pub struct UnreadQuery {
        pub skip: u32,
        pub classes: Vec<String>,
        pub active: bool,
        pub archived: bool,
        pub trash_bin: bool,
        pub only_unread: bool,
        pub only_absences: bool,
        pub sent_by_me: bool,
        pub sent_to_me: bool,
        pub only_personal: bool,
        pub only_drafts: bool,
        pub only_pinned: bool,
        pub query: String,
        pub from_date: String,
    }

    impl UnreadQuery {
        /// Build the fixed unread filter with the given lower time bound
        pub fn unread_since(from_date: String) -> Self {
            Self {
                skip: 0,
                classes: Vec::new(),
                active: true,
                archived: false,
                trash_bin: false,
                only_unread: true,
                only_absences: false,
                sent_by_me: false,
                sent_to_me: false,
                only_personal: false,
                only_drafts: false,
                only_pinned: false,
                query: String::new(),
                from_date,
            }
        }
    }

    /// One entry from the unread message query
    #[derive(Debug, Deserialize)]
    pub struct MessageSummary {
        pub id: Option<String>,
    }

    /// Body for the read-request endpoint
    #[derive(Debug, Serialize)]
    pub struct ReadRequest {
        pub messages: Vec<String>,
    }

    impl ReadRequest {
        pub fn new(ids: &[MessageId]) -> Self {
            Self {
                messages: ids.iter().map(|id| id.as_str().to_string()).collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::wire::*;
    use super::*;
    use crate::config::Account;
    use crate::models::MessageId;
    use serde_json::json;

    #[test]
    fn test_error_kinds() {
        let auth = KlappError::auth("nope");
        assert!(auth.is_auth());
        assert!(!auth.is_connection());

        let conn = KlappError::connection("down");
        assert!(conn.is_connection());
        assert!(!conn.is_auth());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            KlappError::auth("invalid credentials").to_string(),
            "authentication failed: invalid credentials"
        );
        assert_eq!(
            KlappError::connection("HTTP 503").to_string(),
            "connection failed: HTTP 503"
        );
    }

    #[test]
    fn test_auth_request_shape() {
        let account = Account::new("parent@example.com", "hunter2");
        let value = serde_json::to_value(AuthRequest::new(&account)).unwrap();
        assert_eq!(
            value,
            json!({
                "email": "parent@example.com",
                "password": "hunter2",
                "grant_type": "authenticate",
            })
        );
    }

    #[test]
    fn test_unread_query_shape() {
        let query = UnreadQuery::unread_since("2024-05-07T12:00:00+00:00".to_string());
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "skip": 0,
                "classes": [],
                "active": true,
                "archived": false,
                "trash_bin": false,
                "only_unread": true,
                "only_absences": false,
                "sent_by_me": false,
                "sent_to_me": false,
                "only_personal": false,
                "only_drafts": false,
                "only_pinned": false,
                "query": "",
                "from_date": "2024-05-07T12:00:00+00:00",
            })
        );
    }

    #[test]
    fn test_message_summary_tolerates_extra_fields() {
        let summary: MessageSummary = serde_json::from_value(json!({
            "id": "m1",
            "subject": "ignored",
            "pinned": false,
        }))
        .unwrap();
        assert_eq!(summary.id.as_deref(), Some("m1"));

        let idless: MessageSummary = serde_json::from_value(json!({"subject": "x"})).unwrap();
        assert!(idless.id.is_none());
    }

    #[test]
    fn test_read_request_from_ids() {
        let ids = vec![MessageId::new("m1"), MessageId::new("m2")];
        let value = serde_json::to_value(ReadRequest::new(&ids)).unwrap();
        assert_eq!(value, json!({"messages": ["m1", "m2"]}));
    }
}

//! Message identity and detail records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a message (KLAPP message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Full message record as returned by the detail endpoint.
///
/// The server payload is kept verbatim; accessors pull out the fields
/// the report layer uses and return `None` when the server omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageDetail(Value);

impl MessageDetail {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("subject").and_then(Value::as_str)
    }

    pub fn sent_at(&self) -> Option<&str> {
        self.0.get("sent_at").and_then(Value::as_str)
    }

    /// HTML body of the first reply, which carries the message text.
    pub fn body_html(&self) -> Option<&str> {
        self.0
            .get("replies")
            .and_then(|replies| replies.get(0))
            .and_then(|reply| reply.get("body_html"))
            .and_then(Value::as_str)
    }

    /// The raw server payload
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_id_conversions() {
        let id = MessageId::from("abc-123");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(MessageId::new(String::from("abc-123")), id);
    }

    #[test]
    fn test_detail_accessors() {
        let detail = MessageDetail::new(json!({
            "id": "m1",
            "subject": "Field trip",
            "sent_at": "2024-05-10T08:00:00+00:00",
            "replies": [{"body_html": "<p>Bring boots</p>"}],
        }));

        assert_eq!(detail.id(), Some("m1"));
        assert_eq!(detail.subject(), Some("Field trip"));
        assert_eq!(detail.sent_at(), Some("2024-05-10T08:00:00+00:00"));
        assert_eq!(detail.body_html(), Some("<p>Bring boots</p>"));
    }

    #[test]
    fn test_detail_missing_fields() {
        let detail = MessageDetail::new(json!({"replies": []}));

        assert_eq!(detail.id(), None);
        assert_eq!(detail.subject(), None);
        assert_eq!(detail.body_html(), None);
    }

    #[test]
    fn test_detail_keeps_payload_verbatim() {
        let value = json!({"id": "m1", "extra": {"nested": [1, 2, 3]}});
        let detail: MessageDetail = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(detail.as_json(), &value);
    }
}

//! Message types returned by the network.

use chrono::{DateTime, Utc};
use pagechat_core::{ConversationId, InboxId, MessageId};
use serde::{Deserialize, Serialize};

/// A message in a group conversation.
///
/// Serialized in camelCase; this is the element type of the relay's fetch
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// Inbox of the sender.
    pub sender_inbox_id: InboxId,
    /// Text content.
    pub content: String,
    /// When the network accepted the message.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        sender_inbox_id: InboxId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_inbox_id,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_fields() {
        let message = Message::new(
            MessageId::new("m1"),
            ConversationId::new("c1"),
            InboxId::new("i1"),
            "hello",
        );

        let json = serde_json::to_value(&message).expect("serialize");

        assert_eq!(json["id"], "m1");
        assert_eq!(json["conversationId"], "c1");
        assert_eq!(json["senderInboxId"], "i1");
        assert_eq!(json["content"], "hello");
        assert!(json["sentAt"].is_string());
    }
}

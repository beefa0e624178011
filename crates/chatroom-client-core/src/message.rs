use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    Chat,
    Join,
    Leave,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "CHAT",
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
            Self::Unknown => "UNKNOWN",
        }
    }

    #[must_use]
    pub fn is_presence_event(self) -> bool {
        matches!(self, Self::Join | Self::Leave)
    }
}

/// A message record as it travels over the broadcast topic or comes back from
/// the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sender: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(
        rename = "connectedUsers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_users: Option<Vec<String>>,
}

impl ChatMessage {
    /// Body published to the chat destination.
    #[must_use]
    pub fn chat(sender: &str, content: &str) -> Self {
        Self {
            sender: sender.to_string(),
            content: content.to_string(),
            kind: MessageKind::Chat,
            connected_users: None,
        }
    }

    /// Presence announcement. Carries no content; the server fills it in.
    #[must_use]
    pub fn join(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            content: String::new(),
            kind: MessageKind::Join,
            connected_users: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn decode_history(raw: &str) -> Result<Vec<ChatMessage>, serde_json::Error> {
    let records: Option<Vec<ChatMessage>> = serde_json::from_str(raw)?;
    Ok(records.unwrap_or_default())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_broadcast_with_roster() {
        let message = ChatMessage::from_json(
            &json!({
                "sender": "carol",
                "content": "carol joined!",
                "type": "JOIN",
                "connectedUsers": ["alice", "carol"],
            })
            .to_string(),
        )
        .expect("valid broadcast");

        assert_eq!(message.kind, MessageKind::Join);
        assert_eq!(message.content, "carol joined!");
        assert_eq!(
            message.connected_users,
            Some(vec!["alice".to_string(), "carol".to_string()])
        );
    }

    #[test]
    fn null_content_and_unknown_fields_are_tolerated() {
        let message = ChatMessage::from_json(
            &json!({
                "id": 42,
                "sender": "alice",
                "content": null,
                "type": "LEAVE",
                "timestamp": "2025-05-01T10:00:00",
            })
            .to_string(),
        )
        .expect("valid history record");

        assert_eq!(message.kind, MessageKind::Leave);
        assert!(message.content.is_empty());
        assert!(message.connected_users.is_none());
    }

    #[test]
    fn unrecognised_type_maps_to_unknown() {
        let message =
            ChatMessage::from_json(r#"{"sender":"x","content":"y","type":"TYPING"}"#)
                .expect("decodes");
        assert_eq!(message.kind, MessageKind::Unknown);

        let missing = ChatMessage::from_json(r#"{"sender":"x"}"#).expect("decodes");
        assert_eq!(missing.kind, MessageKind::Unknown);
    }

    #[test]
    fn join_announcement_serializes_without_content() {
        let body = ChatMessage::join("alice").to_json().expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(value, json!({"sender": "alice", "type": "JOIN"}));
    }

    #[test]
    fn chat_message_serializes_wire_shape() {
        let body = ChatMessage::chat("alice", " hello ")
            .to_json()
            .expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(
            value,
            json!({"sender": "alice", "content": " hello ", "type": "CHAT"})
        );
    }

    #[test]
    fn history_decodes_null_as_empty() {
        assert!(decode_history("null").expect("decodes").is_empty());
        assert!(decode_history("[]").expect("decodes").is_empty());
        let records =
            decode_history(r#"[{"sender":"bob","content":"hi","type":"CHAT"}]"#).expect("decodes");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sender, "bob");
    }

    #[test]
    fn presence_event_kinds() {
        assert!(MessageKind::Join.is_presence_event());
        assert!(MessageKind::Leave.is_presence_event());
        assert!(!MessageKind::Chat.is_presence_event());
        assert!(!MessageKind::Unknown.is_presence_event());
    }
}

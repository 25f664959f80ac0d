#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::Persona;

/// Persona marker rows carry ids in this all-zero leading group, keeping the
/// rest of a v4 uuid.
const MARKER_ID_PREFIX: &str = "00000000-";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_from_assistant: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_warned: Option<bool>,
}

impl Message {
    pub fn new(content: &str, is_from_assistant: bool) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            is_from_assistant,
            timestamp: Utc::now(),
            deletion_warned: None,
        };
    }

    pub fn user(content: &str) -> Message {
        return Message::new(content, false);
    }

    pub fn assistant(content: &str) -> Message {
        return Message::new(content, true);
    }

    /// Role name used by chat completion APIs.
    pub fn role(&self) -> &'static str {
        if self.is_from_assistant {
            return "assistant";
        }

        return "user";
    }
}

/// A row of the remote `messages` relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_type: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_warned: Option<bool>,
}

impl MessageRecord {
    pub fn from_message(user_id: &str, message: &Message, persona: Option<Persona>) -> MessageRecord {
        return MessageRecord {
            id: message.id.to_string(),
            user_id: user_id.to_string(),
            content: message.content.to_string(),
            is_bot: message.is_from_assistant,
            timestamp: message.timestamp,
            user_type: persona,
            deletion_warned: message.deletion_warned,
        };
    }

    /// Degenerate row remembering which persona the user picked.
    pub fn persona_marker(user_id: &str, persona: Persona) -> MessageRecord {
        let uuid = Uuid::new_v4().to_string();
        return MessageRecord {
            id: format!("{MARKER_ID_PREFIX}{}", &uuid[MARKER_ID_PREFIX.len()..]),
            user_id: user_id.to_string(),
            content: format!("User type set to {persona}"),
            is_bot: false,
            timestamp: Utc::now(),
            user_type: Some(persona),
            deletion_warned: None,
        };
    }

    /// Recognised by id, never by content: a user may type the marker text.
    pub fn is_persona_marker(&self) -> bool {
        return !self.is_bot
            && self.user_type.is_some()
            && self.id.starts_with(MARKER_ID_PREFIX);
    }

    pub fn into_message(self) -> Message {
        return Message {
            id: self.id,
            content: self.content,
            is_from_assistant: self.is_bot,
            timestamp: self.timestamp,
            deletion_warned: self.deletion_warned,
        };
    }
}

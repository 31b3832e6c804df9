use chat_provider::{PromptMessage, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ChatStoreError;

pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 100;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. You maintain context across conversations and remember previous discussions.";
/// Used when the prompt file vanished after the data directory was initialized.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// One persisted dialogue entry. Entries are never edited after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// RFC3339 creation time. Informational only; ordering is by position.
    #[serde(default)]
    pub timestamp: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn to_prompt(&self) -> PromptMessage {
        PromptMessage::new(self.role, self.content.clone())
    }
}

/// Persisted settings.
///
/// Keys this crate does not know about are carried through `extra` so a
/// rewrite never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub last_model: String,
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            last_model: String::new(),
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            created_at: None,
            extra: Map::new(),
        }
    }
}

impl ChatConfig {
    /// Defaults written on first run, stamped with the creation time.
    pub fn initial() -> Result<Self, ChatStoreError> {
        Ok(Self {
            created_at: Some(now_timestamp()?),
            ..Self::default()
        })
    }

    /// History bound with a zero value treated as unset.
    #[must_use]
    pub fn history_bound(&self) -> usize {
        if self.max_history_length == 0 {
            DEFAULT_MAX_HISTORY_LENGTH
        } else {
            self.max_history_length
        }
    }
}

fn default_max_history_length() -> usize {
    DEFAULT_MAX_HISTORY_LENGTH
}

pub fn now_timestamp() -> Result<String, ChatStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(ChatStoreError::ClockFormat)
}

#[cfg(test)]
mod tests {
    use chat_provider::Role;
    use serde_json::json;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    use super::{now_timestamp, ChatConfig, Message, DEFAULT_MAX_HISTORY_LENGTH};

    #[test]
    fn message_uses_flat_role_content_timestamp_shape() {
        let message = Message::new(Role::User, "hello", "2026-02-14T00:00:00Z");
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"role": "user", "content": "hello", "timestamp": "2026-02-14T00:00:00Z"})
        );
    }

    #[test]
    fn message_without_timestamp_still_parses() {
        let message: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "hi"})).expect("parse");
        assert_eq!(message.timestamp, "");
        assert_eq!(message.to_prompt().content, "hi");
    }

    #[test]
    fn config_missing_fields_take_defaults() {
        let config: ChatConfig = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(config, ChatConfig::default());
        assert_eq!(config.max_history_length, DEFAULT_MAX_HISTORY_LENGTH);
        assert_eq!(config.last_model, "");
    }

    #[test]
    fn config_preserves_unknown_keys() {
        let config: ChatConfig = serde_json::from_value(json!({
            "last_model": "llama3",
            "max_history_length": 5,
            "theme": "dark",
        }))
        .expect("parse");

        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(value["theme"], "dark");
        assert_eq!(value["max_history_length"], 5);
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn zero_history_bound_falls_back_to_default() {
        let config = ChatConfig {
            max_history_length: 0,
            ..ChatConfig::default()
        };
        assert_eq!(config.history_bound(), DEFAULT_MAX_HISTORY_LENGTH);
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let stamp = now_timestamp().expect("clock should format");
        assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
    }
}

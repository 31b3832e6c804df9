use chat_provider::Role;
use chat_store::{ConversationLog, Message};

use crate::input::format_preview;

/// Messages shown by `/summary`.
pub const SUMMARY_RECENT: usize = 5;
/// Preview width for each summarized message.
pub const SUMMARY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub label: &'static str,
    pub is_user: bool,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub total: usize,
    pub recent: Vec<SummaryEntry>,
    /// Messages older than the ones shown.
    pub remaining: usize,
}

impl ChatSummary {
    /// Summarizes the tail of `log`. Returns `None` for an empty history.
    pub fn from_log(log: &ConversationLog) -> Option<Self> {
        Self::new(log.len(), log.recent(SUMMARY_RECENT))
    }

    /// `recent` is the tail to show, oldest first, out of `total` messages.
    pub fn new(total: usize, recent: &[Message]) -> Option<Self> {
        if total == 0 {
            return None;
        }

        let entries = recent
            .iter()
            .map(|message| SummaryEntry {
                label: message.role.label(),
                is_user: message.role == Role::User,
                preview: format_preview(&message.content, SUMMARY_PREVIEW_CHARS),
            })
            .collect();

        Some(Self {
            total,
            recent: entries,
            remaining: total.saturating_sub(recent.len()),
        })
    }
}

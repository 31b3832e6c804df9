use std::fs;
use std::path::{Path, PathBuf};

use chat_provider::Role;
use serde_json::Value;

use crate::error::ChatStoreError;
use crate::paths::corrupt_backup_path;
use crate::record::{JsonRecord, RecordRead};
use crate::schema::{now_timestamp, Message};

/// Ordered, length-bounded message history persisted as one JSON array.
///
/// Invariant: after `load`, `append`, or `clear`, `len() <= max_history_length()`.
/// When the bound is exceeded the oldest entries are evicted first.
#[derive(Debug)]
pub struct ConversationLog {
    record: JsonRecord<Vec<Message>>,
    max_history_length: usize,
    messages: Vec<Message>,
    truncated_on_load: usize,
    rejected_on_load: usize,
}

impl ConversationLog {
    /// Reads the stored history. A missing file yields an empty log.
    ///
    /// Entries that are not valid messages are dropped one by one and the
    /// rest are kept; a file that is not a JSON array loads empty. In both
    /// cases the original bytes are copied to a `.corrupt` sibling before any
    /// later save can overwrite them. When the stored history is over the
    /// bound it is trimmed to the newest entries and rewritten; otherwise the
    /// file is left untouched.
    pub fn load(
        path: impl Into<PathBuf>,
        max_history_length: usize,
    ) -> Result<Self, ChatStoreError> {
        let record = JsonRecord::<Vec<Message>>::new(path);
        let max_history_length = max_history_length.max(1);
        let (mut messages, rejected_on_load) = read_entries(record.path());

        let truncated_on_load = messages.len().saturating_sub(max_history_length);
        if truncated_on_load > 0 {
            messages.drain(..truncated_on_load);
            record.save(&messages)?;
            tracing::warn!(
                path = %record.path().display(),
                dropped = truncated_on_load,
                max_history_length,
                "history exceeded bound on load; oldest entries dropped"
            );
        }

        Ok(Self {
            record,
            max_history_length,
            messages,
            truncated_on_load,
            rejected_on_load,
        })
    }

    /// Creates an empty history file if absent, then loads it.
    pub fn open(
        path: impl Into<PathBuf>,
        max_history_length: usize,
    ) -> Result<Self, ChatStoreError> {
        let record = JsonRecord::<Vec<Message>>::new(path);
        record.ensure_exists(|| Ok(Vec::new()))?;
        Self::load(record.path(), max_history_length)
    }

    /// Appends a message stamped with the current time, evicts the oldest
    /// entries past the bound, and rewrites the file before returning.
    ///
    /// On a persistence error the in-memory log is left unchanged.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Message, ChatStoreError> {
        let message = Message::new(role, content, now_timestamp()?);

        let mut next = Vec::with_capacity(self.messages.len() + 1);
        next.extend_from_slice(&self.messages);
        next.push(message.clone());
        let overflow = next.len().saturating_sub(self.max_history_length);
        next.drain(..overflow);

        self.record.save(&next)?;
        self.messages = next;
        tracing::debug!(
            role = %message.role,
            len = self.messages.len(),
            evicted = overflow,
            "message appended"
        );

        Ok(message)
    }

    /// Empties the log and persists the empty sequence.
    ///
    /// Callers own any confirmation policy.
    pub fn clear(&mut self) -> Result<(), ChatStoreError> {
        self.record.save(&Vec::new())?;
        self.messages.clear();
        Ok(())
    }

    /// The last `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn max_history_length(&self) -> usize {
        self.max_history_length
    }

    /// Entries dropped by the bound while loading.
    #[must_use]
    pub fn truncated_on_load(&self) -> usize {
        self.truncated_on_load
    }

    /// Stored entries that could not be read as messages. A file that was
    /// not a JSON array at all counts as one.
    #[must_use]
    pub fn rejected_on_load(&self) -> usize {
        self.rejected_on_load
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.record.path()
    }
}

fn read_entries(path: &Path) -> (Vec<Message>, usize) {
    let entries = match JsonRecord::<Vec<Value>>::new(path).read() {
        RecordRead::Loaded(entries) => entries,
        RecordRead::Missing => return (Vec::new(), 0),
        RecordRead::Invalid(reason) => {
            tracing::warn!(path = %path.display(), %reason, "history is unreadable; starting empty");
            back_up_corrupt(path);
            return (Vec::new(), 1);
        }
    };

    let mut rejected = 0;
    let messages: Vec<Message> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Message>(entry) {
            Ok(message) => Some(message),
            Err(error) => {
                rejected += 1;
                tracing::warn!(path = %path.display(), index, %error, "dropping unreadable history entry");
                None
            }
        })
        .collect();

    if rejected > 0 {
        back_up_corrupt(path);
    }

    (messages, rejected)
}

fn back_up_corrupt(path: &Path) {
    let Some(backup) = corrupt_backup_path(path) else {
        return;
    };

    match fs::copy(path, &backup) {
        Ok(_) => tracing::warn!(backup = %backup.display(), "kept a copy of the unreadable history"),
        Err(error) => tracing::warn!(
            backup = %backup.display(),
            %error,
            "could not copy unreadable history"
        ),
    }
}

use std::path::{Path, PathBuf};

use crate::error::ChatStoreError;
use crate::record::TextRecord;
use crate::schema::{DEFAULT_SYSTEM_PROMPT, FALLBACK_SYSTEM_PROMPT};

/// The instruction prefix, stored verbatim in `system_prompt.txt`.
#[derive(Debug)]
pub struct SystemPromptStore {
    record: TextRecord,
    text: String,
}

impl SystemPromptStore {
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let record = TextRecord::new(path);
        let text = record.load_or(FALLBACK_SYSTEM_PROMPT);
        Self { record, text }
    }

    /// Creates the file with the default prompt if absent, then loads it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ChatStoreError> {
        let record = TextRecord::new(path);
        if record.ensure_exists(DEFAULT_SYSTEM_PROMPT)? {
            tracing::info!(path = %record.path().display(), "created default system prompt");
        }
        Ok(Self::load(record.path()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.record.path()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Persists `text` as the whole prompt. The previous prompt is not kept.
    pub fn replace(&mut self, text: impl Into<String>) -> Result<(), ChatStoreError> {
        let text = text.into();
        self.record.save(&text)?;
        self.text = text;
        Ok(())
    }
}

use std::path::{Path, PathBuf};

use crate::error::ChatStoreError;
use crate::record::JsonRecord;
use crate::schema::ChatConfig;

/// Persisted settings backed by `config.json`.
#[derive(Debug)]
pub struct ConfigStore {
    record: JsonRecord<ChatConfig>,
    config: ChatConfig,
}

impl ConfigStore {
    /// Loads settings, falling back to `ChatConfig::default()` when the file is
    /// missing or malformed. Does not create the file.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let record = JsonRecord::new(path);
        let config = record.load_or_else(ChatConfig::default);
        if config.max_history_length == 0 {
            tracing::warn!(
                path = %record.path().display(),
                "max_history_length is 0; using default bound"
            );
        }

        Self { record, config }
    }

    /// Creates the file with first-run defaults if absent, then loads it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ChatStoreError> {
        let record = JsonRecord::<ChatConfig>::new(path);
        if record.ensure_exists(ChatConfig::initial)? {
            tracing::info!(path = %record.path().display(), "created default config");
        }
        Ok(Self::load(record.path()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.record.path()
    }

    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    #[must_use]
    pub fn last_model(&self) -> Option<&str> {
        Some(self.config.last_model.as_str()).filter(|model| !model.is_empty())
    }

    #[must_use]
    pub fn max_history_length(&self) -> usize {
        self.config.history_bound()
    }

    /// Records the selected model and persists immediately.
    pub fn update_last_model(&mut self, name: impl Into<String>) -> Result<(), ChatStoreError> {
        let mut next = self.config.clone();
        next.last_model = name.into();
        self.record.save(&next)?;
        self.config = next;
        Ok(())
    }
}

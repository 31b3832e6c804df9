use std::fs;
use std::path::PathBuf;

use crate::config::ConfigStore;
use crate::error::ChatStoreError;
use crate::history::ConversationLog;
use crate::paths::DataPaths;
use crate::system_prompt::SystemPromptStore;

/// All persisted state for one conversation directory.
///
/// Constructed once per session and passed explicitly to whoever mutates it.
/// Every mutation is written through before it returns, so dropping the store
/// loses nothing.
#[derive(Debug)]
pub struct ChatStore {
    paths: DataPaths,
    config: ConfigStore,
    system_prompt: SystemPromptStore,
    log: ConversationLog,
}

impl ChatStore {
    /// Opens `root`, creating the directory and default files on first use.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ChatStoreError> {
        let paths = DataPaths::new(root);
        fs::create_dir_all(&paths.root)
            .map_err(|source| ChatStoreError::io("creating data directory", &paths.root, source))?;

        let system_prompt = SystemPromptStore::open(&paths.system_prompt)?;
        let config = ConfigStore::open(&paths.config)?;
        let log = ConversationLog::open(&paths.history, config.max_history_length())?;

        tracing::debug!(
            root = %paths.root.display(),
            messages = log.len(),
            max_history_length = log.max_history_length(),
            "chat store opened"
        );

        Ok(Self {
            paths,
            config,
            system_prompt,
            log,
        })
    }

    #[must_use]
    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    #[must_use]
    pub fn system_prompt(&self) -> &SystemPromptStore {
        &self.system_prompt
    }

    pub fn system_prompt_mut(&mut self) -> &mut SystemPromptStore {
        &mut self.system_prompt
    }

    #[must_use]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }
}

//! Durable conversation state: settings, the system prompt, and the bounded
//! message log, each persisted as one whole file under a data directory.

mod config;
mod error;
mod history;
mod paths;
mod record;
mod schema;
mod store;
mod system_prompt;

pub use config::ConfigStore;
pub use error::ChatStoreError;
pub use history::ConversationLog;
pub use paths::{
    corrupt_backup_path, DataPaths, CONFIG_FILE_NAME, DEFAULT_DATA_DIR, HISTORY_FILE_NAME, SYSTEM_PROMPT_FILE_NAME,
};
pub use record::{JsonRecord, RecordRead, TextRecord};
pub use schema::{
    now_timestamp, ChatConfig, Message, DEFAULT_MAX_HISTORY_LENGTH, DEFAULT_SYSTEM_PROMPT,
    FALLBACK_SYSTEM_PROMPT,
};
pub use store::ChatStore;
pub use system_prompt::SystemPromptStore;

use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const HISTORY_FILE_NAME: &str = "chat_history.json";
pub const SYSTEM_PROMPT_FILE_NAME: &str = "system_prompt.txt";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// File locations for one conversation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub history: PathBuf,
    pub system_prompt: PathBuf,
    pub config: PathBuf,
}

impl DataPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            history: root.join(HISTORY_FILE_NAME),
            system_prompt: root.join(SYSTEM_PROMPT_FILE_NAME),
            config: root.join(CONFIG_FILE_NAME),
            root,
        }
    }
}

/// Sibling path used while replacing `path` wholesale.
#[must_use]
pub fn staging_path(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let file_name = path.file_name()?;
    Some(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// Sibling that keeps an unreadable record's bytes before it is overwritten.
#[must_use]
pub fn corrupt_backup_path(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?;
    Some(path.with_file_name(format!("{}.corrupt", file_name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{corrupt_backup_path, staging_path, DataPaths};

    #[test]
    fn data_paths_place_all_files_under_root() {
        let paths = DataPaths::new("/tmp/chat");
        assert_eq!(paths.history, Path::new("/tmp/chat/chat_history.json"));
        assert_eq!(paths.system_prompt, Path::new("/tmp/chat/system_prompt.txt"));
        assert_eq!(paths.config, Path::new("/tmp/chat/config.json"));
    }

    #[test]
    fn staging_path_is_hidden_sibling() {
        assert_eq!(
            staging_path(Path::new("/tmp/chat/config.json")),
            Some(Path::new("/tmp/chat/.config.json.tmp").to_path_buf())
        );
        assert_eq!(staging_path(Path::new("/")), None);
    }

    #[test]
    fn corrupt_backup_sits_next_to_record() {
        assert_eq!(
            corrupt_backup_path(Path::new("/tmp/chat/chat_history.json")),
            Some(Path::new("/tmp/chat/chat_history.json.corrupt").to_path_buf())
        );
    }
}

//! Whole-file records with load-side corruption tolerance.
//!
//! Saves replace the file through a staging sibling and a rename, so a reader
//! sees either the previous or the new content. Loads never fail: a missing,
//! unreadable, or malformed file yields the caller's default.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ChatStoreError;
use crate::paths::staging_path;

/// Result of reading a record before defaults are applied.
#[derive(Debug)]
pub enum RecordRead<T> {
    Loaded(T),
    Missing,
    Invalid(String),
}

impl<T> RecordRead<T> {
    pub fn unwrap_or_else(self, default: impl FnOnce() -> T) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Invalid(_) => default(),
        }
    }
}

/// A JSON document stored at one path.
#[derive(Debug, Clone)]
pub struct JsonRecord<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonRecord<T>
where
    T: Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> RecordRead<T> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return RecordRead::Missing,
            Err(error) => return RecordRead::Invalid(error.to_string()),
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => RecordRead::Loaded(value),
            Err(error) => RecordRead::Invalid(error.to_string()),
        }
    }

    /// Loads the record, substituting `default` when it cannot be used.
    pub fn load_or_else(&self, default: impl FnOnce() -> T) -> T {
        match self.read() {
            RecordRead::Invalid(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "record is unreadable; using default"
                );
                default()
            }
            other => other.unwrap_or_else(default),
        }
    }

    pub fn save(&self, value: &T) -> Result<(), ChatStoreError> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|source| ChatStoreError::json_serialize(&self.path, source))?;
        write_replacing(&self.path, &bytes)
    }

    /// Writes `initial()` when no file exists yet. Returns whether it wrote.
    pub fn ensure_exists(
        &self,
        initial: impl FnOnce() -> Result<T, ChatStoreError>,
    ) -> Result<bool, ChatStoreError> {
        if self.path.exists() {
            return Ok(false);
        }

        self.save(&initial()?)?;
        Ok(true)
    }
}

/// A plain UTF-8 text blob stored at one path.
#[derive(Debug, Clone)]
pub struct TextRecord {
    path: PathBuf,
}

impl TextRecord {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> RecordRead<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => RecordRead::Loaded(text),
            Err(error) if error.kind() == ErrorKind::NotFound => RecordRead::Missing,
            Err(error) => RecordRead::Invalid(error.to_string()),
        }
    }

    pub fn load_or(&self, default: &str) -> String {
        match self.read() {
            RecordRead::Invalid(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "text record is unreadable; using default"
                );
                default.to_string()
            }
            other => other.unwrap_or_else(|| default.to_string()),
        }
    }

    pub fn save(&self, text: &str) -> Result<(), ChatStoreError> {
        write_replacing(&self.path, text.as_bytes())
    }

    pub fn ensure_exists(&self, initial: &str) -> Result<bool, ChatStoreError> {
        if self.path.exists() {
            return Ok(false);
        }

        self.save(initial)?;
        Ok(true)
    }
}

fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), ChatStoreError> {
    let staging = staging_path(path).ok_or_else(|| ChatStoreError::InvalidRecordPath {
        path: path.to_path_buf(),
    })?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| ChatStoreError::io("creating record directory", parent, source))?;
    }

    if let Err(error) = write_staging(&staging, bytes) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }

    fs::rename(&staging, path).map_err(|source| {
        let _ = fs::remove_file(&staging);
        ChatStoreError::io("replacing record", path, source)
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "record saved");
    Ok(())
}

fn write_staging(staging: &Path, bytes: &[u8]) -> Result<(), ChatStoreError> {
    let mut file = File::create(staging)
        .map_err(|source| ChatStoreError::io("creating staging file", staging, source))?;
    file.write_all(bytes)
        .map_err(|source| ChatStoreError::io("writing staging file", staging, source))?;
    file.sync_all()
        .map_err(|source| ChatStoreError::io("syncing staging file", staging, source))
}

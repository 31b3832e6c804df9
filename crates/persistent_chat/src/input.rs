//! Input normalization and file-sourced input.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

fn escape_sequence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        // Real ANSI CSI sequences, plus their caret-escaped echoes like `^[[A`.
        Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]|\^?\[\[[0-9;]*[a-zA-Z]")
            .expect("escape sequence regex must compile")
    })
}

fn control_char_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("control char regex must compile")
    })
}

/// Strips terminal escape sequences and control characters, then collapses
/// runs of whitespace to single spaces.
pub fn clean_input(text: &str) -> String {
    let without_escapes = escape_sequence_regex().replace_all(text, "");
    let without_controls = control_char_regex().replace_all(&without_escapes, "");
    without_controls.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shortens `text` to at most `max_chars` characters, preferring to break at
/// a space within the last 20 characters of the window, and marks the cut
/// with `...`.
pub fn format_preview(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let break_point = (max_chars.saturating_sub(20)..max_chars)
        .find(|&index| chars[index] == ' ')
        .unwrap_or(max_chars);

    let preview: String = chars[..break_point].iter().collect();
    format!("{}...", preview.trim_end())
}

/// Expands a leading `~` to the home directory, when one is known.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match (raw.strip_prefix('~'), home) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            PathBuf::from(home).join(&rest[1..])
        }
        _ => PathBuf::from(raw),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileInputError {
    #[error("no file path provided")]
    NoPath,
    #[error("file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("'{}' is not a file", .0.display())]
    NotAFile(PathBuf),
    #[error("file '{}' is empty", .0.display())]
    Empty(PathBuf),
    #[error("could not read '{}' as UTF-8 text", .0.display())]
    NotUtf8(PathBuf),
    #[error("permission denied reading '{}'", .0.display())]
    PermissionDenied(PathBuf),
    #[error("error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads a whole UTF-8 file to use as one chat turn.
///
/// Surrounding quotes from drag-and-drop paths are removed and `~` is
/// expanded. Whitespace-only files count as empty.
pub fn read_file_input(raw_path: &str) -> Result<String, FileInputError> {
    let trimmed = raw_path.trim().trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        return Err(FileInputError::NoPath);
    }

    let path = expand_home(trimmed);
    check_is_file(&path)?;

    let bytes = fs::read(&path).map_err(|source| match source.kind() {
        ErrorKind::PermissionDenied => FileInputError::PermissionDenied(path.clone()),
        ErrorKind::NotFound => FileInputError::NotFound(path.clone()),
        _ => FileInputError::Io {
            path: path.clone(),
            source,
        },
    })?;

    let content = String::from_utf8(bytes).map_err(|_| FileInputError::NotUtf8(path.clone()))?;
    let content = content.trim();
    if content.is_empty() {
        return Err(FileInputError::Empty(path));
    }

    Ok(content.to_string())
}

fn check_is_file(path: &Path) -> Result<(), FileInputError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(FileInputError::NotAFile(path.to_path_buf())),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            Err(FileInputError::NotFound(path.to_path_buf()))
        }
        Err(error) if error.kind() == ErrorKind::PermissionDenied => {
            Err(FileInputError::PermissionDenied(path.to_path_buf()))
        }
        Err(source) => Err(FileInputError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

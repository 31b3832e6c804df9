use std::io;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// One read from the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D, or the input stream ended.
    Eof,
}

/// Source of interactive input lines.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine>;

    /// Records a submitted line for recall. Optional.
    fn add_history(&mut self, _entry: &str) {}
}

/// Line editor with arrow-key editing and in-session history recall.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new().map_err(|error| io::Error::other(error.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadLine::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadLine::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
            Err(ReadlineError::Io(error)) => Err(error),
            Err(error) => Err(io::Error::other(error.to_string())),
        }
    }

    fn add_history(&mut self, entry: &str) {
        let _ = self.editor.add_history_entry(entry);
    }
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chat_provider::{CancelSignal, ChatProvider};
use chat_provider_mock::MockProvider;
use chat_store::ChatStore;
use persistent_chat::readline::{LineReader, ReadLine};
use persistent_chat::session::SessionController;
use tempfile::TempDir;

/// Feeds canned lines to the app; reports `Eof` once exhausted.
pub struct ScriptedReader {
    lines: VecDeque<ReadLine>,
    pub prompts: Vec<String>,
    pub history: Vec<String>,
}

impl ScriptedReader {
    pub fn new(lines: &[&str]) -> Self {
        Self::from_reads(
            lines
                .iter()
                .map(|line| ReadLine::Line((*line).to_string()))
                .collect(),
        )
    }

    pub fn from_reads(reads: Vec<ReadLine>) -> Self {
        Self {
            lines: reads.into(),
            prompts: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front().unwrap_or(ReadLine::Eof))
    }

    fn add_history(&mut self, entry: &str) {
        self.history.push(entry.to_string());
    }
}

pub fn temp_store() -> (TempDir, ChatStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatStore::open(dir.path()).expect("store should open");
    (dir, store)
}

pub fn controller(provider: MockProvider) -> (TempDir, SessionController, Arc<MockProvider>) {
    let (dir, store) = temp_store();
    let provider = Arc::new(provider);
    let session = SessionController::new(store, Arc::clone(&provider) as Arc<dyn ChatProvider>);
    (dir, session, provider)
}

pub fn chunks(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

pub fn no_cancel() -> CancelSignal {
    Arc::new(AtomicBool::new(false))
}

pub fn disable_colors() {
    colored::control::set_override(false);
}

//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport logic. It backs session-controller tests
//! and the `--provider mock` mode of the command-line client.

use std::sync::atomic::Ordering;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_provider::{
    CancelSignal, ChatProvider, ChatRequest, ProviderProfile, Role, RunEvent, RunId,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Where the mock's reply text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Emit these fragments verbatim, in order.
    Scripted(Vec<String>),
    /// Echo the last user message back, one word per fragment.
    Echo,
}

/// How a run ends once the configured number of fragments has been emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEnding {
    /// Emit every fragment, then `Finished`.
    Complete,
    /// Emit `after` fragments, then `Failed` with `error`.
    FailAfter { after: usize, error: String },
    /// Emit `after` fragments, then raise the cancel flag as a user interrupt
    /// would and honor it.
    InterruptAfter { after: usize },
    /// Emit `after` fragments, then return `Err(error)` without a terminal event.
    ErrorAfter { after: usize, error: String },
    /// Emit `after` fragments, then panic.
    PanicAfter { after: usize },
    /// Emit every fragment and return `Ok(())` without a terminal event.
    Silent,
}

/// Deterministic mock provider used by tests and local runs.
#[derive(Debug)]
pub struct MockProvider {
    reply: MockReply,
    ending: MockEnding,
    models: Vec<String>,
    chunk_delay: Duration,
    stale_events: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Creates a mock that streams `chunks` and finishes cleanly.
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            reply: MockReply::Scripted(chunks),
            ending: MockEnding::Complete,
            models: default_models(),
            chunk_delay: Duration::ZERO,
            stale_events: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that echoes the user's last message.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            reply: MockReply::Echo,
            ..Self::new(Vec::new())
        }
    }

    #[must_use]
    pub fn with_ending(mut self, ending: MockEnding) -> Self {
        self.ending = ending;
        self
    }

    /// Replaces the advertised model list. Blank names are dropped; an empty
    /// list is kept so "no models available" paths can be exercised.
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models
            .into_iter()
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Interleaves events tagged with a different run id before each real one.
    #[must_use]
    pub fn with_stale_events(mut self) -> Self {
        self.stale_events = true;
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    fn fragments_for(&self, req: &ChatRequest) -> Vec<String> {
        match &self.reply {
            MockReply::Scripted(chunks) => chunks.clone(),
            MockReply::Echo => {
                let last_user = req
                    .messages
                    .iter()
                    .rev()
                    .find(|message| message.role == Role::User)
                    .map(|message| message.content.as_str())
                    .unwrap_or_default();
                echo_fragments(last_user)
            }
        }
    }

    fn limit(&self) -> Option<usize> {
        match &self.ending {
            MockEnding::FailAfter { after, .. }
            | MockEnding::InterruptAfter { after }
            | MockEnding::ErrorAfter { after, .. }
            | MockEnding::PanicAfter { after } => Some(*after),
            MockEnding::Complete | MockEnding::Silent => None,
        }
    }

    const CLI_TOKEN_DELAY_MS: u64 = 30;
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::echo().with_chunk_delay(Duration::from_millis(Self::CLI_TOKEN_DELAY_MS))
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            endpoint: None,
        }
    }

    fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn stream_chat(
        &self,
        req: ChatRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;
        let fragments = self.fragments_for(&req);
        lock_unpoisoned(&self.requests).push(req);

        let mut emit_tagged = |event: RunEvent| {
            if self.stale_events {
                emit(stale_copy(&event, run_id));
            }
            emit(event);
        };

        emit_tagged(RunEvent::Started { run_id });

        let limit = self.limit().unwrap_or(fragments.len());
        for text in fragments.into_iter().take(limit) {
            if cancel.load(Ordering::SeqCst) {
                emit_tagged(RunEvent::Cancelled { run_id });
                return Ok(());
            }

            emit_tagged(RunEvent::Chunk { run_id, text });
            if !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }

        match &self.ending {
            MockEnding::Complete => {}
            MockEnding::Silent => return Ok(()),
            MockEnding::FailAfter { error, .. } => {
                emit_tagged(RunEvent::Failed {
                    run_id,
                    error: error.clone(),
                });
                return Ok(());
            }
            MockEnding::InterruptAfter { .. } => {
                cancel.store(true, Ordering::SeqCst);
            }
            MockEnding::ErrorAfter { error, .. } => return Err(error.clone()),
            MockEnding::PanicAfter { .. } => panic!("mock provider panicked mid-stream"),
        }

        if cancel.load(Ordering::SeqCst) {
            emit_tagged(RunEvent::Cancelled { run_id });
        } else {
            emit_tagged(RunEvent::Finished { run_id });
        }

        Ok(())
    }
}

fn default_models() -> Vec<String> {
    vec!["mock".to_string(), "mock-alt".to_string()]
}

fn echo_fragments(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut pending = String::new();
    for ch in text.chars() {
        pending.push(ch);
        if matches!(ch, ' ' | '\n') {
            fragments.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        fragments.push(pending);
    }
    if fragments.is_empty() {
        fragments.push("(empty message)".to_string());
    }
    fragments
}

fn stale_copy(event: &RunEvent, run_id: RunId) -> RunEvent {
    let stale = run_id.wrapping_add(1_000);
    match event {
        RunEvent::Started { .. } => RunEvent::Started { run_id: stale },
        RunEvent::Chunk { .. } => RunEvent::Chunk {
            run_id: stale,
            text: "<stale>".to_string(),
        },
        RunEvent::Finished { .. } => RunEvent::Failed {
            run_id: stale,
            error: "stale failure".to_string(),
        },
        RunEvent::Failed { .. } | RunEvent::Cancelled { .. } => {
            RunEvent::Finished { run_id: stale }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

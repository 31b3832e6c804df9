//! Streaming session controller: one user turn in, one committed outcome out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chat_provider::{CancelSignal, ChatProvider, ChatRequest, Role, RunEvent, RunId};
use chat_store::{ChatStore, ChatStoreError, Message};

use crate::prompt::build_prompt;

/// Prefix of the assistant message written under [`FailureRecording::AssistantTurn`].
pub const FAILURE_PREFIX: &str = "Error communicating with model";

/// Where a failed turn is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureRecording {
    /// Return and log the failure; the conversation keeps only the user turn.
    #[default]
    OutOfBand,
    /// Also append the failure text as an assistant message.
    AssistantTurn,
}

/// Progress of the current or most recent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingFirstChunk { run_id: RunId },
    Streaming { run_id: RunId },
    Committed { run_id: RunId },
    Failed { run_id: RunId },
    Cancelled { run_id: RunId },
}

/// Result of one turn. The user message is durable in every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream completed and this assistant message was appended.
    Committed(Message),
    /// The backend failed. `recorded` is the assistant message written for it,
    /// if the failure policy writes one.
    Failed {
        error: String,
        recorded: Option<Message>,
    },
    /// The stream was interrupted. `partial` was shown but not stored.
    Cancelled { partial: String },
}

#[derive(Debug)]
enum Terminal {
    Finished,
    Failed(String),
    Cancelled,
}

/// Applies provider events for exactly one run id.
#[derive(Debug)]
struct TurnTracker {
    run_id: RunId,
    state: TurnState,
    accumulated: String,
    terminal: Option<Terminal>,
}

impl TurnTracker {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            state: TurnState::AwaitingFirstChunk { run_id },
            accumulated: String::new(),
            terminal: None,
        }
    }

    fn apply(&mut self, event: RunEvent, on_chunk: &mut dyn FnMut(&str)) {
        if event.run_id() != self.run_id {
            tracing::debug!(
                event_run_id = event.run_id(),
                active_run_id = self.run_id,
                "ignoring event for stale run"
            );
            return;
        }

        if self.terminal.is_some() {
            tracing::debug!(run_id = self.run_id, ?event, "ignoring event after terminal");
            return;
        }

        match event {
            RunEvent::Started { .. } => {}
            RunEvent::Chunk { text, .. } => {
                self.state = TurnState::Streaming {
                    run_id: self.run_id,
                };
                self.accumulated.push_str(&text);
                on_chunk(&text);
            }
            RunEvent::Finished { .. } => self.terminal = Some(Terminal::Finished),
            RunEvent::Failed { error, .. } => self.terminal = Some(Terminal::Failed(error)),
            RunEvent::Cancelled { .. } => self.terminal = Some(Terminal::Cancelled),
        }
    }

    /// Folds the provider's return value into the terminal. A terminal event
    /// already seen takes precedence.
    fn settle(&mut self, run_result: std::thread::Result<Result<(), String>>) -> Terminal {
        let fallback = match run_result {
            Ok(Ok(())) => Terminal::Failed("chat provider exited without terminal event".to_string()),
            Ok(Err(error)) => Terminal::Failed(error),
            Err(_) => Terminal::Failed("chat provider panicked".to_string()),
        };

        self.terminal.take().unwrap_or(fallback)
    }
}

/// Drives turns against a provider, persisting through the owned store.
pub struct SessionController {
    store: ChatStore,
    provider: Arc<dyn ChatProvider>,
    failure_recording: FailureRecording,
    next_run_id: RunId,
    state: TurnState,
}

impl SessionController {
    pub fn new(store: ChatStore, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            store,
            provider,
            failure_recording: FailureRecording::default(),
            next_run_id: 1,
            state: TurnState::Idle,
        }
    }

    #[must_use]
    pub fn with_failure_recording(mut self, failure_recording: FailureRecording) -> Self {
        self.failure_recording = failure_recording;
        self
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChatStore {
        &mut self.store
    }

    pub fn into_store(self) -> ChatStore {
        self.store
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn failure_recording(&self) -> FailureRecording {
        self.failure_recording
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn list_models(&self) -> Vec<String> {
        self.provider.list_models()
    }

    /// Runs one turn: appends the user message, streams the reply, and
    /// commits according to how the stream ended.
    ///
    /// `on_chunk` sees each fragment as it arrives. Only storage failures are
    /// returned as `Err`; backend failures are a [`TurnOutcome::Failed`].
    pub fn run_turn(
        &mut self,
        model: &str,
        user_text: &str,
        cancel: CancelSignal,
        mut on_chunk: impl FnMut(&str),
    ) -> Result<TurnOutcome, ChatStoreError> {
        self.store.log_mut().append(Role::User, user_text)?;

        let run_id = self.next_run_id;
        self.next_run_id += 1;

        let messages = {
            let logged = self.store.log().messages();
            let history = &logged[..logged.len().saturating_sub(1)];
            build_prompt(self.store.system_prompt().text(), history, user_text)
        };
        let request = ChatRequest {
            run_id,
            model: model.to_string(),
            messages,
        };

        tracing::debug!(run_id, model, prompt_messages = request.messages.len(), "turn started");

        let mut tracker = TurnTracker::new(run_id);
        self.state = tracker.state;

        let provider = Arc::clone(&self.provider);
        let run_result = catch_unwind(AssertUnwindSafe(|| {
            provider.stream_chat(request, cancel, &mut |event| {
                tracker.apply(event, &mut on_chunk);
            })
        }));
        self.state = tracker.state;

        let terminal = tracker.settle(run_result);
        let accumulated = std::mem::take(&mut tracker.accumulated);

        match terminal {
            Terminal::Finished => {
                let message = self.store.log_mut().append(Role::Assistant, accumulated)?;
                self.state = TurnState::Committed { run_id };
                tracing::debug!(run_id, chars = message.content.chars().count(), "turn committed");
                Ok(TurnOutcome::Committed(message))
            }
            Terminal::Cancelled => {
                self.state = TurnState::Cancelled { run_id };
                tracing::debug!(run_id, partial_chars = accumulated.chars().count(), "turn cancelled");
                Ok(TurnOutcome::Cancelled {
                    partial: accumulated,
                })
            }
            Terminal::Failed(error) => {
                self.state = TurnState::Failed { run_id };
                tracing::error!(run_id, model, %error, "turn failed");
                let recorded = match self.failure_recording {
                    FailureRecording::OutOfBand => None,
                    FailureRecording::AssistantTurn => Some(
                        self.store
                            .log_mut()
                            .append(Role::Assistant, format!("{FAILURE_PREFIX}: {error}"))?,
                    ),
                };
                Ok(TurnOutcome::Failed { error, recorded })
            }
        }
    }
}

//! Minimal provider-agnostic contract for one streamed chat exchange.
//!
//! This crate defines the run lifecycle shared by the session controller and
//! every backend adapter. It excludes transport details, wire payloads, and
//! persistence concerns.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Monotonic per-session turn number; events carry it so a controller can
/// drop anything that belongs to an earlier turn.
pub type RunId = u64;

/// Raised by the user (Ctrl-C) to stop the reply in flight.
pub type CancelSignal = Arc<AtomicBool>;

/// A backend could not be set up, so no turn can be attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Author of a dialogue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Capitalized label used when listing messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model-facing message: what the backend sees, without storage metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input required to start a streamed chat run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub run_id: RunId,
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

/// What a backend reports while serving one turn.
///
/// A run is `Started`, then zero or more `Chunk`s, then exactly one of
/// `Finished`, `Failed`, or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started {
        run_id: RunId,
    },
    /// One fragment of assistant text, in backend order.
    Chunk {
        run_id: RunId,
        text: String,
    },
    Finished {
        run_id: RunId,
    },
    Failed {
        run_id: RunId,
        error: String,
    },
    /// The cancel signal was observed before the stream completed.
    Cancelled {
        run_id: RunId,
    },
}

impl RunEvent {
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match *self {
            Self::Started { run_id }
            | Self::Finished { run_id }
            | Self::Cancelled { run_id }
            | Self::Chunk { run_id, .. }
            | Self::Failed { run_id, .. } => run_id,
        }
    }

    /// Whether this event closes the run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. } | Self::Chunk { .. })
    }
}

/// Identity of a configured backend, shown at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    /// Human-readable backend location, when the provider has one.
    pub endpoint: Option<String>,
}

/// Provider interface for model listing and streamed chat runs.
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Lists model identifiers the backend can serve.
    ///
    /// Implementations recover from listing failures internally; an empty list
    /// means no models are available.
    fn list_models(&self) -> Vec<String>;

    /// Executes one chat request and emits lifecycle events in provider order.
    ///
    /// Providers must emit exactly one terminal event per run. `Chunk` events
    /// carry content fragments in the order the backend produced them.
    fn stream_chat(
        &self,
        req: ChatRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String>;
}

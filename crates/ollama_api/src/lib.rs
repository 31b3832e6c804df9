//! Transport-only client for a local Ollama backend.
//!
//! This crate owns request building and response parsing for the chat and
//! model-listing endpoints only. It knows nothing about conversation storage
//! or prompt assembly.
//!
//! Chat responses arrive as newline-delimited JSON objects. Each object may
//! carry `message.content`; objects without it are skipped rather than
//! aborting the stream, and an `error` object ends the stream with
//! [`OllamaApiError::StreamFailed`].

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod ndjson;
pub mod payload;
pub mod url;

pub use client::{CancellationSignal, OllamaApiClient, StreamSummary};
pub use config::OllamaApiConfig;
pub use error::OllamaApiError;
pub use events::OllamaStreamEvent;
pub use models::{list_models_via_cli, parse_model_table, parse_tags_response};
pub use ndjson::NdjsonStreamParser;
pub use payload::{ChatPayload, WireMessage};
pub use url::{chat_url, normalize_base_url, tags_url, DEFAULT_OLLAMA_BASE_URL};

//! Persistent terminal chat client.
//!
//! ## Data directory
//!
//! All state lives under one directory (`--data-dir`, default `data`):
//!
//! - `chat_history.json`: bounded array of `{role, content, timestamp}`
//! - `system_prompt.txt`: the instruction prefix, verbatim
//! - `config.json`: `{last_model, max_history_length, created_at}`
//!
//! Missing files are created with defaults on startup. Malformed files are
//! read as defaults and left untouched until the next save.
//!
//! ## Provider bootstrap
//!
//! `--provider ollama` (default) talks to `--host` (`OLLAMA_HOST`);
//! `--provider mock` echoes input back and needs no server.
//!
//! ## Turn contract
//!
//! Each turn appends the user message before contacting the backend. A
//! completed stream appends one assistant message holding the concatenated
//! fragments. An interrupted stream commits nothing further. A failed stream
//! is reported to the caller and, unless `--record-failures` is set, never
//! written into the conversation.

pub mod app;
pub mod cli;
pub mod commands;
pub mod input;
pub mod prompt;
pub mod providers;
pub mod readline;
pub mod selection;
pub mod session;
pub mod summary;

use std::path::PathBuf;

use chat_provider_ollama::DEFAULT_OLLAMA_BASE_URL;
use chat_store::DEFAULT_DATA_DIR;
use clap::Parser;

use crate::providers::{DEFAULT_PROVIDER_ID, PROVIDER_ENV_VAR};
use crate::session::FailureRecording;

#[derive(Debug, Parser)]
#[command(name = "persistent-chat")]
#[command(about = "Chat with a local Ollama model; the conversation is kept on disk between runs", long_about = None)]
pub struct Args {
    /// Directory holding chat_history.json, system_prompt.txt, and config.json
    #[arg(long, env = "PERSISTENT_CHAT_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Ollama server URL or host:port
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_BASE_URL)]
    pub host: String,

    /// Chat backend: "ollama" or "mock"
    #[arg(long, env = PROVIDER_ENV_VAR, default_value = DEFAULT_PROVIDER_ID)]
    pub provider: String,

    /// Use this model instead of asking
    #[arg(long, env = "PERSISTENT_CHAT_MODEL")]
    pub model: Option<String>,

    /// Also write backend errors into the conversation as assistant messages
    #[arg(long, env = "PERSISTENT_CHAT_RECORD_FAILURES")]
    pub record_failures: bool,
}

impl Args {
    pub fn failure_recording(&self) -> FailureRecording {
        if self.record_failures {
            FailureRecording::AssistantTurn
        } else {
            FailureRecording::OutOfBand
        }
    }
}

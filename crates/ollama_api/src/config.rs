use std::time::Duration;

use crate::url::DEFAULT_OLLAMA_BASE_URL;

/// Model listing gives up after this long and callers fall back.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);
/// Executable used for the command-line model listing fallback.
pub const DEFAULT_CLI_PROGRAM: &str = "ollama";

/// Transport configuration for Ollama requests.
#[derive(Debug, Clone)]
pub struct OllamaApiConfig {
    /// Base URL or `host:port` of the server.
    pub base_url: String,
    /// Optional whole-request timeout for chat streaming. Unset by default:
    /// generation time is unbounded.
    pub timeout: Option<Duration>,
    /// Timeout for model listing, over HTTP and through the CLI.
    pub list_timeout: Duration,
    /// Program invoked as `<cli_program> list` when the HTTP listing fails.
    pub cli_program: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
}

impl Default for OllamaApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            timeout: None,
            list_timeout: DEFAULT_LIST_TIMEOUT,
            cli_program: DEFAULT_CLI_PROGRAM.to_string(),
            user_agent: None,
        }
    }
}

impl OllamaApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    pub fn with_cli_program(mut self, program: impl Into<String>) -> Self {
        self.cli_program = program.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

//! Ollama-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter translates `ollama_api` stream semantics into the `RunEvent`
//! lifecycle expected by the session controller. Fragments are forwarded as
//! they arrive; nothing is buffered until the stream ends.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    CancelSignal, ChatProvider, ChatRequest, ProviderInitError, ProviderProfile, RunEvent,
};
use ollama_api::{
    list_models_via_cli, ChatPayload, OllamaApiClient, OllamaApiConfig, OllamaApiError,
    OllamaStreamEvent, StreamSummary, WireMessage,
};

/// Stable provider identifier used by startup selection.
pub const OLLAMA_PROVIDER_ID: &str = "ollama";

pub use ollama_api::DEFAULT_OLLAMA_BASE_URL;

/// Runtime configuration for the Ollama provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OllamaProviderConfig {
    /// Server base URL or `host:port`; the local default when unset.
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub list_timeout: Option<Duration>,
    /// Program used for the `list` fallback; `ollama` when unset.
    pub cli_program: Option<String>,
}

impl OllamaProviderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cli_program(mut self, program: impl Into<String>) -> Self {
        self.cli_program = Some(program.into());
        self
    }

    fn into_api_config(self) -> OllamaApiConfig {
        let mut config = OllamaApiConfig::default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        if let Some(timeout) = self.list_timeout {
            config = config.with_list_timeout(timeout);
        }

        if let Some(program) = self.cli_program {
            config = config.with_cli_program(program);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(
        &self,
        payload: &ChatPayload,
        cancel: &CancelSignal,
        on_fragment: &mut dyn FnMut(String),
    ) -> Result<StreamSummary, OllamaApiError>;

    fn list_models(&self) -> Result<Vec<String>, OllamaApiError>;

    fn list_models_fallback(&self) -> Result<Vec<String>, OllamaApiError>;

    fn endpoint(&self) -> String;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: OllamaApiClient,
}

impl DefaultStreamClient {
    fn runtime() -> Result<tokio::runtime::Runtime, OllamaApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OllamaApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })
    }
}

impl StreamClient for DefaultStreamClient {
    fn stream(
        &self,
        payload: &ChatPayload,
        cancel: &CancelSignal,
        on_fragment: &mut dyn FnMut(String),
    ) -> Result<StreamSummary, OllamaApiError> {
        Self::runtime()?.block_on(self.client.stream_chat_with_handler(
            payload,
            Some(cancel),
            |event| {
                if let OllamaStreamEvent::Content { text } = event {
                    on_fragment(text);
                }
            },
        ))
    }

    fn list_models(&self) -> Result<Vec<String>, OllamaApiError> {
        Self::runtime()?.block_on(self.client.list_models())
    }

    fn list_models_fallback(&self) -> Result<Vec<String>, OllamaApiError> {
        let config = self.client.config();
        list_models_via_cli(&config.cli_program, config.list_timeout)
    }

    fn endpoint(&self) -> String {
        self.client.base_url()
    }
}

/// `ChatProvider` adapter backed by `ollama_api` transport primitives.
pub struct OllamaProvider {
    stream_client: Arc<dyn StreamClient>,
}

impl OllamaProvider {
    /// Creates a provider using real HTTP transport.
    pub fn new(config: OllamaProviderConfig) -> Result<Self, ProviderInitError> {
        let stream_client = Arc::new(DefaultStreamClient {
            client: OllamaApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self { stream_client })
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(stream_client: Arc<dyn StreamClient>) -> Self {
        Self { stream_client }
    }
}

impl ChatProvider for OllamaProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OLLAMA_PROVIDER_ID.to_string(),
            endpoint: Some(self.stream_client.endpoint()),
        }
    }

    /// Asks the HTTP API first and the command-line tool second. Both failing
    /// yields an empty list.
    fn list_models(&self) -> Vec<String> {
        match self.stream_client.list_models() {
            Ok(models) => return models,
            Err(error) => {
                tracing::warn!(%error, "model listing over HTTP failed; trying command line");
            }
        }

        match self.stream_client.list_models_fallback() {
            Ok(models) => models,
            Err(error) => {
                tracing::warn!(%error, "model listing through command line failed");
                Vec::new()
            }
        }
    }

    fn stream_chat(
        &self,
        req: ChatRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;

        emit(RunEvent::Started { run_id });

        if cancel.load(Ordering::Acquire) {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        let payload = ChatPayload::new(
            req.model,
            req.messages
                .into_iter()
                .map(|message| WireMessage::new(message.role.as_str(), message.content))
                .collect(),
        );

        let outcome = self.stream_client.stream(&payload, &cancel, &mut |text| {
            emit(RunEvent::Chunk { run_id, text });
        });

        match outcome {
            Ok(summary) => {
                tracing::debug!(
                    run_id,
                    chunks = summary.chunks,
                    skipped = summary.skipped,
                    done_reason = summary.done_reason.as_deref().unwrap_or(""),
                    "chat stream finished"
                );
                emit(RunEvent::Finished { run_id });
            }
            Err(OllamaApiError::Cancelled) => emit(RunEvent::Cancelled { run_id }),
            Err(error) => emit(RunEvent::Failed {
                run_id,
                error: error.to_string(),
            }),
        }

        Ok(())
    }
}

fn map_init_error(error: OllamaApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize ollama provider: {error}"))
}

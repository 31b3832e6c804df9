use std::sync::Arc;

use chat_provider::ChatProvider;
use chat_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use chat_provider_ollama::{OllamaProvider, OllamaProviderConfig, OLLAMA_PROVIDER_ID};

pub const DEFAULT_PROVIDER_ID: &str = OLLAMA_PROVIDER_ID;
pub const PROVIDER_ENV_VAR: &str = "PERSISTENT_CHAT_PROVIDER";

/// Resolves a provider by id. `host` only applies to the Ollama provider.
pub fn provider_for_id(provider_id: &str, host: &str) -> Result<Arc<dyn ChatProvider>, String> {
    match provider_id.trim() {
        OLLAMA_PROVIDER_ID => {
            let config = OllamaProviderConfig::new().with_base_url(host);
            let provider = OllamaProvider::new(config).map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {OLLAMA_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_for_id_supports_mock() {
        let provider = provider_for_id("mock", "").expect("mock provider should resolve");
        assert_eq!(provider.profile().provider_id, "mock");
    }

    #[test]
    fn provider_for_id_normalizes_ollama_host() {
        let provider =
            provider_for_id("ollama", "gpu-box:11434/").expect("ollama provider should resolve");
        let profile = provider.profile();

        assert_eq!(profile.provider_id, "ollama");
        assert_eq!(profile.endpoint.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn provider_for_id_rejects_unknown_provider() {
        let error = match provider_for_id("custom", "") {
            Ok(_) => panic!("unknown providers should fail"),
            Err(error) => error,
        };

        assert!(error.contains("Unsupported provider 'custom'"));
    }
}

/// Default base URL for a local Ollama server.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Normalize a configured host into a base URL without a trailing slash.
///
/// Normalization rules:
/// 1) blank input uses [`DEFAULT_OLLAMA_BASE_URL`]
/// 2) `host:port` without a scheme gets `http://`
/// 3) a trailing `/api` segment is removed
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_OLLAMA_BASE_URL
    } else {
        input.trim()
    };

    let with_scheme = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{base}")
    };

    let trimmed = with_scheme.trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .to_string()
}

pub fn chat_url(base_url: &str) -> String {
    format!("{}/api/chat", normalize_base_url(base_url))
}

pub fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", normalize_base_url(base_url))
}

use ollama_api::{chat_url, normalize_base_url, tags_url, DEFAULT_OLLAMA_BASE_URL};

#[test]
fn blank_host_uses_local_default() {
    assert_eq!(normalize_base_url(""), DEFAULT_OLLAMA_BASE_URL);
    assert_eq!(normalize_base_url("   "), DEFAULT_OLLAMA_BASE_URL);
}

#[test]
fn host_and_port_gain_http_scheme() {
    assert_eq!(normalize_base_url("gpu-box:11434"), "http://gpu-box:11434");
    assert_eq!(
        normalize_base_url("https://ollama.internal/"),
        "https://ollama.internal"
    );
}

#[test]
fn trailing_api_segment_is_removed() {
    assert_eq!(
        normalize_base_url("http://localhost:11434/api/"),
        "http://localhost:11434"
    );
    assert_eq!(
        chat_url("http://localhost:11434/api"),
        "http://localhost:11434/api/chat"
    );
    assert_eq!(tags_url("127.0.0.1:9000"), "http://127.0.0.1:9000/api/tags");
}

//! Locally installed model discovery.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde_json::Value;
use wait_timeout::ChildExt;

use crate::error::OllamaApiError;

/// Extracts model names from `ollama list` output: the header line is
/// skipped and the first whitespace-separated column of each remaining
/// non-blank line is kept.
pub fn parse_model_table(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Extracts model names from an `/api/tags` response body.
///
/// Accepts `{"models": [...]}` or a bare array, where each entry is either a
/// string or an object carrying `name` (or `model`).
pub fn parse_tags_response(body: &Value) -> Result<Vec<String>, OllamaApiError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("models") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(OllamaApiError::ModelListing(
                    "tags response has no 'models' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(OllamaApiError::ModelListing(
                "tags response is not an object or array".to_string(),
            ))
        }
    };

    Ok(entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.as_str()),
            Value::Object(fields) => fields
                .get("name")
                .or_else(|| fields.get("model"))
                .and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

/// Runs `<program> list` and parses its table, killing it after `timeout`.
pub fn list_models_via_cli(program: &str, timeout: Duration) -> Result<Vec<String>, OllamaApiError> {
    let mut child = Command::new(program)
        .arg("list")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| OllamaApiError::ModelListing(format!("failed to launch {program}: {error}")))?;

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OllamaApiError::ModelListing(format!(
                "{program} list timed out after {}s",
                timeout.as_secs()
            )));
        }
        Err(error) => {
            let _ = child.kill();
            return Err(OllamaApiError::ModelListing(format!(
                "failed waiting for {program} list: {error}"
            )));
        }
    };

    let stdout = read_pipe(child.stdout.take());
    if !status.success() {
        let stderr = read_pipe(child.stderr.take());
        return Err(OllamaApiError::ModelListing(format!(
            "{program} list exited with {status}: {}",
            stderr.trim()
        )));
    }

    Ok(parse_model_table(&stdout))
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut bytes);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_model_table, parse_tags_response};

    #[test]
    fn table_parsing_skips_header_and_blank_lines() {
        let output = "NAME            ID              SIZE      MODIFIED\n\
                      llama3:8b       365c0bd3c000    4.7 GB    2 days ago\n\
                      \n\
                      mistral:latest  f974a74358d6    4.1 GB    3 weeks ago\n";

        assert_eq!(parse_model_table(output), vec!["llama3:8b", "mistral:latest"]);
    }

    #[test]
    fn header_only_table_is_empty() {
        assert!(parse_model_table("NAME ID SIZE MODIFIED\n").is_empty());
        assert!(parse_model_table("").is_empty());
    }

    #[test]
    fn tags_accept_objects_strings_and_bare_arrays() {
        let wrapped = json!({"models": [{"name": "llama3:8b"}, {"model": "qwen2:7b"}, "phi3"]});
        assert_eq!(
            parse_tags_response(&wrapped).expect("tags should parse"),
            vec!["llama3:8b", "qwen2:7b", "phi3"]
        );

        let bare = json!([{"name": "gemma:2b"}, 7, {"size": 1}]);
        assert_eq!(
            parse_tags_response(&bare).expect("tags should parse"),
            vec!["gemma:2b"]
        );
    }

    #[test]
    fn tags_without_models_array_are_rejected() {
        assert!(parse_tags_response(&json!({"status": "ok"})).is_err());
        assert!(parse_tags_response(&json!("llama3")).is_err());
    }
}

use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Client, Response};

use crate::config::OllamaApiConfig;
use crate::error::{parse_error_message, OllamaApiError};
use crate::events::OllamaStreamEvent;
use crate::models::parse_tags_response;
use crate::ndjson::NdjsonStreamParser;
use crate::payload::ChatPayload;
use crate::url::{chat_url, normalize_base_url, tags_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct OllamaApiClient {
    http: Client,
    config: OllamaApiConfig,
}

/// What a completed stream reported, independent of the text itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// The server sent an object with `done: true`.
    pub done: bool,
    pub done_reason: Option<String>,
    /// Number of non-empty content fragments delivered.
    pub chunks: usize,
    /// Number of objects skipped for lacking content.
    pub skipped: usize,
}

impl OllamaApiClient {
    pub fn new(config: OllamaApiConfig) -> Result<Self, OllamaApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OllamaApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OllamaApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        normalize_base_url(&self.config.base_url)
    }

    pub fn build_chat_request(
        &self,
        payload: &ChatPayload,
    ) -> Result<reqwest::RequestBuilder, OllamaApiError> {
        if payload.model.trim().is_empty() {
            return Err(OllamaApiError::InvalidRequest(
                "model name must not be empty".to_string(),
            ));
        }

        let mut body = payload.clone();
        body.stream = true;

        let request = self.http.post(chat_url(&self.config.base_url)).json(&body);
        self.with_user_agent(request)
    }

    fn with_user_agent(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, OllamaApiError> {
        match self.config.user_agent.as_deref() {
            Some(agent) => {
                let value = HeaderValue::from_str(agent).map_err(|_| {
                    OllamaApiError::InvalidRequest(format!("invalid user agent: {agent}"))
                })?;
                Ok(request.header(USER_AGENT, value))
            }
            None => Ok(request),
        }
    }

    async fn send_chat(
        &self,
        payload: &ChatPayload,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, OllamaApiError> {
        if is_cancelled(cancellation) {
            return Err(OllamaApiError::Cancelled);
        }

        let response = await_or_cancel(self.build_chat_request(payload)?.send(), cancellation)
            .await?
            .map_err(OllamaApiError::from)?;
        ensure_success(response, cancellation).await
    }

    /// Streams a chat response, handing each content or completion event to
    /// `on_event` as it is parsed.
    ///
    /// Objects lacking content are logged and skipped. An in-band error
    /// object ends the stream with [`OllamaApiError::StreamFailed`].
    pub async fn stream_chat_with_handler<F>(
        &self,
        payload: &ChatPayload,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<StreamSummary, OllamaApiError>
    where
        F: FnMut(OllamaStreamEvent),
    {
        let response = self.send_chat(payload, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = NdjsonStreamParser::default();
        let mut summary = StreamSummary::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(OllamaApiError::Cancelled);
            }
            let chunk = chunk.map_err(OllamaApiError::from)?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut summary, &mut on_event)?;
            }
        }

        for event in parser.finish() {
            process_stream_event(event, &mut summary, &mut on_event)?;
        }

        if is_cancelled(cancellation) {
            return Err(OllamaApiError::Cancelled);
        }

        if !summary.done {
            tracing::debug!(chunks = summary.chunks, "chat stream ended without done marker");
        }

        Ok(summary)
    }

    /// Collects the whole response text.
    pub async fn stream_chat(
        &self,
        payload: &ChatPayload,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<(String, StreamSummary), OllamaApiError> {
        let mut text = String::new();
        let summary = self
            .stream_chat_with_handler(payload, cancellation, |event| {
                if let OllamaStreamEvent::Content { text: fragment } = event {
                    text.push_str(&fragment);
                }
            })
            .await?;

        Ok((text, summary))
    }

    /// Lists installed models through `GET /api/tags`, bounded by the
    /// configured list timeout.
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaApiError> {
        let request = self
            .http
            .get(tags_url(&self.config.base_url))
            .timeout(self.config.list_timeout);
        let response = self.with_user_agent(request)?.send().await?;
        let response = ensure_success(response, None).await?;
        let body: serde_json::Value = response.json().await?;
        parse_tags_response(&body)
    }
}

async fn ensure_success(
    response: Response,
    cancellation: Option<&CancellationSignal>,
) -> Result<Response, OllamaApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = await_or_cancel(response.text(), cancellation)
        .await?
        .unwrap_or_default();
    Err(OllamaApiError::Status(
        status,
        parse_error_message(status, &body),
    ))
}

fn process_stream_event<F>(
    event: OllamaStreamEvent,
    summary: &mut StreamSummary,
    on_event: &mut F,
) -> Result<(), OllamaApiError>
where
    F: FnMut(OllamaStreamEvent),
{
    match &event {
        OllamaStreamEvent::Error { message } => {
            return Err(OllamaApiError::StreamFailed(message.clone()));
        }
        OllamaStreamEvent::Skipped { line } => {
            summary.skipped += 1;
            tracing::warn!(%line, "skipping chat chunk without content");
            return Ok(());
        }
        OllamaStreamEvent::Content { .. } => summary.chunks += 1,
        OllamaStreamEvent::Done { reason } => {
            summary.done = true;
            summary.done_reason = reason.clone();
        }
    }

    on_event(event);
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, OllamaApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(OllamaApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(OllamaApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

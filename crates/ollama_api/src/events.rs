use serde::Deserialize;

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OllamaStreamEvent {
    /// A non-empty `message.content` fragment.
    Content { text: String },
    /// The server marked the response complete.
    Done { reason: Option<String> },
    /// The server reported an error in-band.
    Error { message: String },
    /// A line that is not JSON or has neither content, `done`, nor `error`.
    Skipped { line: String },
}

/// Wire shape of one streamed chat object. Every field is optional so that
/// shape checks happen in [`ChatChunk::into_events`], not in serde.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatChunk {
    pub(crate) fn into_events(self, line: &str) -> Vec<OllamaStreamEvent> {
        if let Some(message) = self.error {
            return vec![OllamaStreamEvent::Error { message }];
        }

        let content = self.message.and_then(|message| message.content);
        if content.is_none() && !self.done {
            return vec![OllamaStreamEvent::Skipped {
                line: line.to_string(),
            }];
        }

        let mut events = Vec::new();
        if let Some(text) = content.filter(|text| !text.is_empty()) {
            events.push(OllamaStreamEvent::Content { text });
        }
        if self.done {
            events.push(OllamaStreamEvent::Done {
                reason: self.done_reason,
            });
        }
        events
    }
}

use crate::events::{ChatChunk, OllamaStreamEvent};

/// Incremental parser for newline-delimited JSON chat streams.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    buffer: Vec<u8>,
}

impl NdjsonStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<OllamaStreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            events.extend(parse_line(&line));
        }

        events
    }

    /// Drain a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<OllamaStreamEvent> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line)
    }

    /// Parse a complete payload string in one shot.
    pub fn parse_lines(input: &str) -> Vec<OllamaStreamEvent> {
        let mut parser = Self::default();
        let mut events = parser.feed(input.as_bytes());
        events.extend(parser.finish());
        events
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn parse_line(raw: &[u8]) -> Vec<OllamaStreamEvent> {
    let decoded = String::from_utf8_lossy(raw);
    let line = decoded.trim();
    if line.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<ChatChunk>(line) {
        Ok(chunk) => chunk.into_events(line),
        Err(_) => vec![OllamaStreamEvent::Skipped {
            line: line.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::NdjsonStreamParser;
    use crate::events::OllamaStreamEvent;

    fn content(text: &str) -> OllamaStreamEvent {
        OllamaStreamEvent::Content {
            text: text.to_string(),
        }
    }

    #[test]
    fn parse_lines_incrementally_across_feeds() {
        let mut parser = NdjsonStreamParser::default();
        let mut events = Vec::new();

        events.extend(parser.feed(b"{\"message\":{\"role\":\"assistant\",\"content\":\"He\"},\"done\":false}\n{\"message\":{\"con"));
        assert_eq!(events, vec![content("He")]);
        assert!(!parser.is_empty_buffer());

        events.extend(parser.feed(b"tent\":\"llo\"},\"done\":false}\n"));
        assert_eq!(events, vec![content("He"), content("llo")]);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn multibyte_characters_survive_split_feeds() {
        let line = "{\"message\":{\"content\":\"caf\u{e9}\"}}\n".as_bytes();
        let split = line
            .iter()
            .position(|byte| *byte == 0xC3)
            .expect("encoded e-acute lead byte")
            + 1;

        let mut parser = NdjsonStreamParser::default();
        assert!(parser.feed(&line[..split]).is_empty());
        assert_eq!(parser.feed(&line[split..]), vec![content("caf\u{e9}")]);
    }

    #[test]
    fn final_object_yields_content_then_done() {
        let events = NdjsonStreamParser::parse_lines(
            "{\"message\":{\"content\":\"!\"},\"done\":true,\"done_reason\":\"stop\"}",
        );
        assert_eq!(
            events,
            vec![
                content("!"),
                OllamaStreamEvent::Done {
                    reason: Some("stop".to_string()),
                },
            ]
        );
    }

    #[test]
    fn objects_missing_content_are_skipped_not_fatal() {
        let events = NdjsonStreamParser::parse_lines(concat!(
            "{\"message\":{\"content\":\"a\"}}\n",
            "{\"message\":{\"role\":\"assistant\"}}\n",
            "not json\n",
            "\n",
            "{\"message\":{\"content\":\"b\"}}\n",
        ));

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], content("a"));
        assert!(matches!(events[1], OllamaStreamEvent::Skipped { .. }));
        assert_eq!(
            events[2],
            OllamaStreamEvent::Skipped {
                line: "not json".to_string(),
            }
        );
        assert_eq!(events[3], content("b"));
    }

    #[test]
    fn error_objects_map_to_error_events() {
        let events = NdjsonStreamParser::parse_lines("{\"error\":\"model crashed\"}\n");
        assert_eq!(
            events,
            vec![OllamaStreamEvent::Error {
                message: "model crashed".to_string(),
            }]
        );
    }

    #[test]
    fn empty_content_fragments_are_not_emitted() {
        let events = NdjsonStreamParser::parse_lines("{\"message\":{\"content\":\"\"}}\n");
        assert!(events.is_empty());
    }
}

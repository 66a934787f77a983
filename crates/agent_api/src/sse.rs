use serde_json::Value;

use crate::events::AgentStreamEvent;

/// Incremental parser for SSE text streams.
///
/// Bytes are buffered until a blank line completes a frame, so multi-byte UTF-8
/// sequences split across network chunks decode intact.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: Vec<u8>,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<AgentStreamEvent> {
        self.buffer
            .extend(bytes.iter().copied().filter(|byte| *byte != b'\r'));
        let mut events = Vec::new();

        while let Some(split) = find_frame_end(&self.buffer) {
            let frame = String::from_utf8_lossy(&self.buffer[..split]).into_owned();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };
            if payload == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<Value>(&payload) {
                Ok(value) => {
                    if let Some(event) = map_event(&value) {
                        events.push(event);
                    } else {
                        tracing::trace!(payload = %payload, "ignoring unclassified SSE event");
                    }
                }
                Err(error) => {
                    tracing::trace!(%error, payload = %payload, "ignoring malformed SSE payload");
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<AgentStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|window| window == b"\n\n")
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn map_event(value: &Value) -> Option<AgentStreamEvent> {
    let event_type = value.get("type")?.as_str()?;

    match event_type {
        "log" => {
            let content = match value.get("content")? {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some(AgentStreamEvent::Log { content })
        }
        "done" => {
            let content = value
                .get("content")
                .and_then(|value| value.as_str())
                .map(ToString::to_string);
            Some(AgentStreamEvent::Done { content })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::SseStreamParser;
    use crate::events::AgentStreamEvent;

    #[test]
    fn parse_sse_frames_incrementally() {
        let mut parser = SseStreamParser::default();
        let mut events = Vec::new();

        events.extend(parser.feed(b"data: {\"type\":\"log\",\"content\":\"Starting tool: search\"}\n\n"));
        assert_eq!(events.len(), 1);

        events.extend(parser.feed(b"data: [DONE]\n\n"));
        assert_eq!(events.len(), 1);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn multibyte_content_split_across_chunks_decodes_intact() {
        let frame = "data: {\"type\":\"log\",\"content\":\"\u{1F50D} searching\"}\n\n".as_bytes();
        let split = frame
            .iter()
            .position(|byte| *byte == 0xF0)
            .expect("emoji lead byte present")
            + 2;

        let mut parser = SseStreamParser::default();
        assert!(parser.feed(&frame[..split]).is_empty());
        let events = parser.feed(&frame[split..]);

        assert_eq!(
            events,
            vec![AgentStreamEvent::Log {
                content: "\u{1F50D} searching".to_string(),
            }]
        );
    }

    #[test]
    fn non_string_log_content_is_stringified_and_null_is_skipped() {
        let payload = concat!(
            "data: {\"type\":\"log\",\"content\":42}\n\n",
            "data: {\"type\":\"log\",\"content\":null}\n\n",
            "data: {\"type\":\"log\"}\n\n",
        );

        let events = SseStreamParser::parse_frames(payload);
        assert_eq!(
            events,
            vec![AgentStreamEvent::Log {
                content: "42".to_string(),
            }]
        );
    }
}

use serde::Deserialize;

/// Literal payload value that terminates an event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data:";

/// One framed outcome from the line parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Non-empty incremental content from the first choice.
    Delta(String),
    /// End-of-stream sentinel.
    Done,
}

/// Incremental parser for line-delimited `data:` event payloads.
///
/// Tolerant-parsing policy: a `data:` line whose payload fails to decode is
/// skipped rather than failing the whole stream, and the skip count is kept
/// so callers can surface it. Lines without the data prefix are protocol
/// noise (comments, blank keep-alives) and are ignored without counting.
///
/// Bytes are buffered raw and decoded per complete line, so a multi-byte
/// UTF-8 character split across network chunks survives intact.
#[derive(Debug, Default)]
pub struct EventLineParser {
    buffer: Vec<u8>,
    skipped_lines: u64,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: String,
}

impl EventLineParser {
    /// Feed arbitrary bytes into the parser and drain complete lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some(split) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(0..=split).collect();
            let line = String::from_utf8_lossy(&line[..split]);

            if let Some(frame) = self.parse_line(&line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Flush the trailing unterminated line, if any.
    ///
    /// Gateways may close the body without a final newline; the remainder is
    /// treated as one complete line.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        if rest.trim().is_empty() {
            return Vec::new();
        }

        self.parse_line(&rest).into_iter().collect()
    }

    fn parse_line(&mut self, line: &str) -> Option<StreamFrame> {
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            return Some(StreamFrame::Done);
        }

        match serde_json::from_str::<ChunkPayload>(payload) {
            Ok(chunk) => {
                let content = chunk.choices.into_iter().next()?.delta.content;
                if content.is_empty() {
                    None
                } else {
                    Some(StreamFrame::Delta(content))
                }
            }
            Err(_) => {
                self.skipped_lines += 1;
                None
            }
        }
    }

    /// Count of malformed `data:` payloads skipped so far.
    #[must_use]
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    #[must_use]
    pub fn is_buffer_empty(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventLineParser, StreamFrame};

    #[test]
    fn parses_data_lines_incrementally() {
        let mut parser = EventLineParser::default();
        let mut frames = Vec::new();

        frames.extend(parser.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n"));
        assert_eq!(frames, vec![StreamFrame::Delta("Hel".to_string())]);

        frames.extend(parser.feed(b"data: [DONE]\n"));
        assert_eq!(frames.last(), Some(&StreamFrame::Done));
        assert!(parser.is_buffer_empty());
    }

    #[test]
    fn malformed_payloads_are_skipped_and_counted() {
        let mut parser = EventLineParser::default();
        let frames = parser.feed(b"data: {not json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n");

        assert_eq!(frames, vec![StreamFrame::Delta("ok".to_string())]);
        assert_eq!(parser.skipped_lines(), 1);
    }
}

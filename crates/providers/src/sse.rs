//! Incremental parser for `text/event-stream` responses.
//!
//! The Gemini streaming endpoint (`alt=sse`) only ever populates `data:`
//! lines, so the parser yields one data payload per completed event.
//! Events are separated by a blank line; `\r\n` line endings are accepted.

pub struct SseParser {
    /// Bytes not yet decoded; at most an incomplete trailing UTF-8
    /// sequence survives a `feed` call.
    pending: Vec<u8>,
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Feed raw bytes from the HTTP response. Returns the data payload of
    /// every event completed by this chunk; incomplete tails stay buffered.
    ///
    /// Network chunks can split a multi-byte character; the undecodable
    /// tail is held back until the next chunk completes it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let decoded = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                text
            }
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                text
            }
            // Genuinely invalid bytes: replace and move on.
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                text
            }
        };
        self.buffer.push_str(&decoded);
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut payloads = Vec::new();

        while let Some(boundary) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..boundary + 2).collect();

            let mut data_lines: Vec<&str> = Vec::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("data:") {
                    data_lines.push(value.strip_prefix(' ').unwrap_or(value));
                }
                // `event:`, `id:`, `retry:` and comment lines are ignored.
            }

            if !data_lines.is_empty() {
                payloads.push(data_lines.join("\n"));
            }
        }

        payloads
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_events() {
        let mut parser = SseParser::new();
        let payloads = parser.feed(b"data: hello\n\ndata: world\n\n");
        assert_eq!(payloads, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: {\"par").is_empty());
        let payloads = parser.feed(b"tial\":true}\n\n");
        assert_eq!(payloads, vec!["{\"partial\":true}".to_string()]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut parser = SseParser::new();
        let payloads = parser.feed(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut parser = SseParser::new();
        let payloads = parser.feed(b"data: first\ndata: second\n\n");
        assert_eq!(payloads, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let mut parser = SseParser::new();
        // "п" is 0xD0 0xBF; split between the two bytes.
        assert!(parser.feed(b"data: {\"text\": \"\xD0").is_empty());
        let payloads = parser.feed(b"\xBF\"}\n\n");
        assert_eq!(payloads, vec!["{\"text\": \"\u{043f}\"}".to_string()]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: x\r").is_empty());
        let payloads = parser.feed(b"\n\r\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut parser = SseParser::new();
        let payloads = parser.feed(b": keep-alive\nevent: ping\n\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }
}

//! SSE (Server-Sent Events) frame splitting and parsing
//!
//! The chat-completions stream arrives as arbitrary byte chunks that do not
//! respect line boundaries. [`LineSplitter`] reassembles complete event lines
//! across chunks; [`parse_frame`] turns one candidate line into a typed
//! [`Frame`]. A line that fails to parse never aborts the session.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::types::Frame;

/// Event-data prefix every meaningful SSE line carries.
const DATA_PREFIX: &str = "data:";

/// End-of-transmission token sent after the last delta.
const DONE_TOKEN: &str = "[DONE]";

/// Reassembles candidate event lines from raw decoded chunks.
///
/// A chunk may end mid-line; the incomplete tail is buffered and prepended to
/// the next chunk. Blank lines, SSE comments (leading `:`), and lines without
/// the `data:` prefix are protocol noise and are dropped silently.
#[derive(Debug, Default)]
pub struct LineSplitter {
    /// Accumulated partial line from previous chunks
    partial_line: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded chunk; returns the complete candidate lines it closed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let combined = format!("{}{}", self.partial_line, chunk);
        let lines: Vec<&str> = combined.lines().collect();

        // Keep an unterminated trailing line for the next chunk
        let complete = if !combined.ends_with('\n') && !lines.is_empty() {
            self.partial_line = lines.last().unwrap_or(&"").to_string();
            lines.len() - 1
        } else {
            self.partial_line.clear();
            lines.len()
        };

        lines
            .iter()
            .take(complete)
            .filter(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with(':') && line.starts_with(DATA_PREFIX)
            })
            .map(|line| line.trim().to_string())
            .collect()
    }

    /// A trailing line never closed by a newline, if any. The stream ended
    /// mid-frame; the remnant is unparseable by construction and only useful
    /// for diagnostics.
    pub fn remainder(&self) -> Option<&str> {
        if self.partial_line.trim().is_empty() {
            None
        } else {
            Some(self.partial_line.trim())
        }
    }
}

/// Decodes raw network chunks into text, holding back an incomplete trailing
/// UTF-8 sequence until its continuation bytes arrive in the next chunk.
/// Chunk boundaries do not respect character boundaries any more than they
/// respect line boundaries; decoding each chunk in isolation would turn a
/// split multi-byte character into replacement characters.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    carry: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, prepending any bytes held back from the last call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let mut data = std::mem::take(&mut self.carry);
        let split = match std::str::from_utf8(&data) {
            Ok(_) => data.len(),
            // error_len() is None only for a truncated sequence at the end;
            // hold those bytes back for the next chunk
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            // genuinely invalid bytes: decode lossily, nothing to hold back
            Err(_) => data.len(),
        };
        self.carry = data.split_off(split);
        String::from_utf8_lossy(&data).into_owned()
    }
}

/// Parse one candidate line (still carrying its `data:` prefix) into a frame.
pub fn parse_frame(line: &str) -> Frame {
    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line).trim();

    if payload == DONE_TOKEN {
        debug!("received {} marker", DONE_TOKEN);
        return Frame::Sentinel;
    }

    let json: Value = match serde_json::from_str(payload) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to parse SSE payload ({err}): {line}");
            return Frame::Malformed {
                raw_line: line.to_string(),
            };
        }
    };

    let Some(choice) = json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        warn!("SSE payload without choices: {line}");
        return Frame::Malformed {
            raw_line: line.to_string(),
        };
    };

    // A complete message object is authoritative and non-incremental
    if let Some(message) = choice.get("message") {
        return Frame::Terminal {
            content: populated_field(message, "content"),
            reasoning_content: populated_field(message, "reasoning_content"),
        };
    }

    let finish_signal = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(delta) = choice.get("delta").and_then(Value::as_object) {
        let reasoning_fragment = incremental_field(delta, "reasoning_content");
        let answer_fragment = incremental_field(delta, "content");

        // A delta carrying only unrelated keys (e.g. a bare role marker with
        // no finish reason) has no meaning to the session
        if reasoning_fragment.is_none()
            && answer_fragment.is_none()
            && finish_signal.is_none()
            && !delta.is_empty()
        {
            debug!("ignoring delta with no recognized fields: {line}");
            return Frame::Malformed {
                raw_line: line.to_string(),
            };
        }

        return Frame::Delta {
            reasoning_fragment,
            answer_fragment,
            finish_signal,
        };
    }

    // No delta object at all, but the choice can still close the turn
    if finish_signal.is_some() {
        return Frame::Delta {
            reasoning_fragment: None,
            answer_fragment: None,
            finish_signal,
        };
    }

    warn!("unrecognized SSE frame shape: {line}");
    Frame::Malformed {
        raw_line: line.to_string(),
    }
}

/// Terminal-message field: only a present, non-empty string counts.
fn populated_field(message: &Value, key: &str) -> Option<String> {
    message
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Incremental field normalization: absent stays absent (`None`), but a
/// present-and-null value means "field exists, no text yet" (`Some("")`).
/// The distinction drives phase classification.
fn incremental_field(delta: &Map<String, Value>, key: &str) -> Option<String> {
    match delta.get(key) {
        None => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => Some(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splitter_buffers_partial_lines_across_chunks() {
        let mut splitter = LineSplitter::new();

        let first = splitter.push("data: {\"a\":");
        assert!(first.is_empty());

        let second = splitter.push("1}\ndata: {\"b\":2}\n");
        assert_eq!(second, vec!["data: {\"a\":1}", "data: {\"b\":2}"]);
        assert!(splitter.remainder().is_none());
    }

    #[test]
    fn test_splitter_discards_protocol_noise() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(": keep-alive\n\nevent: ping\ndata: {\"x\":1}\n");
        assert_eq!(lines, vec!["data: {\"x\":1}"]);
    }

    #[test]
    fn test_splitter_handles_crlf() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push("data: [DONE]\r\n");
        assert_eq!(lines, vec!["data: [DONE]"]);
    }

    #[test]
    fn test_decoder_reassembles_split_multibyte_char() {
        let mut decoder = Utf8ChunkDecoder::new();
        let bytes = "域".as_bytes();
        assert_eq!(bytes.len(), 3);

        let mut text = decoder.decode(&bytes[..1]);
        text.push_str(&decoder.decode(&bytes[1..]));
        assert_eq!(text, "域");
    }

    #[test]
    fn test_decoder_passes_complete_chunks_through() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"data: {\"x\":1}\n"), "data: {\"x\":1}\n");
    }

    #[test]
    fn test_decoder_replaces_truly_invalid_bytes() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[0xff, b'a']), "\u{FFFD}a");
        // The bad byte is consumed, not carried
        assert_eq!(decoder.decode(b"b"), "b");
    }

    #[test]
    fn test_parse_sentinel() {
        assert_eq!(parse_frame("data: [DONE]"), Frame::Sentinel);
    }

    #[test]
    fn test_parse_delta_normalizes_null_to_empty() {
        let frame = parse_frame(
            r#"data: {"choices":[{"delta":{"reasoning_content":null,"content":"hi"}}]}"#,
        );
        assert_eq!(
            frame,
            Frame::Delta {
                reasoning_fragment: Some(String::new()),
                answer_fragment: Some("hi".to_string()),
                finish_signal: None,
            }
        );
    }

    #[test]
    fn test_parse_delta_absent_fields_stay_absent() {
        let frame =
            parse_frame(r#"data: {"choices":[{"delta":{"reasoning_content":"think"}}]}"#);
        assert_eq!(
            frame,
            Frame::Delta {
                reasoning_fragment: Some("think".to_string()),
                answer_fragment: None,
                finish_signal: None,
            }
        );
    }

    #[test]
    fn test_parse_empty_delta() {
        let frame = parse_frame(r#"data: {"choices":[{"delta":{}}]}"#);
        assert_eq!(
            frame,
            Frame::Delta {
                reasoning_fragment: None,
                answer_fragment: None,
                finish_signal: None,
            }
        );
    }

    #[test]
    fn test_parse_finish_without_delta_fields() {
        let frame =
            parse_frame(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        assert_eq!(
            frame,
            Frame::Delta {
                reasoning_fragment: None,
                answer_fragment: None,
                finish_signal: Some("stop".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_terminal_message() {
        let frame = parse_frame(
            r#"data: {"choices":[{"message":{"content":"done","reasoning_content":""}}]}"#,
        );
        assert_eq!(
            frame,
            Frame::Terminal {
                content: Some("done".to_string()),
                reasoning_content: None,
            }
        );
    }

    #[test]
    fn test_parse_malformed_json() {
        let frame = parse_frame("data: {not json");
        assert!(matches!(frame, Frame::Malformed { .. }));
    }

    #[test]
    fn test_parse_role_only_delta_is_ignored() {
        let frame = parse_frame(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert!(matches!(frame, Frame::Malformed { .. }));
    }
}

//! SSE (Server-Sent Events) stream parsing for the WebPilot run endpoint.
//!
//! The run endpoint answers with a long-lived `text/event-stream` body.
//! Network chunk boundaries carry no meaning there: a chunk can end in the
//! middle of a UTF-8 character, a `data:` line, or the blank-line separator
//! between events. This module reassembles that byte stream into complete
//! event blocks and decodes each block's payload:
//!
//! - [`Utf8Accumulator`] turns raw chunks into text, holding back a
//!   multi-byte sequence split across chunks instead of corrupting it.
//! - [`EventBlockBuffer`] accumulates text and emits each block once its
//!   `\n\n` terminator has arrived; a trailing partial block stays buffered.
//! - [`data_payload`] extracts the concatenated `data:` payload of a block.
//! - [`decode_event`] decodes a payload as JSON; callers skip failures.

use crate::events::AgentEvent;

/// Incremental UTF-8 decoder for a chunked byte stream.
///
/// A multi-byte character split across two chunks is held back until its
/// remaining bytes arrive. Genuinely invalid bytes are replaced with
/// U+FFFD so one bad byte cannot poison the rest of the stream.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return all text that is decodable so far.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);
        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    return text;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(prefix) = std::str::from_utf8(valid) {
                        text.push_str(prefix);
                    }
                    match err.error_len() {
                        // Invalid sequence in the middle: substitute and move on.
                        Some(skip) => {
                            text.push('\u{FFFD}');
                            rest = &tail[skip..];
                        }
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            self.pending = tail.to_vec();
                            return text;
                        }
                    }
                }
            }
        }
    }

    /// Bytes currently held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Accumulates decoded text and splits off complete SSE event blocks.
///
/// A block is complete once its `\n\n` separator has been seen; whatever
/// follows the last separator stays in the buffer for the next chunk. A
/// partial block left at end of stream is never flushed; a truncated
/// final event yields nothing.
#[derive(Debug, Default)]
pub struct EventBlockBuffer {
    decoder: Utf8Accumulator,
    text: String,
}

impl EventBlockBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk; returns every block completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let decoded = self.decoder.push(chunk);
        self.feed_text(&decoded)
    }

    /// Text-level variant of [`feed`](Self::feed), used when the input is
    /// already decoded.
    pub fn feed_text(&mut self, text: &str) -> Vec<String> {
        self.text.push_str(text);

        let mut blocks = Vec::new();
        while let Some(separator) = self.text.find("\n\n") {
            let block = self.text[..separator].to_string();
            self.text.drain(..separator + 2);
            blocks.push(block);
        }
        blocks
    }

    /// The unterminated tail currently buffered.
    pub fn remainder(&self) -> &str {
        &self.text
    }
}

/// Extract the payload of one event block.
///
/// Every `data:` line contributes its remainder (minus at most one
/// leading space) to a single concatenated payload string. Other lines
/// (comments, `event:`/`id:` fields) are ignored. Returns `None` for a
/// block with no payload at all.
pub fn data_payload(block: &str) -> Option<String> {
    let mut payload = String::new();
    for line in block.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(value) = line.strip_prefix("data:") {
            payload.push_str(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Decode a block payload into an [`AgentEvent`].
///
/// Failure is expected for malformed or non-object payloads; callers log
/// and skip the block rather than aborting the stream.
pub fn decode_event(payload: &str) -> Result<AgentEvent, serde_json::Error> {
    serde_json::from_str(payload)
}

//! Incremental decoder for `text/event-stream` payloads
//!
//! Frames accumulate as raw chunks arrive and dispatch on the blank line
//! that terminates them. Lines end at LF, CRLF, or a bare CR; a CR
//! terminates its line immediately and swallows one following LF, even
//! when the pair is split across chunks. Only unnamed events (and the
//! explicit `message` type) are surfaced. The `id` and `retry` fields
//! drive reconnection, which this channel never does, so they are parsed
//! and discarded.

use log::trace;

use crate::types::MessageEvent;

/// Streaming event-stream parser; safe to feed arbitrary chunk boundaries
pub(crate) struct SseDecoder {
    line: Vec<u8>,
    skip_lf: bool,
    event_type: String,
    data: String,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self {
            line: Vec::new(),
            skip_lf: false,
            event_type: String::new(),
            data: String::new(),
        }
    }

    /// Feed a chunk of stream bytes, returning every event the chunk completes
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<MessageEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.skip_lf) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\r' | b'\n' => {
                    self.skip_lf = byte == b'\r';
                    let raw = std::mem::take(&mut self.line);
                    let line = String::from_utf8_lossy(&raw);
                    if let Some(event) = self.process_line(&line) {
                        events.push(event);
                    }
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<MessageEvent> {
        if line.is_empty() {
            return self.finish_frame();
        }
        // A leading colon marks a comment line, commonly used as keep-alive.
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            _ => {}
        }
        None
    }

    fn finish_frame(&mut self) -> Option<MessageEvent> {
        if self.data.is_empty() {
            self.event_type.clear();
            return None;
        }
        let mut data = std::mem::take(&mut self.data);
        data.pop();
        let event_type = std::mem::take(&mut self.event_type);
        if !event_type.is_empty() && event_type != "message" {
            trace!("dropping stream event of type {:?}", event_type);
            return None;
        }
        Some(MessageEvent { data })
    }
}

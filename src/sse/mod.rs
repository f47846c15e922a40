//! Incremental `text/event-stream` framing.
//!
//! [`SseDecoder`] accepts arbitrary byte chunks, exactly as they arrive from a
//! socket, and reports each completed event together with the offset inside
//! the chunk just past the blank line that terminated it. The restart relay
//! uses that offset to forward a stream verbatim up to, and not beyond, its
//! terminal event; the console uses only the events.
//!
//! Line endings may be `\n`, `\r\n` or `\r`. Comment lines (`:`) and unknown
//! fields are skipped. A line longer than [`MAX_LINE_BYTES`] is dropped whole.

use std::mem;

/// Longest line the decoder will hold in memory
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Value of the last `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// Last seen `id:` value
    pub id: Option<String>,
}

impl SseEvent {
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Wire form of this event, terminated by a blank line.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if let Some(event) = &self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        if let Some(id) = &self.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// An event plus the chunk offset just past its terminating blank line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub end: usize,
    pub event: SseEvent,
}

/// Stateful decoder; one per stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    line_overflowed: bool,
    after_cr: bool,
    data: String,
    has_data: bool,
    event: Option<String>,
    last_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk, returning the events it completes in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut out = Vec::new();

        for (i, &byte) in chunk.iter().enumerate() {
            match byte {
                b'\n' if self.after_cr => {
                    // Second half of a CRLF already handled at the CR.
                    self.after_cr = false;
                }
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    if let Some(event) = self.end_line() {
                        let mut end = i + 1;
                        if self.after_cr && chunk.get(i + 1) == Some(&b'\n') {
                            end += 1;
                        }
                        out.push(Decoded { end, event });
                    }
                }
                _ => {
                    self.after_cr = false;
                    if self.line_overflowed {
                        continue;
                    }
                    if self.line.len() >= MAX_LINE_BYTES {
                        self.line.clear();
                        self.line_overflowed = true;
                        continue;
                    }
                    self.line.push(byte);
                }
            }
        }

        out
    }

    /// True when bytes of an unfinished event are buffered.
    pub fn has_partial(&self) -> bool {
        !self.line.is_empty() || self.line_overflowed || self.has_data || self.event.is_some()
    }

    fn end_line(&mut self) -> Option<SseEvent> {
        if self.line_overflowed {
            self.line_overflowed = false;
            return None;
        }
        let line = mem::take(&mut self.line);
        if line.is_empty() {
            return self.dispatch();
        }
        self.process_field(&line);
        None
    }

    fn process_field(&mut self, line: &[u8]) {
        if line[0] == b':' {
            return;
        }
        let text = String::from_utf8_lossy(line);
        let (field, value) = match text.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (text.as_ref(), ""),
        };
        match field {
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event,
            data: mem::take(&mut self.data),
            id: self.last_id.clone(),
        })
    }
}

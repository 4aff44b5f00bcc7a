//! Reader for the chat event stream.
//!
//! The body is newline-delimited text; event lines start with `data: ` and
//! carry a JSON object with a `type` discriminator. Lines may arrive split
//! across network chunks, so bytes are buffered until a newline shows up.

use crate::error::TransportError;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DATA_PREFIX: &str = "data: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Start,
    Chunk { content: String },
    Done,
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A `done` event arrived.
    Completed,
    /// An `error` event arrived, or the request itself failed.
    Failed,
    /// The body ended without a terminal event.
    Ended,
}

/// Callbacks for one streamed reply. Only `on_chunk` is mandatory.
pub trait ChatStreamHandler: Send {
    fn on_start(&mut self) {}

    fn on_chunk(&mut self, content: &str);

    fn on_done(&mut self) {}

    fn on_error(&mut self, _message: &str) {}
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ChatEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Vec<ChatEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }
}

fn parse_line(line: &str) -> Option<ChatEvent> {
    let line = line.trim_end_matches(['\n', '\r']);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let raw: RawEvent = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, payload, "skipping malformed chat stream event");
            return None;
        }
    };
    match raw.kind.as_str() {
        "start" => Some(ChatEvent::Start),
        "chunk" => match raw.content {
            Some(content) => Some(ChatEvent::Chunk { content }),
            None => {
                warn!(payload, "skipping chunk event without content");
                None
            }
        },
        "done" => Some(ChatEvent::Done),
        "error" => Some(ChatEvent::Error {
            message: raw
                .message
                .unwrap_or_else(|| "chat stream failed".to_string()),
        }),
        other => {
            debug!(kind = other, "ignoring unknown chat stream event");
            None
        }
    }
}

/// Returns the outcome if `event` ends the stream.
fn dispatch<H: ChatStreamHandler + ?Sized>(
    event: ChatEvent,
    handler: &mut H,
) -> Option<StreamOutcome> {
    match event {
        ChatEvent::Start => {
            handler.on_start();
            None
        }
        ChatEvent::Chunk { content } => {
            handler.on_chunk(&content);
            None
        }
        ChatEvent::Done => {
            handler.on_done();
            Some(StreamOutcome::Completed)
        }
        ChatEvent::Error { message } => {
            handler.on_error(&message);
            Some(StreamOutcome::Failed)
        }
    }
}

/// Drive `body` to completion, dispatching events to `handler` in arrival
/// order. Stops at the first `done` or `error`.
pub async fn read_event_stream<S, H>(mut body: S, handler: &mut H) -> StreamOutcome
where
    S: Stream<Item = Result<Vec<u8>, TransportError>> + Unpin,
    H: ChatStreamHandler + ?Sized,
{
    let mut decoder = EventStreamDecoder::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for event in decoder.push(&bytes) {
                    if let Some(outcome) = dispatch(event, handler) {
                        return outcome;
                    }
                }
            }
            Err(err) => {
                warn!(%err, "chat stream interrupted");
                handler.on_error(&err.to_string());
                return StreamOutcome::Failed;
            }
        }
    }
    for event in decoder.finish() {
        if let Some(outcome) = dispatch(event, handler) {
            return outcome;
        }
    }
    StreamOutcome::Ended
}

/// Collects events into a list; handy for tests and the CLI transcript.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<ChatEvent>,
}

impl EventLog {
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|event| match event {
                ChatEvent::Chunk { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ChatStreamHandler for EventLog {
    fn on_start(&mut self) {
        self.events.push(ChatEvent::Start);
    }

    fn on_chunk(&mut self, content: &str) {
        self.events.push(ChatEvent::Chunk {
            content: content.to_owned(),
        });
    }

    fn on_done(&mut self) {
        self.events.push(ChatEvent::Done);
    }

    fn on_error(&mut self, message: &str) {
        self.events.push(ChatEvent::Error {
            message: message.to_owned(),
        });
    }
}

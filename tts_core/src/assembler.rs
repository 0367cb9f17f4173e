//! Assembly of streamed audio events into a PCM buffer.
//!
//! The remote stream delivers one JSON payload per event. Audio events carry
//! a base64 fragment; any event may carry `IsEnd` to close the stream.
//! Malformed events are skipped so a partially garbled stream still yields
//! the audio it did deliver.

use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use tracing::debug;

use crate::{AssembleError, PcmBuffer};

/// Payload of a single stream event
///
/// Fields are read leniently: a field of an unexpected type counts as absent
/// and never hides the other fields of the event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    pub kind: Option<String>,
    pub audio: Option<String>,
    pub is_end: bool,
}

impl StreamEvent {
    /// Parse a raw payload; `None` when it is not a JSON event object.
    pub fn parse(payload: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(payload.trim()).ok()?;
        let fields = value.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            kind: text("Type"),
            audio: text("Audio"),
            is_end: fields.get("IsEnd").is_some_and(is_truthy),
        })
    }

    pub fn is_audio(&self) -> bool {
        self.kind.as_deref() == Some("audio")
    }

    pub fn is_end(&self) -> bool {
        self.is_end
    }
}

// `true`, a non-zero number, a non-empty string, array or object
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Whether the caller should keep pulling events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Default)]
pub struct Assembler {
    buffer: PcmBuffer,
    skipped: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw event payload.
    pub fn push(&mut self, payload: &str) -> Flow {
        let Some(event) = StreamEvent::parse(payload) else {
            self.skipped += 1;
            debug!("Skipping malformed stream event ({} bytes)", payload.len());
            return Flow::Continue;
        };

        if event.is_audio() {
            if let Some(fragment) = event.audio.as_deref().filter(|a| !a.is_empty()) {
                match general_purpose::STANDARD.decode(fragment) {
                    Ok(bytes) => self.buffer.push_fragment(&bytes),
                    Err(e) => {
                        self.skipped += 1;
                        debug!("Skipping audio event with undecodable fragment: {e}");
                    }
                }
            }
        }

        if event.is_end() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Events dropped because they could not be parsed or decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> Result<PcmBuffer, AssembleError> {
        if self.buffer.is_empty() {
            return Err(AssembleError::NoAudio);
        }
        debug!(
            "Stream assembled: {} fragments, {} bytes, {} skipped",
            self.buffer.fragments(),
            self.buffer.as_bytes().len(),
            self.skipped
        );
        Ok(self.buffer)
    }
}

/// Assemble an infallible sequence of payloads.
///
/// Stops pulling as soon as an event declares the end of the stream.
pub fn assemble<I, S>(events: I) -> Result<PcmBuffer, AssembleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assembler = Assembler::new();
    for payload in events {
        if assembler.push(payload.as_ref()) == Flow::Stop {
            break;
        }
    }
    assembler.finish()
}

/// Assemble a sequence of payloads read from a fallible source.
///
/// A read error aborts assembly with that error; a stream that closes
/// without any audio yields [`AssembleError::NoAudio`] converted into `E`.
pub fn try_assemble<I, S, E>(events: I) -> Result<PcmBuffer, E>
where
    I: IntoIterator<Item = Result<S, E>>,
    S: AsRef<str>,
    E: From<AssembleError>,
{
    let mut assembler = Assembler::new();
    for payload in events {
        if assembler.push(payload?.as_ref()) == Flow::Stop {
            break;
        }
    }
    Ok(assembler.finish()?)
}

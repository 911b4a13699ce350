//! Text extraction from the workflow API's response stream.
//!
//! The workflow API answers with newline-separated records that may be plain
//! JSON envelopes, SSE `data:` lines, or bare text. Payloads are frequently
//! double-encoded: an envelope's `data` field is itself a JSON string holding
//! `{"output": "..."}`. Each line is tried against an ordered list of decoders
//! and the first one that yields text wins.

use bytes::{Bytes, BytesMut};
use serde_json::Value;

/// What a single upstream line contributes to the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Text(String),
    /// The upstream reported a failure on this line.
    ServiceError(String),
    Skip,
}

/// Splits a byte stream into complete lines, whatever the read boundaries.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw = self.buffer.split_to(pos + 1);
            lines.push(decode_line(&raw[..pos]));
        }
        lines
    }

    /// The trailing partial line, if any, once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw: Bytes = self.buffer.split().freeze();
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

type Decoder = fn(&Value) -> Option<String>;

/// Content decoders in priority order.
const DECODERS: [(&str, Decoder); 5] = [
    ("data", decode_data),
    ("output", decode_output),
    ("content", decode_content),
    ("text", decode_text),
    ("message", decode_message),
];

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse a stringified JSON object and return its string `output`.
fn nested_output(raw: &str) -> Result<Option<String>, serde_json::Error> {
    let inner: Value = serde_json::from_str(raw)?;
    Ok(inner.get("output").and_then(Value::as_str).and_then(non_empty))
}

fn decode_data(v: &Value) -> Option<String> {
    let raw = v.get("data")?.as_str()?;
    match nested_output(raw) {
        Ok(output) => output,
        Err(_) => non_empty(raw),
    }
}

fn decode_output(v: &Value) -> Option<String> {
    let output = v.get("output")?;
    output
        .as_str()
        .or_else(|| output.get("text").and_then(Value::as_str))
        .and_then(non_empty)
}

fn decode_content(v: &Value) -> Option<String> {
    let raw = v.get("content")?.as_str()?;
    match nested_output(raw) {
        Ok(Some(output)) => Some(output),
        _ => non_empty(raw),
    }
}

fn decode_text(v: &Value) -> Option<String> {
    v.get("text")?.as_str().and_then(non_empty)
}

fn decode_message(v: &Value) -> Option<String> {
    let message = v.get("message")?;
    message
        .as_str()
        .or_else(|| message.get("content").and_then(Value::as_str))
        .and_then(non_empty)
}

fn upstream_error(v: &Value) -> Option<String> {
    let present = |key: &str| v.get(key).is_some_and(|x| !x.is_null());

    if present("error_message") || present("error_code") {
        let detail = v
            .get("error_message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| v.get("error_code").map(Value::to_string))
            .unwrap_or_default();
        return Some(detail);
    }

    // A failed run envelope: non-zero `code` and nothing usable in `data`.
    let failed_code = v
        .get("code")
        .and_then(Value::as_i64)
        .is_some_and(|code| code != 0);
    if failed_code && decode_data(v).is_none() {
        let detail = v
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Some(detail);
    }
    None
}

/// Run the decoders over an already-parsed JSON record.
pub fn extract_value(v: &Value) -> LineOutcome {
    if let Some(detail) = upstream_error(v) {
        return LineOutcome::ServiceError(detail);
    }

    DECODERS
        .iter()
        .find_map(|(field, decode)| {
            let text = decode(v)?;
            tracing::trace!(field, len = text.len(), "extracted upstream text");
            Some(text)
        })
        .map(LineOutcome::Text)
        .unwrap_or(LineOutcome::Skip)
}

/// Classify one line of the upstream stream.
pub fn extract_line(line: &str) -> LineOutcome {
    let line = line.trim();

    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => line,
    };

    if payload.is_empty() || payload == "[DONE]" {
        return LineOutcome::Skip;
    }

    let is_control = ["id:", "event:", "retry:", ":"]
        .iter()
        .any(|prefix| payload.starts_with(prefix));
    if is_control {
        return LineOutcome::Skip;
    }

    // Only objects are records; bare scalars and arrays are plain text.
    match serde_json::from_str::<Value>(payload) {
        Ok(value @ Value::Object(_)) => extract_value(&value),
        _ => LineOutcome::Text(payload.to_string()),
    }
}

/// Accumulates extracted fragments across a whole upstream reply.
#[derive(Debug, Default)]
pub struct TextCollector {
    lines: LineBuffer,
    text: String,
    errors: Vec<String>,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        for line in self.lines.push(chunk) {
            self.apply(&line);
        }
    }

    fn apply(&mut self, line: &str) {
        match extract_line(line) {
            LineOutcome::Text(text) => self.text.push_str(&text),
            LineOutcome::ServiceError(detail) => self.errors.push(detail),
            LineOutcome::Skip => {}
        }
    }

    pub fn finish(mut self) -> Collected {
        if let Some(line) = self.lines.finish() {
            self.apply(&line);
        }
        Collected {
            text: self.text,
            errors: self.errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub text: String,
    /// Details of every error record the upstream sent.
    pub errors: Vec<String>,
}

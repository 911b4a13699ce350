//! Line-delimited streaming protocol spoken to the browser.
//!
//! Every record is `0:` followed by one compact JSON object and a newline.
//! A well-formed stream is one `message-start`, any number of content
//! records, then one `message-end`.

use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Maximum slice length, in UTF-16 code units, of a paced text delta.
pub const CHUNK_UTF16_UNITS: usize = 40;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireMessage {
    pub id: String,
    pub role: &'static str,
    pub model: String,
}

impl WireMessage {
    pub fn assistant(model: &str) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4().simple()),
            role: "assistant",
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireChunk {
    MessageStart {
        message: WireMessage,
    },
    TextDelta {
        #[serde(rename = "textDelta")]
        text_delta: String,
    },
    Reasoning {
        text: String,
    },
    Source {
        source: WireSource,
    },
    Error {
        error: String,
    },
    MessageEnd,
}

impl WireChunk {
    pub fn text(text: impl Into<String>) -> Self {
        WireChunk::TextDelta {
            text_delta: text.into(),
        }
    }

    pub fn encode(&self) -> Bytes {
        // Every variant is plain strings, so serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        Bytes::from(format!("0:{}\n", json))
    }
}

/// Split `text` into slices of at most `max_units` UTF-16 code units.
///
/// A surrogate pair is never split, so a slice may end one unit short.
pub fn split_utf16(text: &str, max_units: usize) -> Vec<&str> {
    let max_units = max_units.max(2);
    let mut slices = Vec::new();
    let mut start = 0;
    let mut units = 0;

    for (idx, c) in text.char_indices() {
        let len = c.len_utf16();
        if units + len > max_units {
            slices.push(&text[start..idx]);
            start = idx;
            units = 0;
        }
        units += len;
    }

    if start < text.len() {
        slices.push(&text[start..]);
    }
    slices
}

/// Synthetic typing speed for re-streamed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub total: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            total: Duration::from_millis(3000),
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }
}

impl Pacing {
    pub fn immediate() -> Self {
        Self {
            total: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay between consecutive chunks: `total / chunk_count`, clamped.
    pub fn delay_for(&self, chunk_count: usize) -> Duration {
        if chunk_count == 0 {
            return self.min_delay;
        }
        let per_chunk = self.total / chunk_count as u32;
        per_chunk.clamp(self.min_delay, self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_delta_encoding() {
        let line = WireChunk::text("hi \"there\"").encode();
        assert_eq!(
            std::str::from_utf8(&line).unwrap(),
            "0:{\"type\":\"text-delta\",\"textDelta\":\"hi \\\"there\\\"\"}\n"
        );
    }

    #[test]
    fn test_message_end_and_error_encoding() {
        assert_eq!(
            WireChunk::MessageEnd.encode(),
            Bytes::from("0:{\"type\":\"message-end\"}\n")
        );
        assert_eq!(
            WireChunk::Error {
                error: "boom".to_string()
            }
            .encode(),
            Bytes::from("0:{\"type\":\"error\",\"error\":\"boom\"}\n")
        );
    }

    #[test]
    fn test_message_start_carries_assistant_message() {
        let line = WireChunk::MessageStart {
            message: WireMessage::assistant("palmreading"),
        }
        .encode();
        let json: serde_json::Value =
            serde_json::from_str(std::str::from_utf8(&line[2..]).unwrap().trim()).unwrap();

        assert_eq!(json["type"], "message-start");
        assert_eq!(json["message"]["role"], "assistant");
        assert_eq!(json["message"]["model"], "palmreading");
        assert!(json["message"]["id"].as_str().unwrap().starts_with("msg-"));
    }

    #[test]
    fn test_source_skips_missing_title() {
        let line = WireChunk::Source {
            source: WireSource {
                url: "https://a.example".to_string(),
                title: None,
            },
        }
        .encode();
        assert_eq!(
            line,
            Bytes::from("0:{\"type\":\"source\",\"source\":{\"url\":\"https://a.example\"}}\n")
        );
    }

    #[test]
    fn test_split_count_is_ceil_and_concat_round_trips() {
        for len in [0usize, 1, 39, 40, 41, 80, 81, 333] {
            let text: String = "ab你".chars().cycle().take(len).collect();
            let slices = split_utf16(&text, CHUNK_UTF16_UNITS);

            assert_eq!(slices.len(), len.div_ceil(CHUNK_UTF16_UNITS), "len {}", len);
            assert_eq!(slices.concat(), text);
            assert!(slices
                .iter()
                .all(|s| s.encode_utf16().count() <= CHUNK_UTF16_UNITS));
        }
    }

    #[test]
    fn test_split_never_breaks_surrogate_pairs() {
        let text = "a".repeat(39) + "😀" + "b";
        let slices = split_utf16(&text, CHUNK_UTF16_UNITS);

        assert_eq!(slices, vec!["a".repeat(39).as_str(), "😀b"]);
    }

    #[test]
    fn test_pacing_delay_is_clamped() {
        let pacing = Pacing::default();

        assert_eq!(pacing.delay_for(1), Duration::from_millis(200));
        assert_eq!(pacing.delay_for(15), Duration::from_millis(200));
        assert_eq!(pacing.delay_for(30), Duration::from_millis(100));
        assert_eq!(pacing.delay_for(1000), Duration::from_millis(10));
        assert_eq!(Pacing::immediate().delay_for(7), Duration::ZERO);
    }
}

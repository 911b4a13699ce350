//! Data models and structures
//!
//! Defines the inbound chat request shape sent by the browser and the
//! locale it asks the answer to be written in.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model name that selects the palm-reading workflow instead of an LLM provider.
pub const PALMREADING_MODEL: &str = "palmreading";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    /// Map a browser locale tag (`zh`, `zh-CN`, `zh_TW`, `en-US`, ...) onto the
    /// two supported locales. Anything not Chinese is English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if primary == "zh" {
            Locale::Zh
        } else {
            Locale::En
        }
    }
}

fn lenient_locale<'de, D>(deserializer: D) -> Result<Locale, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(tag)) => Locale::from_tag(&tag),
        _ => Locale::default(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(raw, Some(Value::Bool(true))))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    #[serde(alias = "image")]
    File {
        url: String,
        #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl MessagePart {
    /// URL of an image attachment; files with a non-image media type are skipped.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            MessagePart::File { url, media_type } => match media_type {
                Some(mt) if !mt.starts_with("image/") => None,
                _ => Some(url.as_str()),
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub model: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub web_search: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_locale")]
    pub locale: Locale,
}

impl ChatRequest {
    pub fn is_palmreading(&self) -> bool {
        self.model == PALMREADING_MODEL
    }

    /// Trimmed text of the most recent user message, if it has any.
    pub fn last_user_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// The explicit `imageUrl`, falling back to the newest image attachment.
    pub fn effective_image_url(&self) -> Option<String> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.messages
                    .iter()
                    .rev()
                    .flat_map(|m| m.parts.iter().rev())
                    .find_map(|p| p.image_url().map(str::to_string))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"model":"palmreading"}"#).unwrap();

        assert!(req.messages.is_empty());
        assert!(!req.web_search);
        assert_eq!(req.locale, Locale::En);
        assert!(req.is_palmreading());
    }

    #[test]
    fn test_chat_request_camel_case_fields() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"messages":[],"model":"openai/gpt-4o","webSearch":true,"imageUrl":"https://x/img.png","locale":"zh"}"#,
        )
        .unwrap();

        assert!(req.web_search);
        assert_eq!(req.image_url.as_deref(), Some("https://x/img.png"));
        assert_eq!(req.locale, Locale::Zh);
    }

    #[test]
    fn test_null_and_regional_fields_are_lenient() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"model":"palmreading","locale":null,"webSearch":null,"imageUrl":null}"#,
        )
        .unwrap();
        assert_eq!(req.locale, Locale::En);
        assert!(!req.web_search);

        let req: ChatRequest =
            serde_json::from_str(r#"{"model":"palmreading","locale":"zh-CN"}"#).unwrap();
        assert_eq!(req.locale, Locale::Zh);

        let req: ChatRequest =
            serde_json::from_str(r#"{"model":"palmreading","locale":"fr"}"#).unwrap();
        assert_eq!(req.locale, Locale::En);
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("zh"), Locale::Zh);
        assert_eq!(Locale::from_tag("ZH_tw"), Locale::Zh);
        assert_eq!(Locale::from_tag("en-US"), Locale::En);
        assert_eq!(Locale::from_tag(""), Locale::En);
    }

    #[test]
    fn test_unknown_part_types_are_tolerated() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"user","parts":[{"type":"step-start"},{"type":"text","text":"hi"}]}"#,
        )
        .unwrap();

        assert_eq!(msg.parts[0], MessagePart::Unknown);
        assert_eq!(msg.text(), "hi");
    }

    #[test]
    fn test_last_user_text_skips_assistant_and_blank() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"model":"palmreading","messages":[
                {"role":"user","parts":[{"type":"text","text":"read my palm"}]},
                {"role":"assistant","parts":[{"type":"text","text":"sure"}]},
                {"role":"user","parts":[{"type":"text","text":"   "}]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(req.last_user_text(), None);
    }

    #[test]
    fn test_effective_image_url_prefers_explicit_field() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"model":"palmreading","imageUrl":"https://x/a.png","messages":[
                {"role":"user","parts":[{"type":"file","url":"https://x/b.png","mediaType":"image/png"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(req.effective_image_url().as_deref(), Some("https://x/a.png"));

        let req = ChatRequest {
            image_url: None,
            ..req
        };
        assert_eq!(req.effective_image_url().as_deref(), Some("https://x/b.png"));
    }

    #[test]
    fn test_non_image_file_is_not_an_image_url() {
        let part = MessagePart::File {
            url: "https://x/doc.pdf".to_string(),
            media_type: Some("application/pdf".to_string()),
        };
        assert_eq!(part.image_url(), None);
    }
}

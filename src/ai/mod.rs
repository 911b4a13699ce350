//! LLM provider integration
//!
//! Streams chat completions from OpenAI-compatible providers and routes a
//! browser-facing model id to the provider that serves it.

pub mod client;
pub mod mock;
pub mod router;
pub mod types;

pub use client::{provider_http_client, OpenAiCompatClient};
pub use mock::MockChatClient;
pub use router::{route, Provider, ProviderRegistry, Route};
pub use types::{ChatMessage, ChatMessageContent, ContentPart, ImageUrl};

use crate::models::{Message, Role};
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One increment of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatDelta {
    Text(String),
    Reasoning(String),
    Source { url: String, title: Option<String> },
}

pub type ChatDeltaStream = BoxStream<'static, Result<ChatDelta>>;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Start a streamed completion. Errors before the first byte (missing
    /// credentials, non-2xx status) are returned here; later failures arrive
    /// as `Err` items on the stream.
    async fn stream_chat(&self, model: &str, messages: Vec<ChatMessage>)
        -> Result<ChatDeltaStream>;
}

/// Convert browser messages to provider messages.
///
/// Image attachments on user messages become `image_url` parts; messages
/// left with no content are dropped.
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter_map(|m| {
            let text = m.text();
            let images: Vec<&str> = if m.role == Role::User {
                m.parts.iter().filter_map(|p| p.image_url()).collect()
            } else {
                Vec::new()
            };

            let content = if images.is_empty() {
                if text.is_empty() {
                    return None;
                }
                ChatMessageContent::Text(text)
            } else {
                let mut parts = Vec::with_capacity(images.len() + 1);
                if !text.is_empty() {
                    parts.push(ContentPart::Text { text });
                }
                parts.extend(images.into_iter().map(|url| ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: url.to_string(),
                    },
                }));
                ChatMessageContent::Parts(parts)
            };

            Some(ChatMessage {
                role: m.role.as_str().to_string(),
                content,
            })
        })
        .collect()
}

//! Pass-through streaming for ordinary LLM chat models.

use crate::ai::{to_chat_messages, ChatDelta, ProviderRegistry};
use crate::language;
use crate::models::ChatRequest;
use crate::transcoder::WireStream;
use crate::wire::{WireChunk, WireMessage, WireSource};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn, Span};

fn to_wire(delta: ChatDelta) -> WireChunk {
    match delta {
        ChatDelta::Text(text) => WireChunk::text(text),
        ChatDelta::Reasoning(text) => WireChunk::Reasoning { text },
        ChatDelta::Source { url, title } => WireChunk::Source {
            source: WireSource { url, title },
        },
    }
}

/// Stream a provider completion as wire chunks.
///
/// Failing to start the completion yields one localized text delta; a failure
/// mid-stream yields an `error` chunk. `message-end` is always sent.
pub fn chat_stream(providers: Arc<ProviderRegistry>, request: ChatRequest, span: Span) -> WireStream {
    let stream = async_stream::stream! {
        yield Ok::<Bytes, Infallible>(WireChunk::MessageStart {
            message: WireMessage::assistant(&request.model),
        }
        .encode());

        let messages = to_chat_messages(&request.messages);
        match providers.stream(&request.model, request.web_search, messages).await {
            Ok(mut deltas) => {
                let mut count = 0usize;
                while let Some(item) = deltas.next().await {
                    match item {
                        Ok(delta) => {
                            count += 1;
                            yield Ok(to_wire(delta).encode());
                        }
                        Err(e) => {
                            warn!(parent: &span, "Provider stream failed after {} deltas: {}", count, e);
                            yield Ok(WireChunk::Error { error: e.to_string() }.encode());
                            break;
                        }
                    }
                }
                info!(parent: &span, "Provider stream finished ({} deltas)", count);
            }
            Err(e) => {
                warn!(parent: &span, "Provider call failed: {}", e);
                yield Ok(WireChunk::text(language::request_failed(request.locale, &e.to_string())).encode());
            }
        }

        yield Ok(WireChunk::MessageEnd.encode());
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockChatClient, Provider};
    use crate::models::Locale;
    use pretty_assertions::assert_eq;

    fn request(model: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![],
            model: model.to_string(),
            web_search: false,
            image_url: None,
            locale: Locale::En,
        }
    }

    async fn types(stream: WireStream) -> Vec<serde_json::Value> {
        stream
            .map(|item| {
                let line = item.unwrap();
                serde_json::from_slice(&line[2..]).unwrap()
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_deltas_become_wire_chunks() {
        let mock = Arc::new(MockChatClient::new().with_response(vec![
            ChatDelta::Reasoning("think".to_string()),
            ChatDelta::Text("answer".to_string()),
            ChatDelta::Source {
                url: "https://a.example".to_string(),
                title: None,
            },
        ]));
        let providers = ProviderRegistry::empty().with_service(Provider::DeepSeek, mock);

        let records = types(chat_stream(
            Arc::new(providers),
            request("deepseek/deepseek-r1"),
            Span::none(),
        ))
        .await;

        let kinds: Vec<&str> = records.iter().map(|r| r["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec!["message-start", "reasoning", "text-delta", "source", "message-end"]
        );
        assert_eq!(records[2]["textDelta"], "answer");
        assert_eq!(records[3]["source"]["url"], "https://a.example");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_reports_error_text() {
        let records = types(chat_stream(
            Arc::new(ProviderRegistry::empty()),
            request("openai/gpt-4o"),
            Span::none(),
        ))
        .await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["type"], "text-delta");
        assert!(records[1]["textDelta"]
            .as_str()
            .unwrap()
            .contains("OPENAI_API_KEY"));
        assert_eq!(records[2]["type"], "message-end");
    }
}

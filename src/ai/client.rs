use super::types::{ChatCompletionChunk, ChatCompletionRequest, ChatMessage};
use super::{ChatDelta, ChatDeltaStream, ChatService};
use crate::extract::LineBuffer;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Longest silence tolerated between two reads of a streamed completion.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client shared by the provider clients.
pub fn provider_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Streaming client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatClient {
    client: Client,
    name: &'static str,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatClient {
    pub fn new(name: &'static str, api_key: String, base_url: String) -> Self {
        Self::new_with_client(name, api_key, base_url, provider_http_client())
    }

    pub fn new_with_client(
        name: &'static str,
        api_key: String,
        base_url: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            name,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Turns decoded chunks into deltas, emitting each source URL once.
#[derive(Default)]
struct DeltaDecoder {
    seen_sources: HashSet<String>,
}

impl DeltaDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<ChatDelta>> {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:").map(str::trim) else {
            return Ok(Vec::new());
        };
        if data.is_empty() || data == "[DONE]" {
            return Ok(Vec::new());
        }

        let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!("Skipping undecodable stream chunk: {}", e);
                return Ok(Vec::new());
            }
        };

        if let Some(err) = chunk.error {
            return Err(Error::AiProvider(err.message));
        }

        let mut deltas = Vec::new();
        for url in chunk.citations {
            self.push_source(&mut deltas, url, None);
        }
        for choice in chunk.choices {
            let delta = choice.delta;
            if let Some(reasoning) = delta.reasoning_content.or(delta.reasoning) {
                if !reasoning.is_empty() {
                    deltas.push(ChatDelta::Reasoning(reasoning));
                }
            }
            if let Some(content) = delta.content {
                if !content.is_empty() {
                    deltas.push(ChatDelta::Text(content));
                }
            }
            for annotation in delta.annotations {
                if annotation.kind != "url_citation" {
                    continue;
                }
                if let Some(citation) = annotation.url_citation {
                    self.push_source(&mut deltas, citation.url, citation.title);
                }
            }
        }
        Ok(deltas)
    }

    fn push_source(&mut self, deltas: &mut Vec<ChatDelta>, url: String, title: Option<String>) {
        if self.seen_sources.insert(url.clone()) {
            deltas.push(ChatDelta::Source { url, title });
        }
    }
}

#[async_trait]
impl ChatService for OpenAiCompatClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatDeltaStream> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            stream: true,
        };
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("Sending streamed chat request to {} (model: {})", self.name, model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", self.name, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("{} API error (status {}): {}", self.name, status, error_text);
            // Only the status reaches the browser; the body is logged above.
            return Err(Error::AiProvider(format!(
                "{} API error (status {})",
                self.name, status
            )));
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut lines = LineBuffer::new();
            let mut decoder = DeltaDecoder::default();

            while let Some(item) = body.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(Error::Http(e));
                        return;
                    }
                };
                for line in lines.push(&bytes) {
                    match decoder.decode_line(&line) {
                        Ok(deltas) => {
                            for delta in deltas {
                                yield Ok(delta);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(line) = lines.finish() {
                match decoder.decode_line(&line) {
                    Ok(deltas) => {
                        for delta in deltas {
                            yield Ok(delta);
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(stream.boxed())
    }
}

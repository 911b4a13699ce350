use super::{ChatDelta, ChatDeltaStream, ChatMessage, ChatService};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedChatCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<Vec<ChatDelta>>>>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<RecordedChatCall>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, deltas: Vec<ChatDelta>) -> Self {
        self.responses.lock().unwrap().push(deltas);
        self
    }

    /// Every call fails with an `AiProvider` error carrying `message`.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatDeltaStream> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedChatCall {
                model: model.to_string(),
                messages,
            });
            calls.len()
        };

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.responses.lock().unwrap();
        let deltas = if responses.is_empty() {
            vec![ChatDelta::Text(format!("mock reply from {}", model))]
        } else {
            responses[(count - 1) % responses.len()].clone()
        };

        Ok(futures::stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_mock_default_reply_names_model() {
        let client = MockChatClient::new();
        let deltas: Vec<ChatDelta> = client
            .stream_chat("gpt-4o", vec![])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(deltas, vec![ChatDelta::Text("mock reply from gpt-4o".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_cycles_responses_and_counts_calls() {
        let client = MockChatClient::new()
            .with_response(vec![ChatDelta::Text("one".to_string())])
            .with_response(vec![ChatDelta::Text("two".to_string())]);

        for expected in ["one", "two", "one"] {
            let deltas: Vec<ChatDelta> = client
                .stream_chat("m", vec![])
                .await
                .unwrap()
                .try_collect()
                .await
                .unwrap();
            assert_eq!(deltas, vec![ChatDelta::Text(expected.to_string())]);
        }
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockChatClient::new().with_failure("no key");
        let err = client.stream_chat("m", vec![]).await.err().unwrap();

        assert!(matches!(err, Error::AiProvider(ref m) if m == "no key"));
        assert_eq!(client.get_call_count(), 1);
    }
}

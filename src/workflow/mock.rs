use super::{ByteStream, WorkflowInput, WorkflowService};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockReply {
    Body(Vec<Bytes>),
    /// Body chunks followed by a read error.
    Truncated(Vec<Bytes>),
    Fail(String),
}

#[derive(Clone)]
pub struct MockWorkflowClient {
    reply: MockReply,
    inputs: Arc<Mutex<Vec<WorkflowInput>>>,
}

impl MockWorkflowClient {
    pub fn new() -> Self {
        Self {
            reply: MockReply::Body(Vec::new()),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `chunks`, delivered as separate reads.
    pub fn with_chunks<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.reply = MockReply::Body(chunks.into_iter().map(Into::into).collect());
        self
    }

    /// Reply with `chunks`, then fail the next read.
    pub fn with_truncated_chunks<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.reply = MockReply::Truncated(chunks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.reply = MockReply::Fail(message.to_string());
        self
    }

    pub fn inputs(&self) -> Vec<WorkflowInput> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

impl Default for MockWorkflowClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowService for MockWorkflowClient {
    async fn run(&self, input: &WorkflowInput) -> Result<ByteStream> {
        self.inputs.lock().unwrap().push(input.clone());

        match &self.reply {
            MockReply::Body(chunks) => {
                Ok(futures::stream::iter(chunks.clone().into_iter().map(Ok)).boxed())
            }
            MockReply::Truncated(chunks) => {
                let items = chunks
                    .clone()
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(Error::Workflow(
                        "connection reset".to_string(),
                    ))));
                Ok(futures::stream::iter(items).boxed())
            }
            MockReply::Fail(message) => Err(Error::Workflow(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> WorkflowInput {
        WorkflowInput {
            input: "palm".to_string(),
            image_url: None,
            language_tag: "中文".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_replays_chunks_and_records_input() {
        let client = MockWorkflowClient::new().with_chunks(["a\n", "b\n"]);
        let chunks: Vec<Result<Bytes>> = client.run(&input()).await.unwrap().collect().await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(client.inputs(), vec![input()]);
    }

    #[tokio::test]
    async fn test_mock_truncated_ends_with_error() {
        let client = MockWorkflowClient::new().with_truncated_chunks(["a\n"]);
        let chunks: Vec<Result<Bytes>> = client.run(&input()).await.unwrap().collect().await;

        assert!(chunks[0].is_ok());
        assert!(chunks[1].is_err());
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockWorkflowClient::new().with_failure("down");
        assert!(client.run(&input()).await.is_err());
        assert_eq!(client.get_call_count(), 1);
    }
}

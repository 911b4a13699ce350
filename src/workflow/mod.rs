//! Workflow API integration
//!
//! Runs the hosted palm-reading workflow and hands back its raw response body
//! as a byte stream for the transcoder to parse.

pub mod client;
pub mod mock;

pub use client::CozeWorkflowClient;
pub use mock::MockWorkflowClient;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Inputs of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInput {
    pub input: String,
    pub image_url: Option<String>,
    /// Value of the workflow's `Language` parameter.
    pub language_tag: String,
}

#[derive(Debug, Serialize)]
pub struct WorkflowRunRequest<'a> {
    pub workflow_id: &'a str,
    pub parameters: WorkflowParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowParameters<'a> {
    pub user_name: &'a str,
    pub input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
    #[serde(rename = "Language")]
    pub language: &'a str,
}

#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Start a run. Configuration problems and non-2xx statuses are returned
    /// as errors; the body is streamed as-is otherwise.
    async fn run(&self, input: &WorkflowInput) -> Result<ByteStream>;
}

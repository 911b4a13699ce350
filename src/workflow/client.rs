use super::{ByteStream, WorkflowInput, WorkflowParameters, WorkflowRunRequest, WorkflowService};
use crate::config::CozeConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::time::Duration;

/// Client for the Coze workflow run endpoint.
pub struct CozeWorkflowClient {
    client: Client,
    config: CozeConfig,
}

impl CozeWorkflowClient {
    pub fn new(config: CozeConfig) -> Self {
        // Runs can take minutes; only the connect phase is bounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::new_with_client(config, client)
    }

    pub fn new_with_client(config: CozeConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("COZE_API_KEY is not set".to_string()))?;
        let workflow_id = self
            .config
            .workflow_id
            .as_deref()
            .ok_or_else(|| Error::Config("COZE_WORKFLOW_ID is not set".to_string()))?;
        Ok((api_key, workflow_id))
    }
}

#[async_trait]
impl WorkflowService for CozeWorkflowClient {
    async fn run(&self, input: &WorkflowInput) -> Result<ByteStream> {
        let (api_key, workflow_id) = self.credentials()?;

        let request = WorkflowRunRequest {
            workflow_id,
            parameters: WorkflowParameters {
                user_name: &self.config.user_name,
                input: &input.input,
                image: input.image_url.as_deref(),
                language: &input.language_tag,
            },
        };

        tracing::debug!(
            "Starting workflow run (has image: {}, language: {})",
            input.image_url.is_some(),
            input.language_tag
        );

        let response = self
            .client
            .post(&self.config.workflow_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to workflow API: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Workflow API error (status {}): {}", status, error_text);
            // Only the status reaches the browser; the body is logged above.
            return Err(Error::Workflow(format!("API error (status {})", status)));
        }

        Ok(response.bytes_stream().map_err(Error::Http).boxed())
    }
}

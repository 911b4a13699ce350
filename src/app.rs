//! Application wiring: builds the services from configuration and hands them
//! to the HTTP server.

use crate::ai::{provider_http_client, ProviderRegistry};
use crate::config::Config;
use crate::server::{self, AppState};
use crate::translate::Translator;
use crate::upload::{ImageUploader, InlineUploadClient, S3UploadClient, UploadService};
use crate::wire::Pacing;
use crate::workflow::{CozeWorkflowClient, WorkflowService};
use crate::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

pub struct App {
    state: AppState,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub workflow: Arc<dyn WorkflowService>,
    pub providers: ProviderRegistry,
    pub storage: Arc<dyn UploadService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// Limits, the translation model and the default workflow prompt still
    /// come from `config`.
    pub fn with_services(services: AppServices, config: &Config, pacing: Pacing) -> Self {
        let providers = Arc::new(services.providers);
        let translator = Translator::new(providers.clone(), config.translation_model.clone());

        Self {
            state: AppState {
                workflow: services.workflow,
                providers,
                translator,
                uploader: ImageUploader::new(services.storage, config.upload_max_bytes),
                pacing,
                default_input: config.coze.user_input.clone(),
            },
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = provider_http_client();

        if config.coze.api_key.is_none() || config.coze.workflow_id.is_none() {
            warn!("COZE_API_KEY or COZE_WORKFLOW_ID is not set; palm readings will fail");
        }
        let workflow: Arc<dyn WorkflowService> =
            Arc::new(CozeWorkflowClient::new(config.coze.clone()));
        let providers = ProviderRegistry::from_config(&config, http_client);

        let storage: Arc<dyn UploadService> = match config.cdn.clone() {
            Some(cdn) => {
                info!("Uploads go to bucket {} at {}", cdn.bucket, cdn.endpoint);
                Arc::new(S3UploadClient::new(cdn).await?)
            }
            None => {
                info!("CDN credentials not set; uploads are returned as data URLs");
                Arc::new(InlineUploadClient::new())
            }
        };

        info!("Translation model: {}", config.translation_model);

        Ok(Self::with_services(
            AppServices {
                workflow,
                providers,
                storage,
            },
            &config,
            Pacing::default(),
        ))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        server::build_router(self.state.clone())
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        server::serve(self.router(), addr).await
    }
}

//! Model id to provider routing.

use super::{ChatDeltaStream, ChatMessage, ChatService, OpenAiCompatClient};
use crate::config::{Config, ProviderConfig};
use crate::{Error, Result};
use std::sync::Arc;

/// Model used whenever the browser asks for web search.
pub const WEB_SEARCH_MODEL: &str = "perplexity/sonar";
const DEEPSEEK_REASONER_ALIAS: &str = "deepseek/deepseek-r1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    DeepSeek,
    OpenRouter,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::DeepSeek => "DeepSeek",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub provider: Provider,
    /// Model id as the provider knows it.
    pub model: String,
}

/// Pick the provider and provider-side model id for a browser model id.
pub fn route(model: &str, web_search: bool) -> Route {
    if web_search {
        return Route {
            provider: Provider::OpenRouter,
            model: WEB_SEARCH_MODEL.to_string(),
        };
    }

    if model == DEEPSEEK_REASONER_ALIAS {
        return Route {
            provider: Provider::DeepSeek,
            model: "deepseek-reasoner".to_string(),
        };
    }

    if model == "deepseek" {
        return Route {
            provider: Provider::DeepSeek,
            model: "deepseek-chat".to_string(),
        };
    }

    if let Some(name) = model.strip_prefix("deepseek/") {
        return Route {
            provider: Provider::DeepSeek,
            model: if name.is_empty() { "deepseek-chat" } else { name }.to_string(),
        };
    }

    if let Some(name) = model.strip_prefix("openai/") {
        return Route {
            provider: Provider::OpenAi,
            model: name.to_string(),
        };
    }

    Route {
        provider: Provider::OpenRouter,
        model: model.to_string(),
    }
}

/// The configured provider clients. A provider without an API key is absent.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    openai: Option<Arc<dyn ChatService>>,
    deepseek: Option<Arc<dyn ChatService>>,
    openrouter: Option<Arc<dyn ChatService>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let build = |provider: Provider, cfg: &ProviderConfig| {
            cfg.api_key.as_ref().map(|key| {
                tracing::info!("{} provider enabled ({})", provider.name(), cfg.base_url);
                Arc::new(OpenAiCompatClient::new_with_client(
                    provider.name(),
                    key.clone(),
                    cfg.base_url.clone(),
                    http_client.clone(),
                )) as Arc<dyn ChatService>
            })
        };

        Self {
            openai: build(Provider::OpenAi, &config.openai),
            deepseek: build(Provider::DeepSeek, &config.deepseek),
            openrouter: build(Provider::OpenRouter, &config.openrouter),
        }
    }

    pub fn with_service(mut self, provider: Provider, service: Arc<dyn ChatService>) -> Self {
        let slot = match provider {
            Provider::OpenAi => &mut self.openai,
            Provider::DeepSeek => &mut self.deepseek,
            Provider::OpenRouter => &mut self.openrouter,
        };
        *slot = Some(service);
        self
    }

    pub fn get(&self, provider: Provider) -> Result<Arc<dyn ChatService>> {
        let slot = match provider {
            Provider::OpenAi => &self.openai,
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenRouter => &self.openrouter,
        };
        slot.clone().ok_or_else(|| {
            Error::Config(format!(
                "{} is not configured ({} is not set)",
                provider.name(),
                provider.key_var()
            ))
        })
    }

    /// Route `model` and start a streamed completion on the chosen provider.
    pub async fn stream(
        &self,
        model: &str,
        web_search: bool,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatDeltaStream> {
        let route = route(model, web_search);
        tracing::info!(
            "Routing model '{}' to {} (model: {})",
            model,
            route.provider.name(),
            route.model
        );
        let service = self.get(route.provider)?;
        service.stream_chat(&route.model, messages).await
    }
}

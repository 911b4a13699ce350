//! Environment configuration.
//!
//! Secrets are optional at startup: a missing key only fails the requests that
//! need it, and the failure is reported inside the response stream.

use crate::{Error, Result};

pub const DEFAULT_COZE_WORKFLOW_URL: &str = "https://api.coze.cn/v1/workflow/run";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TRANSLATION_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CozeConfig {
    pub api_key: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_url: String,
    pub user_name: String,
    pub user_input: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CdnConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub coze: CozeConfig,
    pub openai: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub translation_model: String,
    pub upload_max_bytes: usize,
    /// `None` when no storage credentials are configured.
    pub cdn: Option<CdnConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let upload_max_bytes = match var("UPLOAD_MAX_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                Error::Config(format!(
                    "UPLOAD_MAX_BYTES must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_UPLOAD_MAX_BYTES,
        };

        let cdn = match (var("CDN_ACCESS_KEY_ID"), var("CDN_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(CdnConfig {
                access_key_id,
                secret_access_key,
                endpoint: var("CDN_ENDPOINT")
                    .unwrap_or_else(|| "https://nyc3.digitaloceanspaces.com".to_string()),
                bucket: var("CDN_BUCKET").unwrap_or_else(|| "palmreading".to_string()),
                base_url: var("CDN_BASE_URL")
                    .unwrap_or_else(|| "https://cdn.palmreading.app".to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(Error::Config(
                    "CDN_ACCESS_KEY_ID and CDN_SECRET_ACCESS_KEY must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            coze: CozeConfig {
                api_key: var("COZE_API_KEY"),
                workflow_id: var("COZE_WORKFLOW_ID"),
                workflow_url: var("COZE_WORKFLOW_URL")
                    .unwrap_or_else(|| DEFAULT_COZE_WORKFLOW_URL.to_string()),
                user_name: var("COZE_USER_NAME").unwrap_or_else(|| "guest".to_string()),
                user_input: var("COZE_USER_INPUT"),
            },
            openai: ProviderConfig {
                api_key: var("OPENAI_API_KEY"),
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            deepseek: ProviderConfig {
                api_key: var("DEEPSEEK_API_KEY"),
                base_url: var("DEEPSEEK_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DEEPSEEK_BASE_URL.to_string()),
            },
            openrouter: ProviderConfig {
                api_key: var("OPENROUTER_API_KEY"),
                base_url: var("OPENROUTER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            },
            translation_model: var("TRANSLATION_MODEL")
                .unwrap_or_else(|| DEFAULT_TRANSLATION_MODEL.to_string()),
            upload_max_bytes,
            cdn,
        })
    }
}

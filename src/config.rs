//! Configuration for the dispatch engine and the built-in providers

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::failover::RetryPolicy;
use crate::ProviderKind;

/// Settings for one built-in provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig
{   /// Which built-in provider this configures
    pub kind: ProviderKind
  , /// API key, if the backend needs one
    #[serde(default)]
    pub api_key: Option<String>
  , /// API base URL (if custom)
    #[serde(default)]
    pub api_base: Option<String>
  , /// Model used when a request names none
    #[serde(default)]
    pub default_model: Option<String>
  , /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
  , /// Models known before discovery runs
    #[serde(default)]
    pub models: Vec<String>
}

impl ProviderConfig
{   pub fn new(kind: ProviderKind) -> Self
    {   ProviderConfig
        {   kind
          , ..Default::default()
        }
    }

    /// Fill the key and base URL from the kind's conventional variable
    pub fn from_env(kind: ProviderKind) -> Self
    {   let mut config = ProviderConfig::new(kind);
        match kind
        {   ProviderKind::OpenAi => {
              config.api_key = std::env::var("OPENAI_API_KEY").ok();
            }
          , ProviderKind::Anthropic => {
              config.api_key = std::env::var("ANTHROPIC_API_KEY").ok();
            }
          , ProviderKind::MistralAi => {
              config.api_key = std::env::var("MISTRAL_API_KEY").ok();
            }
          , ProviderKind::Ollama => {
              config.api_base = std::env::var("OLLAMA_HOST").ok();
            }
        }
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self
    {   self.api_base = Some(base.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self
    {   self.default_model = Some(model.into());
        self
    }
}

/// Dispatch engine configuration, immutable once handed to the factory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryConfig
{   /// Provider used when the request expresses no intent
    #[serde(default)]
    pub default_provider: Option<String>
  , /// Provider tried once after the primary exhausts its retries
    #[serde(default)]
    pub fallback_provider: Option<String>
  , /// Preference order consulted when no default is registered
    #[serde(default)]
    pub provider_order: Option<Vec<String>>
  , /// Additional attempts on the selected provider
    #[serde(default)]
    pub retries: u32
  , /// Wait between those attempts
    #[serde(default)]
    pub retry_backoff: RetryPolicy
  , /// Settings for the built-in provider set
    #[serde(default)]
    pub providers: Vec<ProviderConfig>
}

impl FactoryConfig
{   pub fn new() -> Self
    {   FactoryConfig::default()
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self>
    {   serde_json::from_str(json).map_err(|e| {
          Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self>
    {   let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
          Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })?;
        Self::from_json_str(&text)
    }

    pub fn with_default_provider(mut self, id: impl Into<String>) -> Self
    {   self.default_provider = Some(id.into());
        self
    }

    pub fn with_fallback_provider(mut self, id: impl Into<String>) -> Self
    {   self.fallback_provider = Some(id.into());
        self
    }

    pub fn with_provider_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>
      , S: Into<String>
    {   self.provider_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self
    {   self.retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, policy: RetryPolicy) -> Self
    {   self.retry_backoff = policy;
        self
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self
    {   self.providers.push(provider);
        self
    }

    /// Settings for `kind`: the explicit entry, else the environment
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig
    {   self.providers
          .iter()
          .find(|p| p.kind == kind)
          .cloned()
          .unwrap_or_else(|| ProviderConfig::from_env(kind))
    }
}

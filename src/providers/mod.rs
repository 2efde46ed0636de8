//! LLM provider contract and the built-in implementations

pub mod anthropic;
pub mod http;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::config::FactoryConfig;
use crate::error::Result;
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use crate::ProviderKind;

pub use anthropic::AnthropicProvider;
pub use http::HttpTransport;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Uniform request/response capability for one backend.
///
/// Implementations are shared across concurrent dispatches and must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait Provider: Send + Sync
{   /// Unique registry key
    fn provider_id(&self) -> &str;

    /// Human-readable name
    fn provider_name(&self) -> &str;

    /// Currently known model identifiers
    fn supported_models(&self) -> Vec<String>;

    fn is_model_supported(&self, model_id: &str) -> bool
    {   self.supported_models().iter().any(|m| m == model_id)
    }

    /// Run one generation call.
    ///
    /// Ordinary failures (auth, network, unknown model) come back as a
    /// response with `success: false`, never as a panic.
    async fn process(&self, request: &GenerationRequest) -> GenerationResponse;

    /// Cheap reachability/auth check
    async fn test_connection(&self) -> Result<bool>;

    /// Refresh the known models. On error the previous list is kept.
    async fn discover_models(&self) -> Result<Vec<String>>;
}

/// Model list that only changes when a discovery succeeds
#[derive(Debug, Default)]
pub struct ModelCatalog
{   models: RwLock<Vec<String>>
}

impl ModelCatalog
{   pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>
      , S: Into<String>
    {   let catalog = ModelCatalog::default();
        catalog.replace(models.into_iter().map(Into::into).collect());
        catalog
    }

    pub fn models(&self) -> Vec<String>
    {   self.models
          .read()
          .unwrap_or_else(|poisoned| poisoned.into_inner())
          .clone()
    }

    pub fn contains(&self, model_id: &str) -> bool
    {   self.models
          .read()
          .unwrap_or_else(|poisoned| poisoned.into_inner())
          .iter()
          .any(|m| m == model_id)
    }

    /// Install a discovery result, dropping repeats but keeping order
    pub fn replace(&self, discovered: Vec<String>)
    {   let mut unique: Vec<String> = Vec::with_capacity(discovered.len());
        for model in discovered
        {   if !unique.contains(&model)
            {   unique.push(model);
            }
        }
        *self.models
          .write()
          .unwrap_or_else(|poisoned| poisoned.into_inner()) = unique;
    }

    /// Apply a discovery outcome; a failure leaves the list untouched
    pub fn apply(&self, outcome: Result<Vec<String>>) -> Result<Vec<String>>
    {   let discovered = outcome?;
        self.replace(discovered);
        Ok(self.models())
    }
}

/// Normalized output of one successful backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion
{   pub model: String
  , pub text: String
  , pub usage: Option<TokenUsage>
}

/// Fold a transport outcome into the response shape callers see
pub fn into_response(
  provider_id: &str
, outcome: Result<Completion>
) -> GenerationResponse
{   match outcome
    {   Ok(completion) => {
          let response = GenerationResponse::success(
            provider_id
          , completion.model
          , completion.text
          );
          match completion.usage
          {   Some(usage) => response.with_tokens(usage)
            , None => response
          }
        }
      , Err(e) => GenerationResponse::failure(provider_id, e.to_string())
    }
}

/// Construct the built-in provider for `kind` from the factory settings
pub fn build_provider(
  kind: ProviderKind
, config: &FactoryConfig
) -> Result<Arc<dyn Provider>>
{   let settings = config.provider_config(kind);
    let provider: Arc<dyn Provider> = match kind
    {   ProviderKind::OpenAi => Arc::new(OpenAiProvider::openai(settings)?)
      , ProviderKind::MistralAi => Arc::new(OpenAiProvider::mistral(settings)?)
      , ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings)?)
      , ProviderKind::Ollama => Arc::new(OllamaProvider::new(settings)?)
    };
    Ok(provider)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::error::Error;

    #[test]
    fn failed_discovery_keeps_previous_models()
    {   let catalog = ModelCatalog::new(["m1", "m2"]);
        let outcome = catalog.apply(Err(Error::Timeout));
        assert_eq!(outcome, Err(Error::Timeout));
        assert_eq!(catalog.models(), vec!["m1", "m2"]);
    }

    #[test]
    fn completion_usage_is_carried_into_response()
    {   let completion = Completion
        {   model: "m1".into()
          , text: "hi".into()
          , usage: Some(TokenUsage
            {   input_tokens: 7
              , output_tokens: 5
            })
        };
        let response = into_response("p", Ok(completion));
        assert!(response.success);
        let usage = response.tokens_used.expect("usage");
        assert_eq!(usage.total(), 12);

        let bare = Completion
        {   model: "m1".into()
          , text: "hi".into()
          , usage: None
        };
        assert_eq!(into_response("p", Ok(bare)).tokens_used, None);
    }

    #[test]
    fn successful_discovery_replaces_and_dedups()
    {   let catalog = ModelCatalog::new(["old"]);
        let models = catalog
          .apply(Ok(vec!["b".into(), "a".into(), "b".into()]))
          .expect("discovery");
        assert_eq!(models, vec!["b", "a"]);
        assert!(!catalog.contains("old"));
        assert!(catalog.contains("a"));
    }
}

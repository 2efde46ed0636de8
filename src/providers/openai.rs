//! OpenAI-compatible chat completions (OpenAI, Mistral)

use async_trait::async_trait;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

use super::{into_response, Completion, HttpTransport, ModelCatalog, Provider};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , pub stream: bool
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   #[serde(default)]
    pub model: Option<String>
  , pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: u64
  , #[serde(default)]
    pub completion_tokens: u64
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse
{   pub data: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelData
{   pub id: String
}

/// Build the wire message list: system prompt first, then history, then prompt
pub fn chat_messages(request: &GenerationRequest) -> Vec<ChatMessage>
{   let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(system) = &request.system_prompt
    {   messages.push(ChatMessage
        {   role: "system".to_string()
          , content: system.clone()
        });
    }
    messages.extend(request.conversation().into_iter().map(|m| {
      ChatMessage
      {   role: m.role.as_str().to_string()
        , content: m.content
      }
    }));
    messages
}

// ===== Provider =====

/// Provider speaking the `/chat/completions` dialect
pub struct OpenAiProvider
{   id: &'static str
  , name: &'static str
  , api_key: Option<String>
  , default_model: String
  , transport: HttpTransport
  , catalog: ModelCatalog
}

impl OpenAiProvider
{   pub fn openai(config: ProviderConfig) -> Result<Self>
    {   Self::build("openai", "OpenAI", OPENAI_API_BASE, "gpt-4o-mini", config)
    }

    pub fn mistral(config: ProviderConfig) -> Result<Self>
    {   Self::build(
          "mistral"
        , "Mistral AI"
        , MISTRAL_API_BASE
        , "mistral-small-latest"
        , config
        )
    }

    fn build(
      id: &'static str
    , name: &'static str
    , default_base: &str
    , default_model: &str
    , config: ProviderConfig
    ) -> Result<Self>
    {   debug!("Creating {} provider", name);
        let base = config.api_base
          .clone()
          .unwrap_or_else(|| default_base.to_string());
        let mut transport = HttpTransport::new(base, config.timeout_secs)?;
        if let Some(key) = &config.api_key
        {   transport = transport.with_bearer(key)?;
        }
        Ok(OpenAiProvider
        {   id
          , name
          , api_key: config.api_key
          , default_model: config.default_model
              .unwrap_or_else(|| default_model.to_string())
          , transport
          , catalog: ModelCatalog::new(config.models)
        })
    }

    fn require_key(&self) -> Result<()>
    {   if self.api_key.is_none()
        {   error!("No API key for {}", self.name);
            return Err(Error::MissingApiKey(self.name.to_string()));
        }
        Ok(())
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<Completion>
    {   self.require_key()?;
        let model = request.model_id
          .clone()
          .unwrap_or_else(|| self.default_model.clone());

        let body = ChatRequest
        {   model: model.clone()
          , messages: chat_messages(request)
          , max_tokens: request.max_tokens
          , temperature: request.temperature
          , stream: false
        };

        let response: ChatResponse = self.transport
          .post_json("/chat/completions", &body)
          .await?;
        trace!("{} finish reason: {:?}"
          , self.name
          , response.choices.first().and_then(|c| c.finish_reason.clone())
          );

        let text = response.choices
          .into_iter()
          .next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or_else(|| {
            error!("No choices in response");
            Error::NoChoicesInResponse
          })?;

        Ok(Completion
        {   model: response.model.unwrap_or(model)
          , text
          , usage: response.usage.map(|u| TokenUsage
            {   input_tokens: u.prompt_tokens
              , output_tokens: u.completion_tokens
            })
        })
    }

    async fn list_models(&self) -> Result<Vec<String>>
    {   self.require_key()?;
        let response: ModelsResponse = self.transport
          .get_json("/models")
          .await?;
        let model_names: Vec<String> = response.data
          .into_iter()
          .map(|m| m.id)
          .collect();
        debug!("Retrieved {} models from {}", model_names.len(), self.name);
        Ok(model_names)
    }
}

#[async_trait]
impl Provider for OpenAiProvider
{   fn provider_id(&self) -> &str
    {   self.id
    }

    fn provider_name(&self) -> &str
    {   self.name
    }

    fn supported_models(&self) -> Vec<String>
    {   self.catalog.models()
    }

    fn is_model_supported(&self, model_id: &str) -> bool
    {   self.catalog.contains(model_id)
    }

    async fn process(&self, request: &GenerationRequest) -> GenerationResponse
    {   into_response(self.id, self.complete(request).await)
    }

    async fn test_connection(&self) -> Result<bool>
    {   if self.api_key.is_none()
        {   return Ok(false);
        }
        self.list_models().await.map(|_| true)
    }

    async fn discover_models(&self) -> Result<Vec<String>>
    {   self.catalog.apply(self.list_models().await)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::request::Message;

    #[test]
    fn system_prompt_leads_and_history_keeps_order()
    {   let request = GenerationRequest::new("third")
          .with_system_prompt("be brief")
          .with_history(vec![
            Message::user("first")
          , Message::assistant("second")
          ]);
        let messages = chat_messages(&request);
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(contents, vec!["be brief", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network()
    {   let provider = OpenAiProvider::openai(ProviderConfig::default())
          .expect("provider");
        let response = provider.process(&GenerationRequest::new("hi")).await;
        assert!(!response.success);
        assert_eq!(response.provider_id, "openai");
        assert!(matches!(provider.test_connection().await, Ok(false)));
    }
}

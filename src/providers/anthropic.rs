//! Anthropic messages API

use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{into_response, Completion, HttpTransport, ModelCatalog, Provider};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResponse, Role, TokenUsage};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest
{   model: String
  , messages: Vec<WireMessage>
  , max_tokens: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
}

#[derive(Debug, Serialize)]
struct WireMessage
{   role: &'static str
  , content: String
}

#[derive(Debug, Deserialize)]
struct MessagesResponse
{   model: String
  , content: Vec<ContentBlock>
  , #[serde(default)]
    usage: Option<WireUsage>
}

#[derive(Debug, Deserialize)]
struct ContentBlock
{   #[serde(default)]
    text: Option<String>
}

#[derive(Debug, Deserialize)]
struct WireUsage
{   input_tokens: u64
  , output_tokens: u64
}

#[derive(Debug, Deserialize)]
struct ModelsResponse
{   data: Vec<ModelData>
}

#[derive(Debug, Deserialize)]
struct ModelData
{   id: String
}

/// Split a request into the `system` field and user/assistant turns.
/// System turns found in history are folded into the system field.
fn split_system(request: &GenerationRequest) -> (Option<String>, Vec<WireMessage>)
{   let mut system: Vec<String> = request.system_prompt.iter().cloned().collect();
    let mut messages = Vec::with_capacity(request.history.len() + 1);
    for turn in request.conversation()
    {   match turn.role
        {   Role::System => system.push(turn.content)
          , Role::User => messages.push(WireMessage
            {   role: "user"
              , content: turn.content
            })
          , Role::Assistant => messages.push(WireMessage
            {   role: "assistant"
              , content: turn.content
            })
        }
    }
    let system = if system.is_empty() { None } else { Some(system.join("\n\n")) };
    (system, messages)
}

pub struct AnthropicProvider
{   api_key: Option<String>
  , default_model: String
  , transport: HttpTransport
  , catalog: ModelCatalog
}

impl AnthropicProvider
{   pub fn new(config: ProviderConfig) -> Result<Self>
    {   debug!("Creating Anthropic provider");
        let base = config.api_base
          .clone()
          .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string());
        let mut transport = HttpTransport::new(base, config.timeout_secs)?
          .with_header("anthropic-version", API_VERSION)?;
        if let Some(key) = &config.api_key
        {   transport = transport.with_header("x-api-key", key)?;
        }
        Ok(AnthropicProvider
        {   api_key: config.api_key
          , default_model: config.default_model
              .unwrap_or_else(|| DEFAULT_MODEL.to_string())
          , transport
          , catalog: ModelCatalog::new(config.models)
        })
    }

    fn require_key(&self) -> Result<()>
    {   if self.api_key.is_none()
        {   error!("No API key for Anthropic");
            return Err(Error::MissingApiKey("Anthropic".to_string()));
        }
        Ok(())
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<Completion>
    {   self.require_key()?;
        let (system, messages) = split_system(request);
        let body = MessagesRequest
        {   model: request.model_id
              .clone()
              .unwrap_or_else(|| self.default_model.clone())
          , messages
          , max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
          , system
          , temperature: request.temperature
        };

        let response: MessagesResponse = self.transport
          .post_json("/v1/messages", &body)
          .await?;

        let text = response.content
          .iter()
          .filter_map(|block| block.text.as_deref())
          .collect::<Vec<_>>()
          .join("");

        Ok(Completion
        {   model: response.model
          , text
          , usage: response.usage.map(|u| TokenUsage
            {   input_tokens: u.input_tokens
              , output_tokens: u.output_tokens
            })
        })
    }

    async fn list_models(&self) -> Result<Vec<String>>
    {   self.require_key()?;
        let response: ModelsResponse = self.transport
          .get_json("/v1/models")
          .await?;
        Ok(response.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl Provider for AnthropicProvider
{   fn provider_id(&self) -> &str
    {   "anthropic"
    }

    fn provider_name(&self) -> &str
    {   "Anthropic"
    }

    fn supported_models(&self) -> Vec<String>
    {   self.catalog.models()
    }

    fn is_model_supported(&self, model_id: &str) -> bool
    {   self.catalog.contains(model_id)
    }

    async fn process(&self, request: &GenerationRequest) -> GenerationResponse
    {   into_response("anthropic", self.complete(request).await)
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
    fn history_system_turns_fold_into_system_field()
    {   let request = GenerationRequest::new("go")
          .with_system_prompt("rule one")
          .with_history(vec![
            Message::system("rule two")
          , Message::user("hello")
          , Message::assistant("hi")
          ]);
        let (system, messages) = split_system(&request);
        assert_eq!(system.as_deref(), Some("rule one\n\nrule two"));
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }
}

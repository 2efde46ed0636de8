//! Local inference server speaking the Ollama HTTP API

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::openai::{chat_messages, ChatMessage};
use super::{into_response, Completion, HttpTransport, ModelCatalog, Provider};
use crate::config::ProviderConfig;
use crate::error::Result;
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};

const OLLAMA_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";
/// Local models can be slow to load on first use
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize)]
struct ChatRequest
{   model: String
  , messages: Vec<ChatMessage>
  , stream: bool
  , #[serde(skip_serializing_if = "Options::is_empty")]
    options: Options
}

#[derive(Debug, Default, Serialize)]
struct Options
{   #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>
}

impl Options
{   fn is_empty(&self) -> bool
    {   self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse
{   model: String
  , message: ChatMessage
  , #[serde(default)]
    prompt_eval_count: Option<u64>
  , #[serde(default)]
    eval_count: Option<u64>
}

#[derive(Debug, Deserialize)]
struct TagsResponse
{   models: Vec<Tag>
}

#[derive(Debug, Deserialize)]
struct Tag
{   name: String
}

pub struct OllamaProvider
{   default_model: String
  , transport: HttpTransport
  , catalog: ModelCatalog
}

impl OllamaProvider
{   pub fn new(config: ProviderConfig) -> Result<Self>
    {   let base = config.api_base
          .clone()
          .unwrap_or_else(|| OLLAMA_API_BASE.to_string());
        debug!("Creating Ollama provider at {}", base);
        let transport = HttpTransport::new(
          base
        , Some(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
        )?;
        Ok(OllamaProvider
        {   default_model: config.default_model
              .unwrap_or_else(|| DEFAULT_MODEL.to_string())
          , transport
          , catalog: ModelCatalog::new(config.models)
        })
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<Completion>
    {   let body = ChatRequest
        {   model: request.model_id
              .clone()
              .unwrap_or_else(|| self.default_model.clone())
          , messages: chat_messages(request)
          , stream: false
          , options: Options
            {   temperature: request.temperature
              , num_predict: request.max_tokens
            }
        };

        let response: ChatResponse = self.transport
          .post_json("/api/chat", &body)
          .await?;

        let usage = match (response.prompt_eval_count, response.eval_count)
        {   (None, None) => None
          , (input, output) => Some(TokenUsage
            {   input_tokens: input.unwrap_or(0)
              , output_tokens: output.unwrap_or(0)
            })
        };

        Ok(Completion
        {   model: response.model
          , text: response.message.content
          , usage
        })
    }

    async fn list_models(&self) -> Result<Vec<String>>
    {   let response: TagsResponse = self.transport
          .get_json("/api/tags")
          .await?;
        Ok(response.models.into_iter().map(|t| t.name).collect())
    }
}

#[async_trait]
impl Provider for OllamaProvider
{   fn provider_id(&self) -> &str
    {   "ollama"
    }

    fn provider_name(&self) -> &str
    {   "Ollama"
    }

    fn supported_models(&self) -> Vec<String>
    {   self.catalog.models()
    }

    fn is_model_supported(&self, model_id: &str) -> bool
    {   self.catalog.contains(model_id)
    }

    async fn process(&self, request: &GenerationRequest) -> GenerationResponse
    {   into_response("ollama", self.complete(request).await)
    }

    async fn test_connection(&self) -> Result<bool>
    {   self.list_models().await.map(|_| true)
    }

    async fn discover_models(&self) -> Result<Vec<String>>
    {   self.catalog.apply(self.list_models().await)
    }
}

//! Unified request and response types for aifactory

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, NO_PROVIDER, NO_PROVIDERS_MESSAGE};

/// Metadata key naming the provider the caller would like to use
pub const PREFERRED_PROVIDER_KEY: &str = "preferredProvider";

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   User
  , Assistant
  , System
}

impl Role
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::User => "user"
          , Role::Assistant => "assistant"
          , Role::System => "system"
        }
    }
}

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   Message
        {   role
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Message::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self
    {   Message::new(Role::System, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level
{   Low
  , Medium
  , High
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference
{   Quality
  , Speed
  , Balanced
}

/// Advisory hints about how the result will be used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageContext
{   #[serde(default)]
    pub task_type: Option<String>
  , #[serde(default)]
    pub priority: Option<Level>
  , #[serde(default)]
    pub cost_sensitivity: Option<Level>
  , #[serde(default)]
    pub preference: Option<Preference>
}

/// One generation intent. Never mutated once handed to the factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest
{   pub prompt: String
  , #[serde(default)]
    pub model_id: Option<String>
  , #[serde(default)]
    pub temperature: Option<f32>
  , #[serde(default)]
    pub max_tokens: Option<u32>
  , #[serde(default)]
    pub system_prompt: Option<String>
  , /// Prior turns in conversation order
    #[serde(default)]
    pub history: Vec<Message>
  , #[serde(default)]
    pub metadata: HashMap<String, String>
  , #[serde(default)]
    pub usage_context: Option<UsageContext>
}

impl GenerationRequest
{   pub fn new(prompt: impl Into<String>) -> Self
    {   GenerationRequest
        {   prompt: prompt.into()
          , ..Default::default()
        }
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self
    {   self.model_id = Some(model_id.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self
    {   self.system_prompt = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self
    {   self.history = history;
        self
    }

    pub fn with_metadata(
      mut self
    , key: impl Into<String>
    , value: impl Into<String>
    ) -> Self
    {   self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_preferred_provider(self, provider_id: impl Into<String>) -> Self
    {   self.with_metadata(PREFERRED_PROVIDER_KEY, provider_id)
    }

    pub fn with_usage_context(mut self, context: UsageContext) -> Self
    {   self.usage_context = Some(context);
        self
    }

    pub fn preferred_provider(&self) -> Option<&str>
    {   self.metadata.get(PREFERRED_PROVIDER_KEY).map(String::as_str)
    }

    /// History followed by the prompt as the final user turn
    pub fn conversation(&self) -> Vec<Message>
    {   let mut messages = self.history.clone();
        messages.push(Message::user(self.prompt.clone()));
        messages
    }
}

/// Fields overlaid on the prompt by `AiFactory::generate`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions
{   pub model_id: Option<String>
  , pub temperature: Option<f32>
  , pub max_tokens: Option<u32>
  , pub system_prompt: Option<String>
  , pub history: Vec<Message>
  , pub metadata: HashMap<String, String>
  , pub usage_context: Option<UsageContext>
}

impl GenerateOptions
{   pub fn into_request(self, prompt: impl Into<String>) -> GenerationRequest
    {   GenerationRequest
        {   prompt: prompt.into()
          , model_id: self.model_id
          , temperature: self.temperature
          , max_tokens: self.max_tokens
          , system_prompt: self.system_prompt
          , history: self.history
          , metadata: self.metadata
          , usage_context: self.usage_context
        }
    }
}

/// Token accounting reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage
{   pub input_tokens: u64
  , pub output_tokens: u64
}

impl TokenUsage
{   pub fn total(&self) -> u64
    {   self.input_tokens + self.output_tokens
    }
}

/// Normalized result, built fresh for each request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse
{   pub success: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>
  , pub provider_id: String
  // Best-effort annotations below, never needed for correctness.
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<TokenUsage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>
  , #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>
  , #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>
}

impl GenerationResponse
{   pub fn success(
      provider_id: impl Into<String>
    , model_used: impl Into<String>
    , data: impl Into<String>
    ) -> Self
    {   GenerationResponse
        {   success: true
          , data: Some(data.into())
          , model_used: Some(model_used.into())
          , provider_id: provider_id.into()
          , ..Default::default()
        }
    }

    pub fn failure(
      provider_id: impl Into<String>
    , error: impl Into<String>
    ) -> Self
    {   GenerationResponse
        {   success: false
          , error: Some(error.into())
          , provider_id: provider_id.into()
          , ..Default::default()
        }
    }

    /// Failure produced by the dispatch layer before any provider ran
    pub fn no_providers() -> Self
    {   GenerationResponse::failure(NO_PROVIDER, NO_PROVIDERS_MESSAGE)
    }

    pub fn with_tokens(mut self, usage: TokenUsage) -> Self
    {   self.tokens_used = Some(usage);
        self
    }

    /// Convert into the generated text or a typed error
    pub fn into_result(self) -> Result<String, Error>
    {   if self.success
        {   return Ok(self.data.unwrap_or_default());
        }
        let message = self.error
          .unwrap_or_else(|| "Unknown error".to_string());
        if self.provider_id == NO_PROVIDER
        {   if message == NO_PROVIDERS_MESSAGE
            {   return Err(Error::NoProvidersAvailable);
            }
            return Err(Error::Dispatch(message));
        }
        Err(Error::ProviderFailure
        {   provider_id: self.provider_id
          , message
        })
    }
}

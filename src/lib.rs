pub mod error;
pub mod config;
pub mod diagnostics;
pub mod providers;
pub mod request;
pub mod registry;
pub mod selection;
pub mod failover;
pub mod decoration;
pub mod factory;
use serde::{Deserialize, Serialize};

/*

aifactory: one request shape for every LLM backend, cloud or local.

A factory owns a registry of providers checked once at startup. Each
request is routed to a single provider by a deterministic policy, retried
on failure, and optionally handed to a fallback provider.

aifactory/
├── src/
│   ├── lib.rs          # Re-exports and built-in provider kinds
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Factory and provider configuration
│   ├── diagnostics.rs  # Optional leveled diagnostic sink
│   ├── request.rs      # Unified request/response types
│   ├── registry.rs     # Provider registry
│   ├── selection.rs    # Provider selection policy
│   ├── failover.rs     # Retry and fallback
│   ├── decoration.rs   # Best-effort response annotations
│   ├── factory.rs      # Dispatch engine
│   └── providers/      # Provider contract and implementations
└── tests/

*/

pub use config::{FactoryConfig, ProviderConfig};
pub use diagnostics::{DiagnosticSink, LogSink};
pub use error::{Error, Result, NO_PROVIDERS_MESSAGE};
pub use factory::AiFactory;
pub use failover::RetryPolicy;
pub use providers::{ModelCatalog, Provider};
pub use registry::Registry;
pub use request::{
  GenerateOptions, GenerationRequest, GenerationResponse, Message, Role
, TokenUsage, UsageContext
};

/// Built-in provider kinds, checked in this order when the caller
/// supplies no explicit provider list.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind
{   /// OpenAI (GPT models)
    #[default]
    OpenAi
  , /// Anthropic (Claude models)
    Anthropic
  , /// Mistral AI, OpenAI-compatible API
    #[serde(rename = "mistral")]
    MistralAi
  , /// Local/self-hosted models served by Ollama
    Ollama
}

impl ProviderKind
{   pub const ALL: [ProviderKind; 4] = [
      ProviderKind::OpenAi
    , ProviderKind::Anthropic
    , ProviderKind::MistralAi
    , ProviderKind::Ollama
    ];

    /// Registry id used by the built-in provider of this kind
    pub fn provider_id(&self) -> &'static str
    {   match self
        {   ProviderKind::OpenAi => "openai"
          , ProviderKind::Anthropic => "anthropic"
          , ProviderKind::MistralAi => "mistral"
          , ProviderKind::Ollama => "ollama"
        }
    }
}

//! Dispatch engine: owns the registry and routes each request

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::config::FactoryConfig;
use crate::decoration::decorate;
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::{Result, NO_PROVIDER, NO_PROVIDERS_MESSAGE};
use crate::failover;
use crate::providers::{build_provider, Provider};
use crate::registry::Registry;
use crate::request::{GenerateOptions, GenerationRequest, GenerationResponse};
use crate::selection::select;
use crate::ProviderKind;

/// Unified entry point over every registered provider.
///
/// Construction only stores configuration. The registry is built on the
/// first call to [`AiFactory::ready`] (or by [`AiFactory::open`] /
/// [`AiFactory::spawn_ready`]) and is read-only from then on, so one
/// instance may serve many concurrent requests.
pub struct AiFactory
{   config: FactoryConfig
  , providers: Option<Vec<Arc<dyn Provider>>>
  , diagnostics: Diagnostics
  , registry: OnceCell<Registry>
}

impl AiFactory
{   pub fn new(config: FactoryConfig) -> Self
    {   AiFactory
        {   config
          , providers: None
          , diagnostics: Diagnostics::default()
          , registry: OnceCell::new()
        }
    }

    /// Check these providers instead of the built-in set
    pub fn with_providers(mut self, providers: Vec<Arc<dyn Provider>>) -> Self
    {   self.providers = Some(providers);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self
    {   self.diagnostics = Diagnostics::new(Some(sink));
        self
    }

    /// Build the registry before handing the factory back
    pub async fn open(self) -> Self
    {   self.ready().await;
        self
    }

    /// Start registry construction on a background task
    pub fn spawn_ready(self: &Arc<Self>) -> JoinHandle<()>
    {   let factory = Arc::clone(self);
        tokio::spawn(async move {
          factory.ready().await;
        })
    }

    pub fn config(&self) -> &FactoryConfig
    {   &self.config
    }

    /// Wait for the registry. Built once; later calls return the same one.
    pub async fn ready(&self) -> &Registry
    {   self.registry
          .get_or_init(|| self.build_registry())
          .await
    }

    async fn build_registry(&self) -> Registry
    {   let candidates = match &self.providers
        {   Some(explicit) => explicit.clone()
          , None => self.default_providers()
        };
        self.diagnostics.debug(|| {
          format!("Checking {} candidate providers", candidates.len())
        });
        let registry = Registry::build(candidates, &self.diagnostics).await;
        if registry.is_empty()
        {   self.diagnostics.warn(|| {
              "No provider passed its connection test".to_string()
            });
        } else
        {   self.diagnostics.info(|| {
              format!("Registry ready with {} providers: {:?}"
                , registry.len()
                , registry.ids()
                )
            });
        }
        registry
    }

    fn default_providers(&self) -> Vec<Arc<dyn Provider>>
    {   ProviderKind::ALL
          .iter()
          .filter_map(|kind| match build_provider(*kind, &self.config)
          {   Ok(provider) => Some(provider)
            , Err(e) => {
                self.diagnostics.warn(|| {
                  format!("Could not construct {:?} provider: {}", kind, e)
                });
                None
              }
          })
          .collect()
    }

    /// Serve one request. Never panics and never returns an error;
    /// failures come back as `success: false`.
    pub async fn process(&self, request: &GenerationRequest) -> GenerationResponse
    {   let started = Instant::now();
        match AssertUnwindSafe(self.dispatch(request))
          .catch_unwind()
          .await
        {   Ok(response) => decorate(response, request, started.elapsed())
          , Err(panic) => {
              let detail = failover::panic_message(panic.as_ref());
              self.diagnostics.error(|| format!("Dispatch panicked: {}", detail));
              GenerationResponse::failure(
                NO_PROVIDER
              , format!("Internal dispatch failure: {}", detail)
              )
            }
        }
    }

    async fn dispatch(&self, request: &GenerationRequest) -> GenerationResponse
    {   let registry = self.ready().await;
        let Some((provider, reason)) = select(request, registry, &self.config)
        else
        {   self.diagnostics.error(|| NO_PROVIDERS_MESSAGE.to_string());
            return GenerationResponse::no_providers();
        };
        self.diagnostics.debug(|| {
          format!("Selected {} ({:?})", provider.provider_id(), reason)
        });
        failover::execute(
          provider
        , request
        , registry
        , &self.config
        , &self.diagnostics
        ).await
    }

    /// Generate text for `prompt`, or fail with the provider's message
    pub async fn generate(
      &self
    , prompt: impl Into<String>
    , options: GenerateOptions
    ) -> Result<String>
    {   let request = options.into_request(prompt);
        self.process(&request).await.into_result()
    }

    pub async fn provider_ids(&self) -> Vec<String>
    {   self.ready().await.ids()
    }

    pub async fn provider(&self, provider_id: &str) -> Option<Arc<dyn Provider>>
    {   self.ready().await.get(provider_id).cloned()
    }

    pub async fn available_models(&self) -> Vec<String>
    {   self.ready().await.available_models()
    }

    pub async fn provider_for_model(&self, model_id: &str) -> Option<Arc<dyn Provider>>
    {   self.ready().await.provider_for_model(model_id).cloned()
    }

    /// Connection status of every registered provider, checked now
    pub async fn health(&self) -> HashMap<String, bool>
    {   self.ready().await.health().await
    }
}

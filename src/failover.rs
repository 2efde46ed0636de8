//! Retry and fallback around a selected provider

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FactoryConfig;
use crate::diagnostics::Diagnostics;
use crate::providers::Provider;
use crate::registry::Registry;
use crate::request::{GenerationRequest, GenerationResponse};

/// Backoff between retries of the same provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy
{   /// Wait before the first retry, in milliseconds; 0 retries immediately
    #[serde(default)]
    pub initial_backoff_ms: u64
  , /// Growth factor applied per retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f32
}

fn default_backoff_multiplier() -> f32
{   2.0
}

impl RetryPolicy
{   pub fn new(initial_backoff_ms: u64, backoff_multiplier: f32) -> Self
    {   RetryPolicy
        {   initial_backoff_ms
          , backoff_multiplier
        }
    }

    /// Wait before retry number `attempt` (0-based)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration
    {   let multiplier = self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(
          (self.initial_backoff_ms as f32 * multiplier) as u64
        )
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(0, default_backoff_multiplier())
    }
}

/// Call `provider` once, turning an escaped panic into a failure response
pub(crate) async fn invoke(
  provider: &Arc<dyn Provider>
, request: &GenerationRequest
, diagnostics: &Diagnostics
) -> GenerationResponse
{   match AssertUnwindSafe(provider.process(request))
      .catch_unwind()
      .await
    {   Ok(response) => response
      , Err(panic) => {
          let detail = panic_message(panic.as_ref());
          diagnostics.error(|| {
            format!("Provider {} panicked: {}", provider.provider_id(), detail)
          });
          GenerationResponse::failure(
            provider.provider_id()
          , format!("Provider {} failed unexpectedly: {}"
              , provider.provider_id()
              , detail
              )
          )
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String
{   if let Some(s) = panic.downcast_ref::<&str>()
    {   s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>()
    {   s.clone()
    } else
    {   "unknown panic".to_string()
    }
}

/// Primary attempt, `retries` further attempts, then at most one fallback
pub(crate) async fn execute(
  primary: &Arc<dyn Provider>
, request: &GenerationRequest
, registry: &Registry
, config: &FactoryConfig
, diagnostics: &Diagnostics
) -> GenerationResponse
{   let primary_id = primary.provider_id();
    let mut response = invoke(primary, request, diagnostics).await;

    let mut attempt = 0;
    while !response.success && attempt < config.retries
    {   let backoff = config.retry_backoff.backoff_for_attempt(attempt);
        attempt += 1;
        diagnostics.warn(|| {
          format!("Retrying {} ({}/{}): {}"
            , primary_id
            , attempt
            , config.retries
            , response.error.as_deref().unwrap_or("unknown error")
            )
        });
        if !backoff.is_zero()
        {   tokio::time::sleep(backoff).await;
        }
        response = invoke(primary, request, diagnostics).await;
    }

    if response.success
    {   return response;
    }

    let fallback = config
      .fallback_provider
      .as_deref()
      .filter(|id| *id != primary_id)
      .and_then(|id| registry.get(id));

    match fallback
    {   Some(fallback) => {
          diagnostics.warn(|| {
            format!("{} exhausted, falling back to {}"
              , primary_id
              , fallback.provider_id()
              )
          });
          invoke(fallback, request, diagnostics).await
        }
      , None => {
          diagnostics.error(|| {
            format!("{} failed: {}"
              , primary_id
              , response.error.as_deref().unwrap_or("unknown error")
              )
          });
          response
        }
    }
}

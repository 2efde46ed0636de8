//! Provider selection policy
//!
//! First match wins:
//! 1. `preferredProvider` metadata, when registered and able to serve the model
//! 2. first provider in registration order supporting the requested model
//! 3. the configured default provider
//! 4. first registered entry of the configured provider order
//! 5. first provider in registration order

use std::sync::Arc;

use crate::config::FactoryConfig;
use crate::providers::Provider;
use crate::registry::Registry;
use crate::request::GenerationRequest;

/// Why a provider was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason
{   PreferredProvider
  , ModelSupport
  , DefaultProvider
  , ProviderOrder
  , RegistrationOrder
}

/// Pick the provider for `request`, or `None` when nothing is registered
pub fn select<'r>(
  request: &GenerationRequest
, registry: &'r Registry
, config: &FactoryConfig
) -> Option<(&'r Arc<dyn Provider>, SelectionReason)>
{   let model_id = request.model_id.as_deref();

    if let Some(preferred) = request
      .preferred_provider()
      .and_then(|id| registry.get(id))
    {   if model_id.map_or(true, |m| preferred.is_model_supported(m))
        {   return Some((preferred, SelectionReason::PreferredProvider));
        }
    }

    if let Some(provider) = model_id.and_then(|m| registry.provider_for_model(m))
    {   return Some((provider, SelectionReason::ModelSupport));
    }

    if let Some(provider) = config
      .default_provider
      .as_deref()
      .and_then(|id| registry.get(id))
    {   return Some((provider, SelectionReason::DefaultProvider));
    }

    if let Some(provider) = config
      .provider_order
      .iter()
      .flatten()
      .find_map(|id| registry.get(id))
    {   return Some((provider, SelectionReason::ProviderOrder));
    }

    registry.first().map(|p| (p, SelectionReason::RegistrationOrder))
}

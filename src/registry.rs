//! Provider registry, built once and read-only afterwards

use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::providers::Provider;

/// Registered providers keyed by id, in registration order
#[derive(Clone, Default)]
pub struct Registry
{   entries: Vec<(String, Arc<dyn Provider>)>
}

impl fmt::Debug for Registry
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("Registry")
          .field("providers", &self.ids())
          .finish()
    }
}

impl Registry
{   pub fn new() -> Self
    {   Registry::default()
    }

    /// Admit each candidate that answers its connection test.
    ///
    /// Candidates are checked one after another in the given order. A
    /// failing check only skips that candidate.
    pub(crate) async fn build(
      candidates: Vec<Arc<dyn Provider>>
    , diagnostics: &Diagnostics
    ) -> Self
    {   let mut registry = Registry::new();
        for provider in candidates
        {   let id = provider.provider_id().to_string();

            match AssertUnwindSafe(provider.discover_models())
              .catch_unwind()
              .await
            {   Ok(Ok(models)) => diagnostics.debug(|| {
                  format!("{}: discovered {} models", id, models.len())
                })
              , Ok(Err(e)) => diagnostics.debug(|| {
                  format!("{}: model discovery failed: {}", id, e)
                })
              , Err(_) => diagnostics.warn(|| {
                  format!("{}: model discovery panicked", id)
                })
            }

            match AssertUnwindSafe(provider.test_connection())
              .catch_unwind()
              .await
            {   Ok(Ok(true)) => {
                  diagnostics.info(|| format!("Registered provider {}", id));
                  registry.insert(provider);
                }
              , Ok(Ok(false)) => diagnostics.warn(|| {
                  format!("Skipping provider {}: connection test failed", id)
                })
              , Ok(Err(e)) => diagnostics.warn(|| {
                  format!("Skipping provider {}: {}", id, e)
                })
              , Err(_) => diagnostics.error(|| {
                  format!("Skipping provider {}: connection test panicked", id)
                })
            }
        }
        registry
    }

    /// Register `provider`; an existing id is replaced in place
    pub fn insert(&mut self, provider: Arc<dyn Provider>)
    {   let id = provider.provider_id().to_string();
        match self.entries.iter_mut().find(|(key, _)| *key == id)
        {   Some(entry) => entry.1 = provider
          , None => self.entries.push((id, provider))
        }
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }

    pub fn contains(&self, provider_id: &str) -> bool
    {   self.get(provider_id).is_some()
    }

    pub fn get(&self, provider_id: &str) -> Option<&Arc<dyn Provider>>
    {   self.entries
          .iter()
          .find(|(key, _)| key == provider_id)
          .map(|(_, provider)| provider)
    }

    pub fn ids(&self) -> Vec<String>
    {   self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>>
    {   self.entries.iter().map(|(_, provider)| provider)
    }

    pub fn first(&self) -> Option<&Arc<dyn Provider>>
    {   self.providers().next()
    }

    /// Every known model across providers, first occurrence wins
    pub fn available_models(&self) -> Vec<String>
    {   let mut models: Vec<String> = Vec::new();
        for model in self.providers().flat_map(|p| p.supported_models())
        {   if !models.contains(&model)
            {   models.push(model);
            }
        }
        models
    }

    /// First provider, in registration order, that serves `model_id`
    pub fn provider_for_model(&self, model_id: &str) -> Option<&Arc<dyn Provider>>
    {   self.providers().find(|p| p.is_model_supported(model_id))
    }

    /// Check every provider now; nothing is cached
    pub async fn health(&self) -> HashMap<String, bool>
    {   let mut status = HashMap::with_capacity(self.entries.len());
        for (id, provider) in &self.entries
        {   let healthy = matches!(
              AssertUnwindSafe(provider.test_connection())
                .catch_unwind()
                .await
            , Ok(Ok(true))
            );
            status.insert(id.clone(), healthy);
        }
        status
    }
}

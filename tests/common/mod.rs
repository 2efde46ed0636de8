#![allow(dead_code)]

use aifactory::{
  DiagnosticSink, Error, GenerationRequest, GenerationResponse, ModelCatalog
, Provider, Result
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// Scripted provider that counts its calls
pub struct MockProvider
{   id: String
  , catalog: ModelCatalog
  , failures_before_success: usize
  , always_fail: bool
  , panics: bool
  , online: bool
  , discovery_fails: bool
  , discovered: Vec<String>
  , calls: AtomicUsize
  , connection_checks: AtomicUsize
  , last_request: Mutex<Option<GenerationRequest>>
}

impl MockProvider
{   pub fn new(id: &str) -> Self
    {   MockProvider
        {   id: id.to_string()
          , catalog: ModelCatalog::default()
          , failures_before_success: 0
          , always_fail: false
          , panics: false
          , online: true
          , discovery_fails: false
          , discovered: Vec::new()
          , calls: AtomicUsize::new(0)
          , connection_checks: AtomicUsize::new(0)
          , last_request: Mutex::new(None)
        }
    }

    pub fn models(self, models: &[&str]) -> Self
    {   self.catalog.replace(models.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Models returned by a successful discovery
    pub fn discovers(mut self, models: &[&str]) -> Self
    {   self.discovered = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn discovery_fails(mut self) -> Self
    {   self.discovery_fails = true;
        self
    }

    pub fn fail_times(mut self, n: usize) -> Self
    {   self.failures_before_success = n;
        self
    }

    pub fn always_fail(mut self) -> Self
    {   self.always_fail = true;
        self
    }

    pub fn panics(mut self) -> Self
    {   self.panics = true;
        self
    }

    pub fn offline(mut self) -> Self
    {   self.online = false;
        self
    }

    pub fn build(self) -> Arc<MockProvider>
    {   Arc::new(self)
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }

    pub fn connection_checks(&self) -> usize
    {   self.connection_checks.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest>
    {   self.last_request.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Provider for MockProvider
{   fn provider_id(&self) -> &str
    {   &self.id
    }

    fn provider_name(&self) -> &str
    {   &self.id
    }

    fn supported_models(&self) -> Vec<String>
    {   self.catalog.models()
    }

    fn is_model_supported(&self, model_id: &str) -> bool
    {   self.catalog.contains(model_id)
    }

    async fn process(&self, request: &GenerationRequest) -> GenerationResponse
    {   let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().expect("lock") = Some(request.clone());
        if self.panics
        {   panic!("{} blew up", self.id);
        }
        if self.always_fail || attempt <= self.failures_before_success
        {   return GenerationResponse::failure(
              &self.id
            , format!("{} failed attempt {}", self.id, attempt)
            );
        }
        let model = request.model_id
          .clone()
          .unwrap_or_else(|| format!("{}-default", self.id));
        GenerationResponse::success(
          &self.id
        , model
        , format!("{} says: {}", self.id, request.prompt)
        )
    }

    async fn test_connection(&self) -> Result<bool>
    {   self.connection_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.online)
    }

    async fn discover_models(&self) -> Result<Vec<String>>
    {   let outcome = if self.discovery_fails
        {   Err(Error::HttpError(format!("{} unreachable", self.id)))
        } else if self.discovered.is_empty()
        {   Ok(self.catalog.models())
        } else
        {   Ok(self.discovered.clone())
        };
        self.catalog.apply(outcome)
    }
}

/// Sink that records warn and error lines and ignores the rest
#[derive(Default)]
pub struct RecordingSink
{   pub lines: Mutex<Vec<String>>
}

impl RecordingSink
{   pub fn lines(&self) -> Vec<String>
    {   self.lines.lock().expect("lock").clone()
    }
}

impl DiagnosticSink for RecordingSink
{   fn warn(&self, message: &str)
    {   self.lines.lock().expect("lock").push(format!("warn: {}", message));
    }

    fn error(&self, message: &str)
    {   self.lines.lock().expect("lock").push(format!("error: {}", message));
    }
}

/// Sink whose debug level blows up once a provider has been selected
#[derive(Default)]
pub struct PanickingSink;

impl DiagnosticSink for PanickingSink
{   fn debug(&self, message: &str)
    {   if message.starts_with("Selected")
        {   panic!("sink exploded on: {}", message);
        }
    }
}

pub fn providers(mocks: &[&Arc<MockProvider>]) -> Vec<Arc<dyn Provider>>
{   mocks.iter().map(|m| Arc::clone(m) as Arc<dyn Provider>).collect()
}

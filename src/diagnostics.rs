//! Optional leveled diagnostic sink
//!
//! Every level has a no-op default, so an implementation may provide any
//! subset of them. A factory without a sink reports nothing.

use std::sync::Arc;

pub trait DiagnosticSink: Send + Sync
{   fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Forwards every level to the `log` facade
#[derive(Debug, Clone)]
pub struct LogSink
{   target: &'static str
}

impl LogSink
{   pub fn new() -> Self
    {   LogSink
        {   target: "aifactory"
        }
    }
}

impl Default for LogSink
{   fn default() -> Self
    {   LogSink::new()
    }
}

impl DiagnosticSink for LogSink
{   fn debug(&self, message: &str)
    {   log::debug!(target: self.target, "{}", message);
    }

    fn info(&self, message: &str)
    {   log::info!(target: self.target, "{}", message);
    }

    fn warn(&self, message: &str)
    {   log::warn!(target: self.target, "{}", message);
    }

    fn error(&self, message: &str)
    {   log::error!(target: self.target, "{}", message);
    }
}

/// Handle held by the factory; silent when no sink was supplied
#[derive(Clone, Default)]
pub(crate) struct Diagnostics
{   sink: Option<Arc<dyn DiagnosticSink>>
}

impl Diagnostics
{   pub(crate) fn new(sink: Option<Arc<dyn DiagnosticSink>>) -> Self
    {   Diagnostics
        {   sink
        }
    }

    pub(crate) fn debug(&self, message: impl FnOnce() -> String)
    {   if let Some(sink) = &self.sink
        {   sink.debug(&message());
        }
    }

    pub(crate) fn info(&self, message: impl FnOnce() -> String)
    {   if let Some(sink) = &self.sink
        {   sink.info(&message());
        }
    }

    pub(crate) fn warn(&self, message: impl FnOnce() -> String)
    {   if let Some(sink) = &self.sink
        {   sink.warn(&message());
        }
    }

    pub(crate) fn error(&self, message: impl FnOnce() -> String)
    {   if let Some(sink) = &self.sink
        {   sink.error(&message());
        }
    }
}

//! Best-effort annotations attached to successful responses.
//! Heuristic only; nothing downstream may depend on these values.

use std::time::Duration;

use crate::request::{GenerationRequest, GenerationResponse, Level, Preference};

/// Fill timing, confidence, capability and suggestion fields
pub fn decorate(
  mut response: GenerationResponse
, request: &GenerationRequest
, elapsed: Duration
) -> GenerationResponse
{   if !response.success
    {   return response;
    }
    let length = response.data.as_deref().map_or(0, str::len);
    let model = response.model_used.clone().unwrap_or_default().to_lowercase();

    response.processing_time_ms = Some(elapsed.as_millis() as u64);
    response.confidence = Some(confidence(length, elapsed));
    response.capabilities = capabilities(&model);
    response.suggestions = suggestions(&model, request, elapsed);
    response
}

fn confidence(length: usize, elapsed: Duration) -> f32
{   let mut score: f32 = 0.5;
    if length > 50
    {   score += 0.2;
    }
    if length > 500
    {   score += 0.1;
    }
    if length == 0
    {   score -= 0.3;
    }
    if elapsed > Duration::from_secs(30)
    {   score -= 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn capabilities(model: &str) -> Vec<String>
{   let mut found = Vec::new();
    if model.contains("gpt-4") || model.contains("opus") || model.contains("large")
    {   found.push("advanced reasoning");
    }
    if model.contains("claude")
    {   found.push("long context");
    }
    if model.contains("code") || model.contains("codestral")
    {   found.push("code generation");
    }
    if model.contains("vision") || model.contains("gpt-4o")
    {   found.push("vision");
    }
    if model.contains("llama") || model.contains("mistral") || model.contains("qwen")
    {   found.push("open weights");
    }
    if found.is_empty()
    {   found.push("text generation");
    }
    found.into_iter().map(String::from).collect()
}

fn suggestions(
  model: &str
, request: &GenerationRequest
, elapsed: Duration
) -> Vec<String>
{   let mut found = Vec::new();
    let context = request.usage_context.clone().unwrap_or_default();
    let premium = model.contains("gpt-4") || model.contains("opus");

    if premium && context.cost_sensitivity == Some(Level::High)
    {   found.push("Consider a smaller model for cost-sensitive work".to_string());
    }
    if context.preference == Some(Preference::Speed) && elapsed > Duration::from_secs(10)
    {   found.push("Consider a faster model or a local provider".to_string());
    }
    if context.preference == Some(Preference::Quality) && !premium
    {   found.push("Consider a flagship model for higher quality".to_string());
    }
    found
}

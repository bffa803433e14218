//! crates/course_forge_core/src/invoker.rs
//!
//! Wraps a `CompletionProvider` with the single-level fallback-model retry and
//! with JSON response parsing.

use crate::ports::{CompletionProvider, ModelRequest, ModelResponse, PortError, PortResult};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

//=========================================================================================
// The Invoker
//=========================================================================================

/// Sends model requests through a provider, retrying once on a fallback model.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn CompletionProvider>,
    fallback_model: Option<String>,
}

impl ModelInvoker {
    /// Creates a new `ModelInvoker`. An empty fallback name disables the retry.
    pub fn new(provider: Arc<dyn CompletionProvider>, fallback_model: Option<String>) -> Self {
        let fallback_model = fallback_model.filter(|m| !m.trim().is_empty());
        Self {
            provider,
            fallback_model,
        }
    }

    pub fn fallback_model(&self) -> Option<&str> {
        self.fallback_model.as_deref()
    }

    /// Performs the call. On a provider failure, if a fallback model is configured
    /// and differs from the model just tried, exactly one more attempt is made with
    /// the fallback substituted. The second failure is returned as is.
    pub async fn invoke(&self, request: ModelRequest) -> PortResult<ModelResponse> {
        let err = match self.provider.complete(&request).await {
            Ok(response) => return Ok(response),
            Err(err @ PortError::Provider(_)) => err,
            Err(other) => return Err(other),
        };

        let fallback = match self.fallback_model.as_deref() {
            Some(fallback) if fallback != request.model => fallback,
            _ => return Err(err),
        };

        warn!(
            failed_model = %request.model,
            fallback_model = %fallback,
            error = %err,
            "Model call failed, retrying with fallback model"
        );
        let retry = ModelRequest {
            model: fallback.to_string(),
            ..request
        };
        let response = self.provider.complete(&retry).await?;
        info!(model = %response.model_used, "Fallback model call succeeded");
        Ok(response)
    }

    /// Performs the call and parses the response content as JSON into `T`.
    pub async fn invoke_json<T: DeserializeOwned>(
        &self,
        request: ModelRequest,
    ) -> PortResult<(T, ModelResponse)> {
        let response = self.invoke(request).await?;
        let parsed = parse_json_response(&response.content)?;
        Ok((parsed, response))
    }
}

//=========================================================================================
// Response Parsing
//=========================================================================================

/// Removes a surrounding markdown code fence and any prose around the JSON body.
pub fn strip_json_wrapper(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the language tag line, then the closing fence.
        let body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
        let body = body.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        return body.trim();
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parses a model's JSON answer, tolerating code fences.
pub fn parse_json_response<T: DeserializeOwned>(content: &str) -> PortResult<T> {
    serde_json::from_str(strip_json_wrapper(content)).map_err(|e| PortError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_json_wrapper(input), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_generic_fence() {
        assert_eq!(strip_json_wrapper("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_strip_surrounding_prose() {
        let input = "Here is the course:\n{\"title\": \"x\"}\nHope this helps!";
        assert_eq!(strip_json_wrapper(input), "{\"title\": \"x\"}");
    }

    #[test]
    fn test_plain_json_untouched() {
        assert_eq!(strip_json_wrapper("  {\"a\":true} "), "{\"a\":true}");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result: PortResult<Value> = parse_json_response("not json at all");
        assert!(matches!(result, Err(PortError::Parse(_))));
    }
}

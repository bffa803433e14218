//! Tests for the model invocation client and its fallback retry.

mod common;

use common::ScriptedProvider;
use course_forge_core::ports::{ModelRequest, PortError, ResponseFormat};
use course_forge_core::ModelInvoker;
use serde_json::Value;

fn request(model: &str) -> ModelRequest {
    ModelRequest {
        system_prompt: Some("system".to_string()),
        user_prompt: "user".to_string(),
        model: model.to_string(),
        temperature: 0.5,
        max_tokens: 100,
        response_format: ResponseFormat::Json,
    }
}

#[tokio::test]
async fn test_primary_success_makes_one_call() {
    let provider = ScriptedProvider::new(|_| Ok("{}".to_string()));
    let invoker = ModelInvoker::new(provider.clone(), Some("model-b".to_string()));

    let response = invoker.invoke(request("model-a")).await.unwrap();
    assert_eq!(response.model_used, "model-a");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_fallback_model_used_after_provider_failure() {
    let provider = ScriptedProvider::new(|req| {
        if req.model == "model-a" {
            Err(PortError::Provider("503 Service Unavailable".to_string()))
        } else {
            Ok("{\"ok\": true}".to_string())
        }
    });
    let invoker = ModelInvoker::new(provider.clone(), Some("model-b".to_string()));

    let response = invoker.invoke(request("model-a")).await.unwrap();
    assert_eq!(response.model_used, "model-b");
    assert_eq!(provider.models_tried(), vec!["model-a", "model-b"]);

    // Everything but the model is carried over to the retry.
    let requests = provider.requests();
    assert_eq!(requests[0].user_prompt, requests[1].user_prompt);
    assert_eq!(requests[0].max_tokens, requests[1].max_tokens);
}

#[tokio::test]
async fn test_fallback_failure_propagates_without_third_attempt() {
    let provider =
        ScriptedProvider::new(|req| Err(PortError::Provider(format!("{} is down", req.model))));
    let invoker = ModelInvoker::new(provider.clone(), Some("model-b".to_string()));

    let err = invoker.invoke(request("model-a")).await.unwrap_err();
    assert_eq!(err, PortError::Provider("model-b is down".to_string()));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_no_retry_when_fallback_equals_attempted_model() {
    let provider = ScriptedProvider::new(|_| Err(PortError::Provider("down".to_string())));
    let invoker = ModelInvoker::new(provider.clone(), Some("model-a".to_string()));

    assert!(invoker.invoke(request("model-a")).await.is_err());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_no_retry_without_fallback() {
    let provider = ScriptedProvider::new(|_| Err(PortError::Provider("down".to_string())));
    let invoker = ModelInvoker::new(provider.clone(), Some("   ".to_string()));

    assert!(invoker.fallback_model().is_none());
    assert!(invoker.invoke(request("model-a")).await.is_err());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_non_provider_errors_are_not_retried() {
    let provider = ScriptedProvider::new(|_| Err(PortError::Unexpected("bad request".to_string())));
    let invoker = ModelInvoker::new(provider.clone(), Some("model-b".to_string()));

    let err = invoker.invoke(request("model-a")).await.unwrap_err();
    assert!(matches!(err, PortError::Unexpected(_)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_json_is_parse_error_and_not_retried() {
    let provider = ScriptedProvider::new(|_| Ok("Sorry, I can't help with that.".to_string()));
    let invoker = ModelInvoker::new(provider.clone(), Some("model-b".to_string()));

    let err = invoker
        .invoke_json::<Value>(request("model-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Parse(_)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_fenced_json_is_parsed() {
    let provider = ScriptedProvider::new(|_| Ok("```json\n{\"title\": \"Safety\"}\n```".to_string()));
    let invoker = ModelInvoker::new(provider, None);

    let (value, _) = invoker.invoke_json::<Value>(request("model-a")).await.unwrap();
    assert_eq!(value["title"], "Safety");
}

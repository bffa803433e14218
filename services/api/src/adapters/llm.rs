//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the generative text model.
//! It implements the `CompletionProvider` port from the `core` crate using the
//! OpenAI chat-completions API.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        ResponseFormat as OpenAiResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use course_forge_core::ports::{
    CompletionProvider, ModelRequest, ModelResponse, PortError, PortResult, ResponseFormat,
    TokenUsage,
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    fn build_messages(request: &ModelRequest) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = request.system_prompt.as_deref() {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_prompt.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ));
        Ok(messages)
    }
}

//=========================================================================================
// `CompletionProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionProvider for OpenAiCompletionAdapter {
    /// Sends one chat completion request for the model named in `request`.
    async fn complete(&self, request: &ModelRequest) -> PortResult<ModelResponse> {
        let messages = Self::build_messages(request)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .n(1);
        if request.response_format == ResponseFormat::Json {
            builder.response_format(OpenAiResponseFormat::JsonObject);
        }
        let chat_request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %request.model, prompt_chars = request.user_prompt.len(), "Calling model provider");

        // Any failure of the call itself is a provider error, which lets the core retry on a fallback model.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        let usage = response.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                PortError::Provider(format!(
                    "Model '{}' returned no text content.",
                    request.model
                ))
            })?;

        Ok(ModelResponse {
            content,
            model_used: response.model,
            usage,
        })
    }
}

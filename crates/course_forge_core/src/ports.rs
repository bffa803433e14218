//! crates/course_forge_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the boundary of the core crate.
//! The pipeline only talks to the outside world through these traits: a text
//! generation provider for outbound model calls, and a course repository standing
//! in for the external persistence collaborator.

use crate::domain::CourseContent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and by the pipeline itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The model provider returned a non-success status or no usable content.
    #[error("Model provider error: {0}")]
    Provider(String),
    /// The model claimed a structured response but it could not be parsed or validated.
    #[error("Failed to parse model response: {0}")]
    Parse(String),
    /// The caller's request was incomplete; raised before any model call.
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Model Request and Response Shapes
//=========================================================================================

/// The format the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json,
}

/// A provider-agnostic request for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub model_used: String,
    pub usage: Option<TokenUsage>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Performs exactly one outbound call for the model named in the request.
    ///
    /// Implementations must return `PortError::Provider` when the provider fails or
    /// the response carries no content, so the invoker can decide on a fallback.
    async fn complete(&self, request: &ModelRequest) -> PortResult<ModelResponse>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Looks up a previously saved course. Returns `PortError::NotFound` if absent.
    async fn find_course(&self, course_id: Uuid) -> PortResult<CourseContent>;

    /// Stores a generated course and returns its new id.
    async fn save_course(&self, course: &CourseContent) -> PortResult<Uuid>;
}

//! Shared test doubles for the pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use course_forge_core::domain::CourseContent;
use course_forge_core::ports::{
    CompletionProvider, CourseRepository, ModelRequest, ModelResponse, PortError, PortResult,
    TokenUsage,
};
use course_forge_core::PipelineConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ============================================================================
// Scripted completion provider
// ============================================================================

type Handler = dyn Fn(&ModelRequest) -> PortResult<String> + Send + Sync;

/// A provider that answers every request through a closure and records the
/// requests it received, in order.
pub struct ScriptedProvider {
    handler: Box<Handler>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ModelRequest) -> PortResult<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn models_tried(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    /// User prompts of all requests whose prompt contains `marker`.
    pub fn prompts_containing(&self, marker: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.user_prompt)
            .filter(|p| p.contains(marker))
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &ModelRequest) -> PortResult<ModelResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let content = (self.handler)(request)?;
        Ok(ModelResponse {
            content,
            model_used: request.model.clone(),
            usage: Some(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            }),
        })
    }
}

// ============================================================================
// In-memory course repository
// ============================================================================

#[derive(Default)]
pub struct MemoryRepository {
    courses: Mutex<HashMap<Uuid, CourseContent>>,
}

impl MemoryRepository {
    pub fn with_course(course: CourseContent) -> (Arc<Self>, Uuid) {
        let id = Uuid::new_v4();
        let repo = Self::default();
        repo.courses.lock().unwrap().insert(id, course);
        (Arc::new(repo), id)
    }
}

#[async_trait]
impl CourseRepository for MemoryRepository {
    async fn find_course(&self, course_id: Uuid) -> PortResult<CourseContent> {
        self.courses
            .lock()
            .unwrap()
            .get(&course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("course {}", course_id)))
    }

    async fn save_course(&self, course: &CourseContent) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        self.courses.lock().unwrap().insert(id, course.clone());
        Ok(id)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A config whose thresholds are small enough for hand-written documents:
/// anything over 200 characters takes the large-document path and chunks are
/// 300 characters wide.
pub fn small_config() -> PipelineConfig {
    PipelineConfig {
        max_context_tokens: 50,
        chunk_size_chars: 300,
        ..PipelineConfig::default()
    }
}

/// Pads `text` with filler words to exactly `len` characters.
pub fn section(text: &str, len: usize) -> String {
    let mut out = format!("{} ", text);
    while out.len() < len {
        out.push_str("lorem ipsum ");
    }
    out.truncate(len);
    out
}

/// Extracts the value following `label` on its line in a prompt.
pub fn prompt_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
}

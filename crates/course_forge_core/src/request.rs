//! crates/course_forge_core/src/request.rs
//!
//! Per-request configuration supplied by callers, the response envelope returned
//! by the public entry points, and the bookkeeping collected during one run.

use crate::domain::{CourseStatus, DifficultyLevel};
use crate::ports::{PortError, TokenUsage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_AUDIENCE: &str = "general learners";
pub const DEFAULT_PASSING_SCORE: u32 = 70;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

//=========================================================================================
// Caller Configuration
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseConfig {
    pub target_audience: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub auto_publish: Option<bool>,
}

impl CourseConfig {
    pub fn audience(&self) -> &str {
        self.target_audience
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_TARGET_AUDIENCE)
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty_level.unwrap_or_default()
    }

    pub fn status(&self) -> CourseStatus {
        if self.auto_publish.unwrap_or(false) {
            CourseStatus::Published
        } else {
            CourseStatus::Draft
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizConfig {
    pub max_questions: Option<usize>,
    pub time_limit_minutes: Option<u32>,
    pub title: Option<String>,
    pub passing_score_percentage: Option<u32>,
    pub max_attempts: Option<u32>,
    pub shuffle_questions: Option<bool>,
}

//=========================================================================================
// Run Bookkeeping
//=========================================================================================

/// A lesson or chunk whose contribution was left out of the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedUnit {
    /// Human-readable name of the unit, e.g. `lesson "Consent"` or `chunk 3`.
    pub unit: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub model_calls: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Which branch the orchestrator took for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPath {
    SinglePass,
    LargeDocument,
}

/// Mutable state owned by a single request. Never shared between runs.
#[derive(Debug, Default)]
pub struct RunStats {
    pub usage: UsageSummary,
    pub skipped: Vec<SkippedUnit>,
    pub path: Option<ProcessingPath>,
}

impl RunStats {
    pub fn record_call(&mut self, usage: Option<TokenUsage>) {
        self.usage.model_calls += 1;
        if let Some(u) = usage {
            self.usage.prompt_tokens += u.prompt_tokens;
            self.usage.completion_tokens += u.completion_tokens;
            self.usage.total_tokens += u.total_tokens;
        }
    }

    pub fn skip(&mut self, unit: impl Into<String>, error: &PortError) {
        self.skipped.push(SkippedUnit {
            unit: unit.into(),
            reason: error.to_string(),
        });
    }
}

//=========================================================================================
// Response Envelope
//=========================================================================================

/// What the public entry points return. They never return `Err`; failures are
/// reported as `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse<T> {
    Success(GenerationSuccess<T>),
    Failure(GenerationFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSuccess<T> {
    pub success: bool,
    pub data: T,
    pub path: Option<ProcessingPath>,
    pub usage: UsageSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailure {
    pub success: bool,
    pub error: String,
    /// Machine-readable category: provider, parse, validation, not_found or unexpected.
    pub kind: String,
}

impl<T> GenerationResponse<T> {
    pub fn from_result(result: Result<T, PortError>, stats: RunStats) -> Self {
        match result {
            Ok(data) => GenerationResponse::Success(GenerationSuccess {
                success: true,
                data,
                path: stats.path,
                usage: stats.usage,
                skipped: stats.skipped,
            }),
            Err(err) => GenerationResponse::Failure(GenerationFailure {
                success: false,
                kind: error_kind(&err).to_string(),
                error: err.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResponse::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            GenerationResponse::Success(s) => Some(&s.data),
            GenerationResponse::Failure(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            GenerationResponse::Success(s) => Some(s.data),
            GenerationResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationResponse::Success(_) => None,
            GenerationResponse::Failure(f) => Some(&f.error),
        }
    }
}

pub fn error_kind(err: &PortError) -> &'static str {
    match err {
        PortError::Provider(_) => "provider",
        PortError::Parse(_) => "parse",
        PortError::Validation(_) => "validation",
        PortError::NotFound(_) => "not_found",
        PortError::Unexpected(_) => "unexpected",
    }
}

//! crates/course_forge_core/src/config.rs
//!
//! Explicit configuration for the generation pipeline. The service crate builds
//! this from the environment; tests build it directly.

/// Size thresholds, model names and sampling settings used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub primary_model: String,
    /// Substituted once after a failed provider call. `None` disables the retry.
    pub fallback_model: Option<String>,
    /// Documents estimated above this many tokens take the large-document path.
    pub max_context_tokens: usize,
    /// Chunk width in characters on the large-document path.
    pub chunk_size_chars: usize,
    /// Number of leading chunks sampled when planning the outline.
    pub outline_sample_chunks: usize,
    /// Prefix of the selected chunk sent with each lesson request.
    pub lesson_source_chars: usize,
    pub default_max_questions: usize,
    pub default_lesson_minutes: u32,
    pub temperature: f32,
    /// Lower temperature for quiz extraction, which must stay close to the source.
    pub extraction_temperature: f32,
    pub course_max_tokens: u32,
    pub outline_max_tokens: u32,
    pub lesson_max_tokens: u32,
    pub quiz_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_model: "gpt-4o".to_string(),
            fallback_model: Some("gpt-4o-mini".to_string()),
            max_context_tokens: 120_000,
            chunk_size_chars: 80_000,
            outline_sample_chunks: 3,
            lesson_source_chars: 40_000,
            default_max_questions: 50,
            default_lesson_minutes: 15,
            temperature: 0.7,
            extraction_temperature: 0.2,
            course_max_tokens: 16_000,
            outline_max_tokens: 4_000,
            lesson_max_tokens: 6_000,
            quiz_max_tokens: 12_000,
        }
    }
}

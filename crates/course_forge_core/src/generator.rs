//! crates/course_forge_core/src/generator.rs
//!
//! The model-facing half of the pipeline: outline planning, per-lesson content
//! generation, per-chunk question extraction and the whole-document variants.
//! Each operation is a single JSON model call followed by validation.

use crate::chunker::truncate_chars;
use crate::config::PipelineConfig;
use crate::domain::{
    Chunk, CourseContent, Document, DocumentType, GeneratedLesson, LessonPlan, OutlineSkeleton,
    Question, QuizContent,
};
use crate::invoker::ModelInvoker;
use crate::ports::{ModelRequest, PortResult, ResponseFormat};
use crate::prompts;
use crate::request::{CourseConfig, QuizConfig, RunStats};
use crate::validation::{
    self, CourseDraft, LessonDraft, OutlineDraft, QuestionBatchDraft, QuizDraft,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Where a lesson sits in the course, for prompt context.
#[derive(Debug, Clone, Copy)]
pub struct LessonScope<'a> {
    pub course_title: &'a str,
    pub module_title: &'a str,
    pub config: &'a CourseConfig,
}

//=========================================================================================
// The Generator
//=========================================================================================

/// Issues structured model calls and turns their answers into domain types.
#[derive(Clone)]
pub struct ContentGenerator {
    invoker: ModelInvoker,
    config: PipelineConfig,
}

impl ContentGenerator {
    pub fn new(invoker: ModelInvoker, config: PipelineConfig) -> Self {
        Self { invoker, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn json_request(
        &self,
        system_prompt: &str,
        user_prompt: String,
        temperature: f32,
        max_tokens: u32,
    ) -> ModelRequest {
        ModelRequest {
            system_prompt: Some(system_prompt.to_string()),
            user_prompt,
            model: self.config.primary_model.clone(),
            temperature,
            max_tokens,
            response_format: ResponseFormat::Json,
        }
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        request: ModelRequest,
        stats: &mut RunStats,
    ) -> PortResult<T> {
        let (parsed, response) = self.invoker.invoke_json::<T>(request).await?;
        debug!(model = %response.model_used, "Structured model call completed");
        stats.record_call(response.usage);
        Ok(parsed)
    }

    /// Renders a course template with the shared audience, difficulty and schema
    /// values plus the mode-specific `extra` ones.
    fn course_prompt(&self, template: &str, config: &CourseConfig, extra: &[(&str, &str)]) -> String {
        let mut values = vec![
            ("audience", config.audience()),
            ("difficulty", config.difficulty().as_str()),
            ("schema", prompts::COURSE_SCHEMA),
        ];
        values.extend_from_slice(extra);
        prompts::render(template, &values)
    }

    async fn course_call(
        &self,
        user_prompt: String,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let request = self.json_request(
            prompts::COURSE_SYSTEM_PROMPT,
            user_prompt,
            self.config.temperature,
            self.config.course_max_tokens,
        );
        let draft: CourseDraft = self.call_json(request, stats).await?;
        validation::course_from_draft(draft, config, self.config.default_lesson_minutes)
    }

    //-------------------------------------------------------------------------------------
    // Outline Generator
    //-------------------------------------------------------------------------------------

    /// Plans a title-only skeleton from a sample of the document.
    pub async fn plan_outline(
        &self,
        document_sample: &str,
        document_type: DocumentType,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<OutlineSkeleton> {
        let user_prompt = prompts::render(
            prompts::OUTLINE_TEMPLATE,
            &[
                ("document_type", document_type.as_str()),
                ("audience", config.audience()),
                ("difficulty", config.difficulty().as_str()),
                ("sample", document_sample),
            ],
        );
        let request = self.json_request(
            prompts::COURSE_SYSTEM_PROMPT,
            user_prompt,
            self.config.temperature,
            self.config.outline_max_tokens,
        );
        let draft: OutlineDraft = self.call_json(request, stats).await?;
        let outline = validation::outline_from_draft(draft)?;
        info!(
            modules = outline.modules.len(),
            lessons = outline.lesson_count(),
            "Outline planned"
        );
        Ok(outline)
    }

    //-------------------------------------------------------------------------------------
    // Segment Content Generator
    //-------------------------------------------------------------------------------------

    /// Writes one lesson from a bounded prefix of `source_text`.
    pub async fn generate_lesson_content(
        &self,
        plan: &LessonPlan,
        source_text: &str,
        scope: LessonScope<'_>,
        sort_order: u32,
        stats: &mut RunStats,
    ) -> PortResult<GeneratedLesson> {
        let minutes = plan
            .estimated_duration
            .filter(|m| *m > 0)
            .unwrap_or(self.config.default_lesson_minutes);
        let source = truncate_chars(source_text, self.config.lesson_source_chars);

        let duration = minutes.to_string();
        let user_prompt = prompts::render(
            prompts::LESSON_TEMPLATE,
            &[
                ("course_title", scope.course_title),
                ("module_title", scope.module_title),
                ("lesson_title", plan.title.as_str()),
                ("duration", duration.as_str()),
                ("audience", scope.config.audience()),
                ("difficulty", scope.config.difficulty().as_str()),
                ("source", source),
            ],
        );
        let request = self.json_request(
            prompts::COURSE_SYSTEM_PROMPT,
            user_prompt,
            self.config.temperature,
            self.config.lesson_max_tokens,
        );

        let mut draft: LessonDraft = self.call_json(request, stats).await?;
        if draft.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            draft.title = Some(plan.title.clone());
        }
        validation::lesson_from_draft(draft, sort_order, minutes)
    }

    /// Extracts the questions contained in one chunk, numbered from
    /// `starting_question_number`.
    pub async fn extract_questions_from_chunk(
        &self,
        chunk: &Chunk,
        starting_question_number: u32,
        stats: &mut RunStats,
    ) -> PortResult<Vec<Question>> {
        let start_number = starting_question_number.to_string();
        let user_prompt = prompts::render(
            prompts::QUIZ_CHUNK_TEMPLATE,
            &[
                ("start_number", start_number.as_str()),
                ("question_schema", prompts::QUESTION_SCHEMA),
                ("chunk", chunk.text.as_str()),
            ],
        );
        let request = self.json_request(
            prompts::QUIZ_SYSTEM_PROMPT,
            user_prompt,
            self.config.extraction_temperature,
            self.config.quiz_max_tokens,
        );
        let batch: QuestionBatchDraft = self.call_json(request, stats).await?;
        Ok(validation::questions_from_drafts(
            batch.questions.unwrap_or_default(),
            starting_question_number,
        ))
    }

    /// Whole-document course generation in one call.
    pub async fn generate_course_single_pass(
        &self,
        document: Document<'_>,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let user_prompt = self.course_prompt(
            prompts::COURSE_FROM_DOCUMENT_TEMPLATE,
            config,
            &[
                ("document_type", document.declared_type.as_str()),
                ("document", document.content),
            ],
        );
        self.course_call(user_prompt, config, stats).await
    }

    /// Whole-document quiz extraction in one call.
    pub async fn extract_quiz_single_pass(
        &self,
        document: Document<'_>,
        config: &QuizConfig,
        max_questions: usize,
        stats: &mut RunStats,
    ) -> PortResult<QuizContent> {
        let limit = max_questions.to_string();
        let user_prompt = prompts::render(
            prompts::QUIZ_FROM_DOCUMENT_TEMPLATE,
            &[
                ("document_type", document.declared_type.as_str()),
                ("max_questions", limit.as_str()),
                ("question_schema", prompts::QUESTION_SCHEMA),
                ("document", document.content),
            ],
        );
        let request = self.json_request(
            prompts::QUIZ_SYSTEM_PROMPT,
            user_prompt,
            self.config.extraction_temperature,
            self.config.quiz_max_tokens,
        );
        let draft: QuizDraft = self.call_json(request, stats).await?;
        validation::quiz_from_draft(draft, config, Some(max_questions))
    }

    //-------------------------------------------------------------------------------------
    // Topic, Outline and Enhancement Modes
    //-------------------------------------------------------------------------------------

    pub async fn generate_course_from_topic(
        &self,
        topic: &str,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let user_prompt =
            self.course_prompt(prompts::COURSE_FROM_TOPIC_TEMPLATE, config, &[("topic", topic)]);
        self.course_call(user_prompt, config, stats).await
    }

    pub async fn generate_course_from_outline(
        &self,
        outline: &str,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let user_prompt =
            self.course_prompt(prompts::COURSE_FROM_OUTLINE_TEMPLATE, config, &[("outline", outline)]);
        self.course_call(user_prompt, config, stats).await
    }

    pub async fn enhance_course(
        &self,
        existing: &CourseContent,
        instructions: &str,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let course_json = serde_json::to_string_pretty(existing)
            .map_err(|e| crate::ports::PortError::Unexpected(e.to_string()))?;
        let user_prompt = self.course_prompt(
            prompts::COURSE_ENHANCE_TEMPLATE,
            config,
            &[("instructions", instructions), ("course", course_json.as_str())],
        );
        self.course_call(user_prompt, config, stats).await
    }
}

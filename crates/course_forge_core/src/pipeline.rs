//! crates/course_forge_core/src/pipeline.rs
//!
//! The document pipeline orchestrator and the public entry points of the crate.
//!
//! Each request first estimates the document's token count. Documents that fit
//! the model's context go to the model in one call. Larger documents are split
//! into chunks: for courses an outline is planned from the first few chunks and
//! each planned lesson is written from its best-matching chunk; for quizzes the
//! questions of every chunk are extracted in order. All model calls of a request
//! are made one after another.

use crate::chunker::{chunk_document, estimate_tokens, sample_chunks};
use crate::config::PipelineConfig;
use crate::domain::{
    renumber_questions, CourseContent, CourseStatus, Document, DocumentType, GeneratedModule,
    QuizContent,
};
use crate::generator::{ContentGenerator, LessonScope};
use crate::invoker::ModelInvoker;
use crate::ports::{CompletionProvider, CourseRepository, PortError, PortResult};
use crate::prompts::SECTION_BREAK;
use crate::relevance::select_best_chunk;
use crate::request::{CourseConfig, GenerationResponse, ProcessingPath, QuizConfig, RunStats};
use crate::validation;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

//=========================================================================================
// The Orchestrator
//=========================================================================================

/// Turns documents, topics and outlines into structured course and quiz content.
///
/// Holds no per-request state and can be shared behind an `Arc`.
#[derive(Clone)]
pub struct DocumentPipeline {
    generator: ContentGenerator,
    repository: Option<Arc<dyn CourseRepository>>,
}

impl DocumentPipeline {
    /// Creates a new `DocumentPipeline` over a model provider.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: PipelineConfig) -> Self {
        let invoker = ModelInvoker::new(provider, config.fallback_model.clone());
        Self {
            generator: ContentGenerator::new(invoker, config),
            repository: None,
        }
    }

    /// Attaches the persistence collaborator used to look up courses for enhancement.
    pub fn with_repository(mut self, repository: Arc<dyn CourseRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        self.generator.config()
    }

    /// Decides which branch a document takes, by estimated token count.
    pub fn choose_path(&self, document: &str) -> ProcessingPath {
        if estimate_tokens(document) > self.config().max_context_tokens {
            ProcessingPath::LargeDocument
        } else {
            ProcessingPath::SinglePass
        }
    }

    //-------------------------------------------------------------------------------------
    // Public Entry Points
    //-------------------------------------------------------------------------------------

    pub async fn build_course_from_document(
        &self,
        document_content: &str,
        document_type: DocumentType,
        config: CourseConfig,
    ) -> GenerationResponse<CourseContent> {
        let mut stats = RunStats::default();
        let document = Document::new(document_content, document_type);
        let result = self.course_from_document(document, &config, &mut stats).await;
        finish("course from document", result, stats)
    }

    pub async fn build_quiz_from_document(
        &self,
        document_content: &str,
        document_type: DocumentType,
        config: QuizConfig,
    ) -> GenerationResponse<QuizContent> {
        let mut stats = RunStats::default();
        let document = Document::new(document_content, document_type);
        let result = self.quiz_from_document(document, &config, &mut stats).await;
        finish("quiz from document", result, stats)
    }

    pub async fn build_course_from_topic(
        &self,
        topic: &str,
        config: CourseConfig,
    ) -> GenerationResponse<CourseContent> {
        let mut stats = RunStats::default();
        let result = match require_text(topic, "topic") {
            Ok(topic) => {
                stats.path = Some(ProcessingPath::SinglePass);
                self.generator
                    .generate_course_from_topic(topic, &config, &mut stats)
                    .await
            }
            Err(e) => Err(e),
        };
        finish("course from topic", result, stats)
    }

    pub async fn build_course_from_outline(
        &self,
        outline: &str,
        config: CourseConfig,
    ) -> GenerationResponse<CourseContent> {
        let mut stats = RunStats::default();
        let result = match require_text(outline, "outline") {
            Ok(outline) => {
                stats.path = Some(ProcessingPath::SinglePass);
                self.generator
                    .generate_course_from_outline(outline, &config, &mut stats)
                    .await
            }
            Err(e) => Err(e),
        };
        finish("course from outline", result, stats)
    }

    /// Rewrites a stored course following `instructions`. Settings missing from
    /// `config` are taken from the stored course.
    pub async fn enhance_course(
        &self,
        course_id: Uuid,
        instructions: &str,
        config: CourseConfig,
    ) -> GenerationResponse<CourseContent> {
        let mut stats = RunStats::default();
        let result = self
            .enhance(course_id, instructions, config, &mut stats)
            .await;
        finish("course enhancement", result, stats)
    }

    //-------------------------------------------------------------------------------------
    // Course Paths
    //-------------------------------------------------------------------------------------

    async fn course_from_document(
        &self,
        document: Document<'_>,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        require_text(document.content, "document content")?;
        let path = self.choose_path(document.content);
        stats.path = Some(path);
        info!(
            estimated_tokens = estimate_tokens(document.content),
            ?path,
            document_type = %document.declared_type,
            "Building course from document"
        );

        match path {
            ProcessingPath::SinglePass => {
                self.generator
                    .generate_course_single_pass(document, config, stats)
                    .await
            }
            ProcessingPath::LargeDocument => {
                self.course_from_large_document(document, config, stats)
                    .await
            }
        }
    }

    async fn course_from_large_document(
        &self,
        document: Document<'_>,
        config: &CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let settings = self.config();
        let chunks = chunk_document(document.content, settings.chunk_size_chars);
        let sample = sample_chunks(&chunks, settings.outline_sample_chunks, SECTION_BREAK);
        info!(chunks = chunks.len(), "Document split for large-document processing");

        let outline = self
            .generator
            .plan_outline(&sample, document.declared_type, config, stats)
            .await?;

        let mut modules = Vec::with_capacity(outline.modules.len());
        for module_plan in &outline.modules {
            let mut lessons = Vec::with_capacity(module_plan.lessons.len());
            for lesson_plan in &module_plan.lessons {
                let Some(chunk) = select_best_chunk(&chunks, &lesson_plan.title) else {
                    continue;
                };
                let scope = LessonScope {
                    course_title: &outline.title,
                    module_title: &module_plan.title,
                    config,
                };
                let sort_order = lessons.len() as u32 + 1;
                match self
                    .generator
                    .generate_lesson_content(lesson_plan, &chunk.text, scope, sort_order, stats)
                    .await
                {
                    Ok(lesson) => lessons.push(lesson),
                    Err(e) => {
                        warn!(
                            lesson = %lesson_plan.title,
                            module = %module_plan.title,
                            error = %e,
                            "Lesson generation failed, omitting lesson"
                        );
                        stats.skip(format!("lesson \"{}\"", lesson_plan.title), &e);
                    }
                }
            }
            modules.push(GeneratedModule {
                title: module_plan.title.clone(),
                description: module_plan.description.clone(),
                sort_order: 0,
                lessons,
            });
        }

        validation::assemble_course(
            outline.title,
            outline.description,
            outline.learning_objectives,
            modules,
            config,
        )
    }

    async fn enhance(
        &self,
        course_id: Uuid,
        instructions: &str,
        mut config: CourseConfig,
        stats: &mut RunStats,
    ) -> PortResult<CourseContent> {
        let repository = self.repository.as_ref().ok_or_else(|| {
            PortError::Unexpected("no course repository is configured".to_string())
        })?;
        let existing = repository.find_course(course_id).await?;

        config
            .target_audience
            .get_or_insert_with(|| existing.target_audience.clone());
        config.difficulty_level.get_or_insert(existing.difficulty_level);
        config
            .auto_publish
            .get_or_insert(existing.status == CourseStatus::Published);

        let instructions = match instructions.trim() {
            "" => "Improve clarity, accuracy and completeness.",
            given => given,
        };
        stats.path = Some(ProcessingPath::SinglePass);
        info!(%course_id, "Enhancing existing course");
        self.generator
            .enhance_course(&existing, instructions, &config, stats)
            .await
    }

    //-------------------------------------------------------------------------------------
    // Quiz Paths
    //-------------------------------------------------------------------------------------

    async fn quiz_from_document(
        &self,
        document: Document<'_>,
        config: &QuizConfig,
        stats: &mut RunStats,
    ) -> PortResult<QuizContent> {
        require_text(document.content, "document content")?;
        let max_questions = config
            .max_questions
            .unwrap_or(self.config().default_max_questions);
        if max_questions == 0 {
            return Err(PortError::Validation(
                "maxQuestions must be at least 1".to_string(),
            ));
        }

        let path = self.choose_path(document.content);
        stats.path = Some(path);
        info!(
            estimated_tokens = estimate_tokens(document.content),
            ?path,
            max_questions,
            "Building quiz from document"
        );

        match path {
            ProcessingPath::SinglePass => {
                self.generator
                    .extract_quiz_single_pass(document, config, max_questions, stats)
                    .await
            }
            ProcessingPath::LargeDocument => {
                self.quiz_from_large_document(document.content, config, max_questions, stats)
                    .await
            }
        }
    }

    async fn quiz_from_large_document(
        &self,
        document: &str,
        config: &QuizConfig,
        max_questions: usize,
        stats: &mut RunStats,
    ) -> PortResult<QuizContent> {
        let chunks = chunk_document(document, self.config().chunk_size_chars);
        info!(chunks = chunks.len(), "Document split for question extraction");

        let mut questions = Vec::new();
        for chunk in &chunks {
            let start = questions.len() as u32 + 1;
            match self
                .generator
                .extract_questions_from_chunk(chunk, start, stats)
                .await
            {
                Ok(mut extracted) => {
                    info!(chunk = chunk.index, count = extracted.len(), "Questions extracted");
                    questions.append(&mut extracted);
                }
                Err(e) => {
                    warn!(chunk = chunk.index, error = %e, "Question extraction failed, skipping chunk");
                    stats.skip(format!("chunk {}", chunk.index + 1), &e);
                }
            }
        }

        if questions.len() > max_questions {
            info!(
                extracted = questions.len(),
                kept = max_questions,
                "Truncating to maximum question count"
            );
            questions.truncate(max_questions);
        }
        renumber_questions(&mut questions);
        validation::build_quiz(questions, config, None)
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn require_text<'a>(value: &'a str, field: &str) -> PortResult<&'a str> {
    if value.trim().is_empty() {
        Err(PortError::Validation(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

fn finish<T>(operation: &str, result: PortResult<T>, stats: RunStats) -> GenerationResponse<T> {
    match &result {
        Ok(_) => info!(
            operation,
            model_calls = stats.usage.model_calls,
            total_tokens = stats.usage.total_tokens,
            skipped = stats.skipped.len(),
            "Generation finished"
        ),
        Err(e) => error!(operation, error = %e, "Generation failed"),
    }
    GenerationResponse::from_result(result, stats)
}

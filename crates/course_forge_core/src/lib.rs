pub mod chunker;
pub mod config;
pub mod domain;
pub mod generator;
pub mod invoker;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod relevance;
pub mod request;
pub mod validation;

pub use config::PipelineConfig;
pub use domain::{
    Chunk, Choice, CourseContent, CourseStatus, DifficultyLevel, Document, DocumentType,
    GeneratedLesson, GeneratedModule, GeneratedQuiz, LessonPlan, LessonType, ModulePlan,
    OutlineSkeleton, Question, QuestionType, QuizContent,
};
pub use invoker::ModelInvoker;
pub use pipeline::DocumentPipeline;
pub use ports::{
    CompletionProvider, CourseRepository, ModelRequest, ModelResponse, PortError, PortResult,
    ResponseFormat, TokenUsage,
};
pub use request::{CourseConfig, GenerationResponse, ProcessingPath, QuizConfig};

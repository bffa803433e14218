//! crates/course_forge_core/src/domain.rs
//!
//! Defines the core data structures produced and consumed by the generation pipeline.
//! Every entity serializes with camelCase field names, which is also the shape the
//! persistence collaborator and the HTTP layer expose.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Input Documents
//=========================================================================================

/// The format the caller declared for an uploaded document.
///
/// Text has already been extracted by the caller; the declared type only informs
/// the prompts about where the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Docx,
    Txt,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Docx => "docx",
            DocumentType::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(DocumentType::Docx),
            "txt" | "text" => Ok(DocumentType::Txt),
            other => Err(format!("unsupported document type '{}'", other)),
        }
    }
}

/// Raw text submitted for one generation request, borrowed from the caller for
/// the length of that request.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub content: &'a str,
    pub declared_type: DocumentType,
}

impl<'a> Document<'a> {
    pub fn new(content: &'a str, declared_type: DocumentType) -> Self {
        Self {
            content,
            declared_type,
        }
    }
}

/// A contiguous window of a `Document`, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub index: usize,
    /// Offset of the first character, counted in chars rather than bytes.
    pub start_offset: usize,
    pub text: String,
}

//=========================================================================================
// Outline Skeleton
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSkeleton {
    pub title: String,
    pub description: String,
    pub learning_objectives: Vec<String>,
    pub modules: Vec<ModulePlan>,
}

impl OutlineSkeleton {
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePlan {
    pub title: String,
    pub description: String,
    pub lessons: Vec<LessonPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub title: String,
    pub estimated_duration: Option<u32>,
}

//=========================================================================================
// Generated Course Content
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    #[default]
    Text,
    Video,
    Interactive,
    Quiz,
    Assignment,
    Document,
}

impl FromStr for LessonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LessonType::Text),
            "video" => Ok(LessonType::Video),
            "interactive" => Ok(LessonType::Interactive),
            "quiz" => Ok(LessonType::Quiz),
            "assignment" => Ok(LessonType::Assignment),
            "document" => Ok(LessonType::Document),
            other => Err(format!("unknown lesson type '{}'", other)),
        }
    }
}

/// A practice exercise attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub title: String,
    pub instructions: String,
}

/// An external reference attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLesson {
    pub title: String,
    pub description: String,
    /// Lesson body in markdown.
    pub content: String,
    pub lesson_type: LessonType,
    /// Minutes.
    pub estimated_duration: u32,
    pub sort_order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<GeneratedQuiz>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedModule {
    pub title: String,
    pub description: String,
    pub sort_order: u32,
    pub lessons: Vec<GeneratedLesson>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
}

/// The fully assembled course handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContent {
    pub title: String,
    pub description: String,
    pub learning_objectives: Vec<String>,
    pub target_audience: String,
    pub difficulty_level: DifficultyLevel,
    /// Sum of all lesson durations, in minutes.
    pub estimated_duration: u32,
    pub status: CourseStatus,
    pub modules: Vec<GeneratedModule>,
}

impl CourseContent {
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn total_lesson_minutes(&self) -> u32 {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .fold(0u32, |total, l| total.saturating_add(l.estimated_duration))
    }
}

//=========================================================================================
// Generated Quiz Content
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    /// Whether the question is graded against its choice list.
    pub fn requires_correct_choice(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "multiple_choice" | "mcq" => Ok(QuestionType::MultipleChoice),
            "true_false" | "boolean" => Ok(QuestionType::TrueFalse),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            "essay" | "long_answer" => Ok(QuestionType::Essay),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub choice_text: String,
    pub is_correct: bool,
    pub sort_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: u32,
    pub sort_order: u32,
    pub explanation: String,
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn has_correct_choice(&self) -> bool {
        self.choices.iter().any(|c| c.is_correct)
    }
}

/// A standalone quiz, or the quiz embedded in a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizContent {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub passing_score_percentage: u32,
    pub time_limit_minutes: Option<u32>,
    pub max_attempts: u32,
    pub shuffle_questions: bool,
}

/// The quiz attached to a generated lesson has the same shape as a standalone quiz.
pub type GeneratedQuiz = QuizContent;

/// Renumbers question sort orders from 1 in their current order.
pub fn renumber_questions(questions: &mut [Question]) {
    for (i, q) in questions.iter_mut().enumerate() {
        q.sort_order = i as u32 + 1;
    }
}

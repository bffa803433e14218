//! crates/course_forge_core/src/validation.rs
//!
//! Model output is first parsed into lenient draft structs and then converted
//! into domain types here. Conversion repairs what can be repaired (missing
//! durations, unknown enum spellings, sort orders) and rejects what cannot
//! (empty lessons, graded questions without a correct answer).

use crate::domain::{
    Choice, CourseContent, Exercise, GeneratedLesson, GeneratedModule, LessonPlan, LessonType,
    ModulePlan, OutlineSkeleton, Question, QuestionType, QuizContent, Resource,
};
use crate::ports::{PortError, PortResult};
use crate::request::{CourseConfig, QuizConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_PASSING_SCORE};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

//=========================================================================================
// Lenient Draft Shapes
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub learning_objectives: Option<Vec<String>>,
    pub modules: Option<Vec<ModuleDraft>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lessons: Option<Vec<LessonDraft>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub lesson_type: Option<String>,
    pub estimated_duration: Option<Value>,
    pub exercises: Option<Vec<ExerciseDraft>>,
    pub quiz: Option<QuizDraft>,
    pub resources: Option<Vec<ResourceDraft>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExerciseDraft {
    pub title: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDraft {
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutlineDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub learning_objectives: Option<Vec<String>>,
    pub modules: Option<Vec<ModulePlanDraft>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModulePlanDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lessons: Option<Vec<LessonPlanDraft>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonPlanDraft {
    pub title: Option<String>,
    pub estimated_duration: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<QuestionDraft>>,
    pub passing_score_percentage: Option<Value>,
    pub time_limit_minutes: Option<Value>,
    pub max_attempts: Option<Value>,
    pub shuffle_questions: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub points: Option<Value>,
    pub explanation: Option<String>,
    pub choices: Option<Vec<ChoiceDraft>>,
    /// Some models answer true/false questions with a bare key instead of choices.
    pub correct_answer: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoiceDraft {
    pub choice_text: Option<String>,
    pub is_correct: Option<Value>,
}

/// Wrapper for the per-chunk extraction answer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionBatchDraft {
    pub questions: Option<Vec<QuestionDraft>>,
}

//=========================================================================================
// Lenient Scalars
//=========================================================================================

fn text(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Accepts `20`, `20.4`, `"20"` or `"20 minutes"`.
pub fn lenient_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Upper bound on a single lesson's duration, in minutes.
pub const MAX_LESSON_MINUTES: u32 = 600;

/// A positive lesson duration, capped at `MAX_LESSON_MINUTES`.
fn lesson_minutes(value: &Value) -> Option<u32> {
    lenient_u32(value)
        .filter(|m| *m > 0)
        .map(|m| m.min(MAX_LESSON_MINUTES))
}

fn lenient_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

//=========================================================================================
// Course and Lessons
//=========================================================================================

/// Converts a lesson draft. Lessons without a title or without content are rejected.
pub fn lesson_from_draft(
    draft: LessonDraft,
    sort_order: u32,
    default_minutes: u32,
) -> PortResult<GeneratedLesson> {
    let title = text(draft.title);
    if title.is_empty() {
        return Err(PortError::Parse("lesson has no title".to_string()));
    }
    let content = text(draft.content);
    if content.is_empty() {
        return Err(PortError::Parse(format!("lesson '{}' has no content", title)));
    }

    let lesson_type = match draft.lesson_type.as_deref() {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(lesson = %title, "{}; using text", e);
            LessonType::Text
        }),
        None => LessonType::Text,
    };

    let estimated_duration = draft
        .estimated_duration
        .as_ref()
        .and_then(lesson_minutes)
        .unwrap_or(default_minutes);

    let exercises = draft
        .exercises
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| {
            let instructions = text(e.instructions);
            (!instructions.is_empty()).then(|| Exercise {
                title: text(e.title),
                instructions,
            })
        })
        .collect();

    let resources = draft
        .resources
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| {
            let title = text(r.title);
            (!title.is_empty()).then(|| Resource {
                title,
                url: r.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            })
        })
        .collect();

    let quiz = match draft.quiz {
        Some(quiz_draft) => match quiz_from_draft(quiz_draft, &QuizConfig::default(), None) {
            Ok(quiz) => Some(quiz),
            Err(e) => {
                warn!(lesson = %title, error = %e, "Dropping invalid embedded quiz");
                None
            }
        },
        None => None,
    };

    Ok(GeneratedLesson {
        title,
        description: text(draft.description),
        content,
        lesson_type,
        estimated_duration,
        sort_order,
        exercises,
        quiz,
        resources,
    })
}

/// Renumbers lessons from 1 within a module.
pub fn renumber_lessons(lessons: &mut [GeneratedLesson]) {
    for (i, lesson) in lessons.iter_mut().enumerate() {
        lesson.sort_order = i as u32 + 1;
    }
}

/// Builds the final course from already-validated modules. Modules without
/// lessons are dropped, sort orders are renumbered and the total duration is
/// recomputed from the lessons. A course with no lessons at all is rejected.
pub fn assemble_course(
    title: String,
    description: String,
    learning_objectives: Vec<String>,
    mut modules: Vec<GeneratedModule>,
    config: &CourseConfig,
) -> PortResult<CourseContent> {
    modules.retain(|m| !m.lessons.is_empty());
    if modules.is_empty() {
        return Err(PortError::Parse("course contains no usable lessons".to_string()));
    }
    for (i, module) in modules.iter_mut().enumerate() {
        module.sort_order = i as u32 + 1;
        renumber_lessons(&mut module.lessons);
    }

    let title = if title.is_empty() {
        modules[0].title.clone()
    } else {
        title
    };

    let mut course = CourseContent {
        title,
        description,
        learning_objectives: learning_objectives
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        target_audience: config.audience().to_string(),
        difficulty_level: config.difficulty(),
        estimated_duration: 0,
        status: config.status(),
        modules,
    };
    course.estimated_duration = course.total_lesson_minutes();
    Ok(course)
}

/// Converts a whole-course draft, dropping lessons that fail validation.
pub fn course_from_draft(
    draft: CourseDraft,
    config: &CourseConfig,
    default_minutes: u32,
) -> PortResult<CourseContent> {
    let modules = draft
        .modules
        .unwrap_or_default()
        .into_iter()
        .map(|module| {
            let module_title = text(module.title);
            let lessons = module
                .lessons
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .filter_map(|(i, lesson)| {
                    match lesson_from_draft(lesson, i as u32 + 1, default_minutes) {
                        Ok(lesson) => Some(lesson),
                        Err(e) => {
                            warn!(module = %module_title, error = %e, "Dropping invalid lesson");
                            None
                        }
                    }
                })
                .collect();
            GeneratedModule {
                title: module_title,
                description: text(module.description),
                sort_order: 0,
                lessons,
            }
        })
        .collect();

    assemble_course(
        text(draft.title),
        text(draft.description),
        draft.learning_objectives.unwrap_or_default(),
        modules,
        config,
    )
}

/// Converts an outline draft. Lessons without titles are dropped; an outline
/// with no lessons left is rejected.
pub fn outline_from_draft(draft: OutlineDraft) -> PortResult<OutlineSkeleton> {
    let modules: Vec<ModulePlan> = draft
        .modules
        .unwrap_or_default()
        .into_iter()
        .map(|m| ModulePlan {
            title: text(m.title),
            description: text(m.description),
            lessons: m
                .lessons
                .unwrap_or_default()
                .into_iter()
                .filter_map(|l| {
                    let title = text(l.title);
                    (!title.is_empty()).then(|| LessonPlan {
                        title,
                        estimated_duration: l.estimated_duration.as_ref().and_then(lesson_minutes),
                    })
                })
                .collect(),
        })
        .filter(|m| !m.lessons.is_empty())
        .collect();

    let outline = OutlineSkeleton {
        title: text(draft.title),
        description: text(draft.description),
        learning_objectives: draft.learning_objectives.unwrap_or_default(),
        modules,
    };
    if outline.lesson_count() == 0 {
        return Err(PortError::Parse("outline contains no lessons".to_string()));
    }
    Ok(outline)
}

//=========================================================================================
// Quizzes and Questions
//=========================================================================================

fn infer_question_type(draft: &QuestionDraft) -> QuestionType {
    let choices = draft.choices.as_deref().unwrap_or_default();
    let looks_boolean = choices.len() == 2
        && choices.iter().all(|c| {
            matches!(
                c.choice_text.as_deref().map(|t| t.trim().to_ascii_lowercase()).as_deref(),
                Some("true") | Some("false")
            )
        });
    if looks_boolean || (choices.is_empty() && draft.correct_answer.as_ref().is_some_and(Value::is_boolean)) {
        QuestionType::TrueFalse
    } else if !choices.is_empty() {
        QuestionType::MultipleChoice
    } else {
        QuestionType::ShortAnswer
    }
}

/// Converts a question draft. `sort_order` is assigned by the caller.
pub fn question_from_draft(draft: QuestionDraft) -> PortResult<Question> {
    let question_text = text(draft.question_text.clone());
    if question_text.is_empty() {
        return Err(PortError::Parse("question has no text".to_string()));
    }

    let question_type = match draft.question_type.as_deref() {
        Some(raw) => raw.parse().unwrap_or_else(|_| infer_question_type(&draft)),
        None => infer_question_type(&draft),
    };

    let mut choices: Vec<Choice> = draft
        .choices
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| {
            let choice_text = text(c.choice_text);
            (!choice_text.is_empty()).then(|| Choice {
                choice_text,
                is_correct: c.is_correct.as_ref().is_some_and(lenient_bool),
                sort_order: 0,
            })
        })
        .collect();

    if question_type == QuestionType::TrueFalse && choices.is_empty() {
        if let Some(answer) = draft.correct_answer.as_ref() {
            let is_true = lenient_bool(answer);
            choices = vec![
                Choice {
                    choice_text: "True".to_string(),
                    is_correct: is_true,
                    sort_order: 0,
                },
                Choice {
                    choice_text: "False".to_string(),
                    is_correct: !is_true,
                    sort_order: 0,
                },
            ];
        }
    }

    for (i, choice) in choices.iter_mut().enumerate() {
        choice.sort_order = i as u32 + 1;
    }

    let question = Question {
        question_text,
        question_type,
        points: draft
            .points
            .as_ref()
            .and_then(lenient_u32)
            .filter(|p| *p > 0)
            .unwrap_or(1),
        sort_order: 0,
        explanation: text(draft.explanation),
        choices,
    };

    if question.question_type.requires_correct_choice() && !question.has_correct_choice() {
        return Err(PortError::Parse(format!(
            "question '{}' has no correct choice",
            question.question_text
        )));
    }
    Ok(question)
}

/// Converts a batch of question drafts, dropping invalid ones, and numbers the
/// survivors contiguously starting at `start_number`.
pub fn questions_from_drafts(drafts: Vec<QuestionDraft>, start_number: u32) -> Vec<Question> {
    let mut questions: Vec<Question> = drafts
        .into_iter()
        .filter_map(|draft| match question_from_draft(draft) {
            Ok(q) => Some(q),
            Err(e) => {
                warn!(error = %e, "Dropping invalid question");
                None
            }
        })
        .collect();
    for (i, q) in questions.iter_mut().enumerate() {
        q.sort_order = start_number + i as u32;
    }
    questions
}

/// Builds a quiz from extracted questions and the caller's settings.
///
/// Caller settings win over values the model proposed, which win over defaults.
pub fn build_quiz(
    questions: Vec<Question>,
    config: &QuizConfig,
    proposed: Option<&QuizDraft>,
) -> PortResult<QuizContent> {
    if questions.is_empty() {
        return Err(PortError::Parse("quiz contains no valid questions".to_string()));
    }

    let title = config
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| proposed.and_then(|p| p.title.clone()).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| "Quiz".to_string());

    Ok(QuizContent {
        title: title.trim().to_string(),
        description: proposed
            .and_then(|p| p.description.clone())
            .map(|d| d.trim().to_string())
            .unwrap_or_default(),
        questions,
        passing_score_percentage: config
            .passing_score_percentage
            .or_else(|| proposed.and_then(|p| p.passing_score_percentage.as_ref()).and_then(lenient_u32))
            .unwrap_or(DEFAULT_PASSING_SCORE)
            .min(100),
        time_limit_minutes: config
            .time_limit_minutes
            .or_else(|| proposed.and_then(|p| p.time_limit_minutes.as_ref()).and_then(lenient_u32))
            .filter(|m| *m > 0),
        max_attempts: config
            .max_attempts
            .or_else(|| proposed.and_then(|p| p.max_attempts.as_ref()).and_then(lenient_u32))
            .filter(|a| *a > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS),
        shuffle_questions: config
            .shuffle_questions
            .or_else(|| proposed.and_then(|p| p.shuffle_questions))
            .unwrap_or(false),
    })
}

/// Converts a whole-quiz draft into a quiz numbered from 1.
pub fn quiz_from_draft(
    mut draft: QuizDraft,
    config: &QuizConfig,
    max_questions: Option<usize>,
) -> PortResult<QuizContent> {
    let mut questions = questions_from_drafts(draft.questions.take().unwrap_or_default(), 1);
    if let Some(max) = max_questions {
        questions.truncate(max);
    }
    build_quiz(questions, config, Some(&draft))
}

//! crates/course_forge_core/src/prompts.rs
//!
//! Prompt templates for every model call the pipeline makes. Placeholders are
//! written as `{name}` and filled by `render`.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Fills the `{name}` placeholders of `template` in a single pass.
///
/// Inserted values are never scanned again, so a value that itself contains
/// `{document}` or another placeholder is kept as literal text. Placeholders
/// without a value are left as written.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

pub const SECTION_BREAK: &str = "\n\n--- SECTION BREAK ---\n\n";

pub const COURSE_SYSTEM_PROMPT: &str = r#"You are an expert instructional designer who builds online courses for a learning-management system.

Rules:
- Respond with a single JSON object and nothing else. No markdown fences, no commentary.
- Write lesson content in markdown. Lessons must be complete and ready to publish, not summaries of what a lesson would contain.
- Stay faithful to any source material you are given. Do not invent policies, figures or procedures that contradict it.
- Use only these lesson types: text, video, interactive, quiz, assignment, document.
- Durations are whole minutes."#;

pub const COURSE_SCHEMA: &str = r#"{
  "title": "string",
  "description": "string",
  "learningObjectives": ["string"],
  "modules": [
    {
      "title": "string",
      "description": "string",
      "lessons": [
        {
          "title": "string",
          "description": "string",
          "content": "markdown string",
          "lessonType": "text",
          "estimatedDuration": 15,
          "exercises": [{ "title": "string", "instructions": "string" }],
          "resources": [{ "title": "string", "url": "string or null" }]
        }
      ]
    }
  ]
}"#;

pub const COURSE_FROM_DOCUMENT_TEMPLATE: &str = r#"Build a complete course from the document below.

Target audience: {audience}
Difficulty level: {difficulty}
Source format: {document_type}

Organize the material into modules and lessons that follow the document's own structure. Every lesson needs full markdown content drawn from the document.

Return JSON with exactly this shape:
{schema}

DOCUMENT:
---
{document}
---"#;

pub const COURSE_FROM_TOPIC_TEMPLATE: &str = r#"Design a complete course on the following topic.

Topic: {topic}
Target audience: {audience}
Difficulty level: {difficulty}

Return JSON with exactly this shape:
{schema}"#;

pub const COURSE_FROM_OUTLINE_TEMPLATE: &str = r#"Expand the outline below into a complete course. Keep the module and lesson order of the outline and write full markdown content for every lesson.

Target audience: {audience}
Difficulty level: {difficulty}

OUTLINE:
---
{outline}
---

Return JSON with exactly this shape:
{schema}"#;

pub const COURSE_ENHANCE_TEMPLATE: &str = r#"Improve the existing course below. Keep its modules and lessons unless the instructions say otherwise, fix inaccuracies, fill gaps and make lesson content more complete.

Instructions: {instructions}
Target audience: {audience}
Difficulty level: {difficulty}

EXISTING COURSE (JSON):
{course}

Return the full improved course as JSON with exactly this shape:
{schema}"#;

pub const OUTLINE_TEMPLATE: &str = r#"The following text is a sample of a long {document_type} document. Sections of the sample are separated by "--- SECTION BREAK ---".

Plan a course that covers the document. Produce titles and short descriptions only; do NOT write lesson content.

Target audience: {audience}
Difficulty level: {difficulty}

Return JSON with exactly this shape:
{
  "title": "string",
  "description": "string",
  "learningObjectives": ["string"],
  "modules": [
    {
      "title": "string",
      "description": "string",
      "lessons": [{ "title": "string", "estimatedDuration": 15 }]
    }
  ]
}

DOCUMENT SAMPLE:
---
{sample}
---"#;

pub const LESSON_TEMPLATE: &str = r#"Write one lesson of the course "{course_title}", module "{module_title}".

Lesson title: {lesson_title}
Target length: about {duration} minutes of study.
Target audience: {audience}
Difficulty level: {difficulty}

Base the lesson on the source excerpt below. Write the full lesson body in markdown.

Return JSON with exactly this shape:
{
  "title": "string",
  "description": "string",
  "content": "markdown string",
  "lessonType": "text",
  "estimatedDuration": 15,
  "exercises": [{ "title": "string", "instructions": "string" }],
  "resources": [{ "title": "string", "url": "string or null" }]
}

SOURCE EXCERPT:
---
{source}
---"#;

pub const QUIZ_SYSTEM_PROMPT: &str = r#"You extract quiz questions from documents for a learning-management system.

Rules:
- Respond with a single JSON object and nothing else.
- The document may already contain questions, answer options and an answer key. Identify those questions and copy their wording, options and correct answers verbatim.
- Do not invent new questions when the document already contains questions. Only write questions yourself when the document contains none.
- Keep questions in the order they appear in the document.
- Question types: multiple_choice, true_false, short_answer, essay.
- Every multiple_choice and true_false question must mark at least one choice as correct."#;

pub const QUESTION_SCHEMA: &str = r#"{
  "questionText": "string",
  "questionType": "multiple_choice",
  "points": 1,
  "explanation": "string",
  "choices": [{ "choiceText": "string", "isCorrect": true }]
}"#;

pub const QUIZ_FROM_DOCUMENT_TEMPLATE: &str = r#"Extract a quiz from the {document_type} document below. Return at most {max_questions} questions.

Return JSON with exactly this shape:
{
  "title": "string",
  "description": "string",
  "questions": [
{question_schema}
  ]
}

DOCUMENT:
---
{document}
---"#;

pub const QUIZ_CHUNK_TEMPLATE: &str = r#"The text below is one part of a longer quiz document. Extract every question it contains, in order. Number them starting at {start_number}.

If a question is cut off at the start or end of this part, skip it.

Return JSON with exactly this shape:
{
  "questions": [
{question_schema}
  ]
}

DOCUMENT PART:
---
{chunk}
---"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_known_placeholders() {
        let out = render("Hi {name}, see {place}.", &[("name", "Ada"), ("place", "room 4")]);
        assert_eq!(out, "Hi Ada, see room 4.");
    }

    #[test]
    fn render_does_not_expand_inserted_values() {
        let out = render(
            "Audience: {audience}\n{document}",
            &[("audience", "{document}"), ("document", "BODY")],
        );
        assert_eq!(out, "Audience: {document}\nBODY");
        assert_eq!(out.matches("BODY").count(), 1);
    }

    #[test]
    fn render_keeps_unknown_placeholders_and_json() {
        let out = render(r#"{"title": "x"} {missing}"#, &[]);
        assert_eq!(out, r#"{"title": "x"} {missing}"#);
    }
}

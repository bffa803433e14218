//! End-to-end tests for course generation through the document pipeline.

mod common;

use common::{prompt_field, section, small_config, MemoryRepository, ScriptedProvider};
use course_forge_core::domain::{CourseStatus, DifficultyLevel, DocumentType};
use course_forge_core::ports::{ModelRequest, PortError, PortResult};
use course_forge_core::validation::MAX_LESSON_MINUTES;
use course_forge_core::{
    CourseConfig, CourseContent, DocumentPipeline, GenerationResponse, PipelineConfig,
    ProcessingPath,
};
use serde_json::json;

fn single_pass_course() -> String {
    json!({
        "title": "Workplace Safety",
        "description": "Core safety practices.",
        "learningObjectives": ["Recognize hazards"],
        "modules": [{
            "title": "Hazards",
            "description": "Spotting hazards",
            "lessons": [
                {"title": "Slips and Trips", "content": "# Slips\nKeep floors dry.", "estimatedDuration": 10},
                {"title": "Lifting", "content": "# Lifting\nBend your knees.", "lessonType": "video"}
            ]
        }]
    })
    .to_string()
}

fn success<T: std::fmt::Debug>(response: GenerationResponse<T>) -> T {
    match response {
        GenerationResponse::Success(s) => s.data,
        GenerationResponse::Failure(f) => panic!("expected success, got {:?}", f),
    }
}

// ============================================================================
// Single-pass path
// ============================================================================

#[tokio::test]
async fn test_small_document_uses_single_call() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let response = pipeline
        .build_course_from_document("A short safety manual.", DocumentType::Txt, CourseConfig::default())
        .await;

    let course = success(response);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(course.title, "Workplace Safety");
    assert_eq!(course.estimated_duration, 25);
    assert_eq!(course.status, CourseStatus::Draft);
    assert_eq!(course.modules[0].lessons[1].sort_order, 2);
}

#[tokio::test]
async fn test_threshold_is_token_estimated_not_character_count() {
    // 200,000 characters estimate to 50,000 tokens, under the 120,000 threshold.
    let document = "a".repeat(200_000);
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    assert_eq!(pipeline.choose_path(&document), ProcessingPath::SinglePass);
    let response = pipeline
        .build_course_from_document(&document, DocumentType::Docx, CourseConfig::default())
        .await;

    assert!(response.is_success());
    assert_eq!(provider.call_count(), 1);
    let prompt = &provider.requests()[0].user_prompt;
    assert!(prompt.contains(&document));
    assert!(prompt.contains("Source format: docx"));
}

#[tokio::test]
async fn test_default_threshold_boundary() {
    let pipeline = DocumentPipeline::new(
        ScriptedProvider::new(|_| Ok(String::new())),
        PipelineConfig::default(),
    );
    assert_eq!(pipeline.choose_path(&"x".repeat(480_000)), ProcessingPath::SinglePass);
    assert_eq!(pipeline.choose_path(&"x".repeat(480_001)), ProcessingPath::LargeDocument);
}

#[tokio::test]
async fn test_course_config_reaches_prompt_and_output() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());
    let config = CourseConfig {
        target_audience: Some("New hires".to_string()),
        difficulty_level: Some(DifficultyLevel::Advanced),
        auto_publish: Some(true),
    };

    let course = success(
        pipeline
            .build_course_from_document("Manual text", DocumentType::Txt, config)
            .await,
    );

    let prompt = &provider.requests()[0].user_prompt;
    assert_eq!(prompt_field(prompt, "Target audience:"), Some("New hires"));
    assert_eq!(prompt_field(prompt, "Difficulty level:"), Some("advanced"));
    assert_eq!(course.target_audience, "New hires");
    assert_eq!(course.status, CourseStatus::Published);
}

#[tokio::test]
async fn test_caller_text_is_not_expanded_as_placeholder() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());
    let config = CourseConfig {
        target_audience: Some("{document}".to_string()),
        ..CourseConfig::default()
    };

    pipeline
        .build_course_from_document("SECRETDOC", DocumentType::Txt, config)
        .await;

    let prompt = &provider.requests()[0].user_prompt;
    assert_eq!(prompt.matches("SECRETDOC").count(), 1);
    assert_eq!(prompt_field(prompt, "Target audience:"), Some("{document}"));
}

#[tokio::test]
async fn test_oversized_lesson_durations_are_capped() {
    let provider = ScriptedProvider::new(|_| {
        Ok(json!({
            "title": "Endless",
            "modules": [{
                "title": "Only",
                "lessons": [
                    {"title": "Forever", "content": "Body", "estimatedDuration": 4294967295u64},
                    {"title": "Short", "content": "Body", "estimatedDuration": 10}
                ]
            }]
        })
        .to_string())
    });
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let course = success(
        pipeline
            .build_course_from_document("Manual text", DocumentType::Txt, CourseConfig::default())
            .await,
    );

    assert_eq!(course.modules[0].lessons[0].estimated_duration, MAX_LESSON_MINUTES);
    assert_eq!(course.estimated_duration, MAX_LESSON_MINUTES + 10);
}

#[tokio::test]
async fn test_single_pass_parse_failure_fails_request() {
    let provider = ScriptedProvider::new(|_| Ok("Here's your course! It covers safety.".to_string()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let response = pipeline
        .build_course_from_document("Manual text", DocumentType::Txt, CourseConfig::default())
        .await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "parse");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_empty_document_fails_before_any_call() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let response = pipeline
        .build_course_from_document("  \n ", DocumentType::Txt, CourseConfig::default())
        .await;

    assert!(!response.is_success());
    assert_eq!(response.error(), Some("Invalid request: document content is required"));
    assert_eq!(provider.call_count(), 0);
}

// ============================================================================
// Large-document path
// ============================================================================

/// Four 300-character chunks, each with a distinct marker.
fn large_document() -> String {
    [
        section("alpha-zone welcome to the facility orientation", 300),
        section("beta-zone hand hygiene: wash hands before every hand contact", 300),
        section("gamma-zone informed consent must be documented before treatment", 300),
        section("delta-zone appendix", 300),
    ]
    .concat()
}

fn outline_json() -> String {
    json!({
        "title": "Clinical Onboarding",
        "description": "Orientation for clinical staff.",
        "learningObjectives": ["Practice hand hygiene", "Obtain consent"],
        "modules": [
            {"title": "Patient Safety", "description": "Basics", "lessons": [
                {"title": "Hand Hygiene"},
                {"title": "Informed Consent", "estimatedDuration": 25}
            ]},
            {"title": "Facility", "description": "Building", "lessons": [
                {"title": "Fire Safety"}
            ]}
        ]
    })
    .to_string()
}

fn lesson_json(title: &str, duration: Option<u32>) -> String {
    let mut lesson = json!({
        "title": title,
        "description": format!("About {}", title),
        "content": format!("# {}\nBody text.", title),
        "lessonType": "text"
    });
    if let Some(minutes) = duration {
        lesson["estimatedDuration"] = json!(minutes);
    }
    lesson.to_string()
}

fn large_course_handler(req: &ModelRequest) -> PortResult<String> {
    if req.user_prompt.contains("DOCUMENT SAMPLE:") {
        return Ok(outline_json());
    }
    match prompt_field(&req.user_prompt, "Lesson title:") {
        Some("Hand Hygiene") => Ok(lesson_json("Hand Hygiene", Some(20))),
        Some(title) => Ok(lesson_json(title, None)),
        None => Err(PortError::Provider("unexpected request".to_string())),
    }
}

#[tokio::test]
async fn test_large_document_makes_outline_plus_one_call_per_lesson() {
    let provider = ScriptedProvider::new(large_course_handler);
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());
    let document = large_document();
    assert_eq!(pipeline.choose_path(&document), ProcessingPath::LargeDocument);

    let response = pipeline
        .build_course_from_document(&document, DocumentType::Docx, CourseConfig::default())
        .await;
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["path"], "large_document");
    assert_eq!(json["usage"]["modelCalls"], 4);
    let course = success(response);

    // One outline call plus three lessons.
    assert_eq!(provider.call_count(), 4);
    assert_eq!(course.title, "Clinical Onboarding");
    assert_eq!(course.modules.len(), 2);
    assert_eq!(course.lesson_count(), 3);
    assert_eq!(course.modules[1].sort_order, 2);
    // 20 from the model, 25 from the outline, 15 by default.
    assert_eq!(course.estimated_duration, 60);
}

#[tokio::test]
async fn test_outline_sees_only_first_three_chunks() {
    let provider = ScriptedProvider::new(large_course_handler);
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());

    pipeline
        .build_course_from_document(&large_document(), DocumentType::Txt, CourseConfig::default())
        .await;

    let outline_prompts = provider.prompts_containing("DOCUMENT SAMPLE:");
    assert_eq!(outline_prompts.len(), 1);
    let prompt = &outline_prompts[0];
    assert!(prompt.contains("alpha-zone"));
    assert!(prompt.contains("gamma-zone"));
    assert!(!prompt.contains("delta-zone"));
    // Two separators, plus the instructions naming the marker once.
    assert_eq!(prompt.matches("--- SECTION BREAK ---").count(), 3);
}

#[tokio::test]
async fn test_each_lesson_gets_its_best_matching_chunk() {
    let provider = ScriptedProvider::new(large_course_handler);
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());

    pipeline
        .build_course_from_document(&large_document(), DocumentType::Txt, CourseConfig::default())
        .await;

    let hygiene = &provider.prompts_containing("Lesson title: Hand Hygiene")[0];
    assert!(hygiene.contains("beta-zone"));
    let consent = &provider.prompts_containing("Lesson title: Informed Consent")[0];
    assert!(consent.contains("gamma-zone"));
    assert!(consent.contains("about 25 minutes"));
    // No keyword matches anywhere: falls back to the first chunk.
    let fire = &provider.prompts_containing("Lesson title: Fire Safety")[0];
    assert!(fire.contains("alpha-zone"));
    assert!(fire.contains("module \"Facility\""));
}

#[tokio::test]
async fn test_lesson_source_is_bounded_prefix_of_chunk() {
    let hygiene_chunk = format!(
        "{}{:<20}",
        section("beta-zone hand hygiene: wash hands before every hand contact", 280),
        "omega-tail-marker"
    );
    let document = [
        section("alpha-zone welcome to the facility orientation", 300),
        hygiene_chunk.clone(),
        section("gamma-zone informed consent must be documented before treatment", 300),
    ]
    .concat();
    let config = PipelineConfig {
        lesson_source_chars: 120,
        ..small_config()
    };
    let provider = ScriptedProvider::new(large_course_handler);
    let pipeline = DocumentPipeline::new(provider.clone(), config);

    let response = pipeline
        .build_course_from_document(&document, DocumentType::Txt, CourseConfig::default())
        .await;
    assert!(response.is_success());

    let prompt = &provider.prompts_containing("Lesson title: Hand Hygiene")[0];
    assert!(prompt.contains(&hygiene_chunk[..120]));
    assert!(!prompt.contains(&hygiene_chunk[..121]));
    assert!(!prompt.contains("omega-tail-marker"));
}

#[tokio::test]
async fn test_failed_lesson_is_omitted_and_reported() {
    let provider = ScriptedProvider::new(|req| {
        if prompt_field(&req.user_prompt, "Lesson title:") == Some("Informed Consent") {
            return Ok("{ not valid json".to_string());
        }
        large_course_handler(req)
    });
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());

    let response = pipeline
        .build_course_from_document(&large_document(), DocumentType::Txt, CourseConfig::default())
        .await;

    let GenerationResponse::Success(success) = response else {
        panic!("expected partial success");
    };
    let course: CourseContent = success.data;
    assert_eq!(course.lesson_count(), 2);
    let titles: Vec<&str> = course.modules[0].lessons.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Hand Hygiene"]);
    assert_eq!(course.modules[0].lessons[0].sort_order, 1);
    assert_eq!(success.skipped.len(), 1);
    assert_eq!(success.skipped[0].unit, "lesson \"Informed Consent\"");
    assert_eq!(course.estimated_duration, 35);
}

#[tokio::test]
async fn test_module_with_no_surviving_lessons_is_dropped() {
    let provider = ScriptedProvider::new(|req| {
        if prompt_field(&req.user_prompt, "Lesson title:") == Some("Fire Safety") {
            return Ok(json!({"title": "Fire Safety", "content": ""}).to_string());
        }
        large_course_handler(req)
    });
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());

    let course = success(
        pipeline
            .build_course_from_document(&large_document(), DocumentType::Txt, CourseConfig::default())
            .await,
    );
    assert_eq!(course.modules.len(), 1);
    assert_eq!(course.modules[0].title, "Patient Safety");
}

#[tokio::test]
async fn test_outline_failure_is_fatal() {
    let provider = ScriptedProvider::new(|req| {
        if req.user_prompt.contains("DOCUMENT SAMPLE:") {
            Err(PortError::Provider("rate limited".to_string()))
        } else {
            large_course_handler(req)
        }
    });
    let pipeline = DocumentPipeline::new(provider.clone(), small_config());

    let response = pipeline
        .build_course_from_document(&large_document(), DocumentType::Txt, CourseConfig::default())
        .await;

    assert!(!response.is_success());
    assert_eq!(response.error(), Some("Model provider error: rate limited"));
    // Primary attempt plus one fallback attempt, no lesson calls.
    assert_eq!(provider.call_count(), 2);
}

// ============================================================================
// Topic, outline and enhancement modes
// ============================================================================

#[tokio::test]
async fn test_blank_topic_is_rejected_without_calls() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let response = pipeline.build_course_from_topic("", CourseConfig::default()).await;
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["kind"], "validation");
    assert_eq!(provider.call_count(), 0);

    let response = pipeline.build_course_from_outline(" ", CourseConfig::default()).await;
    assert!(!response.is_success());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_course_from_topic() {
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline = DocumentPipeline::new(provider.clone(), PipelineConfig::default());

    let course = success(
        pipeline
            .build_course_from_topic("Workplace safety for warehouses", CourseConfig::default())
            .await,
    );
    assert_eq!(course.lesson_count(), 2);
    assert_eq!(
        prompt_field(&provider.requests()[0].user_prompt, "Topic:"),
        Some("Workplace safety for warehouses")
    );
}

#[tokio::test]
async fn test_enhance_unknown_course_is_not_found() {
    let (repo, _) = MemoryRepository::with_course(success(
        DocumentPipeline::new(
            ScriptedProvider::new(|_| Ok(single_pass_course())),
            PipelineConfig::default(),
        )
        .build_course_from_topic("safety", CourseConfig::default())
        .await,
    ));
    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline =
        DocumentPipeline::new(provider.clone(), PipelineConfig::default()).with_repository(repo);

    let response = pipeline
        .enhance_course(uuid::Uuid::new_v4(), "add examples", CourseConfig::default())
        .await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["kind"], "not_found");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_enhance_inherits_settings_from_stored_course() {
    let mut stored = success(
        DocumentPipeline::new(
            ScriptedProvider::new(|_| Ok(single_pass_course())),
            PipelineConfig::default(),
        )
        .build_course_from_topic("safety", CourseConfig::default())
        .await,
    );
    stored.target_audience = "Warehouse staff".to_string();
    stored.status = CourseStatus::Published;
    let (repo, id) = MemoryRepository::with_course(stored);

    let provider = ScriptedProvider::new(|_| Ok(single_pass_course()));
    let pipeline =
        DocumentPipeline::new(provider.clone(), PipelineConfig::default()).with_repository(repo);

    let course = success(
        pipeline
            .enhance_course(id, "Add a lesson on forklifts", CourseConfig::default())
            .await,
    );

    let prompt = &provider.requests()[0].user_prompt;
    assert_eq!(prompt_field(prompt, "Instructions:"), Some("Add a lesson on forklifts"));
    assert!(prompt.contains("\"targetAudience\": \"Warehouse staff\""));
    assert_eq!(course.target_audience, "Warehouse staff");
    assert_eq!(course.status, CourseStatus::Published);
}

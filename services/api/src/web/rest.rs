//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints, the router that mounts
//! them, and the master definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Path, Request, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use course_forge_core::{
    domain::{CourseContent, DocumentType},
    ports::PortError,
    request::RunStats,
    CourseConfig, GenerationResponse, QuizConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Uploaded documents are plain text but can be long.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        course_from_document_handler,
        course_from_topic_handler,
        course_from_outline_handler,
        enhance_course_handler,
        get_course_handler,
        quiz_from_document_handler,
    ),
    components(
        schemas(
            CourseFromDocumentRequest,
            CourseFromTopicRequest,
            CourseFromOutlineRequest,
            EnhanceCourseRequest,
            QuizFromDocumentRequest,
            GenerationEnvelope
        )
    ),
    tags(
        (name = "Course Forge API", description = "Generates courses and quizzes from documents with a language model.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API router with CORS and the body limit applied.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    let cors = match app_state.config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT]),
        Err(_) => {
            warn!(
                origin = %app_state.config.allowed_origin,
                "ALLOWED_ORIGIN is not a valid header value; cross-origin requests are disabled"
            );
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/courses/from-document", post(course_from_document_handler))
        .route("/courses/from-topic", post(course_from_topic_handler))
        .route("/courses/from-outline", post(course_from_outline_handler))
        .route("/courses/{id}", get(get_course_handler))
        .route("/courses/{id}/enhance", post(enhance_course_handler))
        .route("/quizzes/from-document", post(quiz_from_document_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state)
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Request body for building a course from extracted document text.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFromDocumentRequest {
    pub document_content: String,
    /// `docx` or `txt`.
    #[schema(example = "txt")]
    pub document_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: CourseConfig,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFromTopicRequest {
    pub topic: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: CourseConfig,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFromOutlineRequest {
    pub outline: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: CourseConfig,
}

/// Settings left out of `config` are taken from the stored course.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceCourseRequest {
    pub instructions: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: CourseConfig,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizFromDocumentRequest {
    pub document_content: String,
    #[schema(example = "docx")]
    pub document_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: QuizConfig,
}

/// A course generation result, plus the id it was saved under when it succeeded.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,
    #[serde(flatten)]
    pub result: GenerationResponse<CourseContent>,
}

/// The shape shared by every generation response.
///
/// On success `data`, `path` and `usage` are set; on failure only `error` and `kind`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEnvelope {
    success: bool,
    course_id: Option<Uuid>,
    #[schema(value_type = Object)]
    data: Option<serde_json::Value>,
    #[schema(example = "single_pass")]
    path: Option<String>,
    #[schema(value_type = Object)]
    usage: Option<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    skipped: Vec<serde_json::Value>,
    error: Option<String>,
    #[schema(example = "validation")]
    kind: Option<String>,
}

//=========================================================================================
// Request Body Extractor
//=========================================================================================

/// A JSON request body whose rejections are reported in the generation envelope
/// (`kind: "validation"`) instead of axum's plain-text message.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<GenerationResponse<()>>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
                let failure = GenerationResponse::from_result(
                    Err(PortError::Validation(rejection.body_text())),
                    RunStats::default(),
                );
                Err((rejection.status(), Json(failure)))
            }
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Maps a generation result to its HTTP status.
fn status_for<T>(response: &GenerationResponse<T>, on_success: StatusCode) -> StatusCode {
    match response {
        GenerationResponse::Success(_) => on_success,
        GenerationResponse::Failure(failure) => match failure.kind.as_str() {
            "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "provider" | "parse" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// Parses the declared document type, or builds the validation failure to send back.
fn parse_document_type<T>(raw: &str) -> Result<DocumentType, GenerationResponse<T>> {
    raw.parse::<DocumentType>().map_err(|message| {
        GenerationResponse::from_result(Err(PortError::Validation(message)), RunStats::default())
    })
}

/// Saves a successful course and wraps the result for the client.
async fn persist_course(
    app_state: &AppState,
    result: GenerationResponse<CourseContent>,
) -> Result<(StatusCode, Json<CourseResponse>), (StatusCode, String)> {
    let course_id = match result.data() {
        Some(course) => Some(app_state.courses.save_course(course).await.map_err(|e| {
            error!("Failed to save generated course: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save generated course".to_string(),
            )
        })?),
        None => None,
    };
    if let Some(id) = course_id {
        info!(course_id = %id, "Saved generated course");
    }

    let status = status_for(&result, StatusCode::CREATED);
    Ok((status, Json(CourseResponse { course_id, result })))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Build a course from the text of an uploaded document.
///
/// Documents estimated above the context limit are split into chunks and built
/// lesson by lesson; smaller ones take a single model call.
#[utoipa::path(
    post,
    path = "/courses/from-document",
    request_body = CourseFromDocumentRequest,
    responses(
        (status = 201, description = "Course generated and saved", body = GenerationEnvelope),
        (status = 400, description = "Invalid request (e.g., empty document or unknown type)", body = GenerationEnvelope),
        (status = 502, description = "The model failed or returned unusable output", body = GenerationEnvelope)
    )
)]
pub async fn course_from_document_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CourseFromDocumentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let document_type = match parse_document_type(&payload.document_type) {
        Ok(document_type) => document_type,
        Err(result) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(CourseResponse {
                    course_id: None,
                    result,
                }),
            ))
        }
    };

    let result = app_state
        .pipeline
        .build_course_from_document(&payload.document_content, document_type, payload.config)
        .await;
    persist_course(&app_state, result).await
}

/// Build a course from a topic description alone.
#[utoipa::path(
    post,
    path = "/courses/from-topic",
    request_body = CourseFromTopicRequest,
    responses(
        (status = 201, description = "Course generated and saved", body = GenerationEnvelope),
        (status = 400, description = "Blank topic", body = GenerationEnvelope),
        (status = 502, description = "The model failed or returned unusable output", body = GenerationEnvelope)
    )
)]
pub async fn course_from_topic_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CourseFromTopicRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = app_state
        .pipeline
        .build_course_from_topic(&payload.topic, payload.config)
        .await;
    persist_course(&app_state, result).await
}

/// Build a course that follows a user-supplied outline.
#[utoipa::path(
    post,
    path = "/courses/from-outline",
    request_body = CourseFromOutlineRequest,
    responses(
        (status = 201, description = "Course generated and saved", body = GenerationEnvelope),
        (status = 400, description = "Blank outline", body = GenerationEnvelope),
        (status = 502, description = "The model failed or returned unusable output", body = GenerationEnvelope)
    )
)]
pub async fn course_from_outline_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CourseFromOutlineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = app_state
        .pipeline
        .build_course_from_outline(&payload.outline, payload.config)
        .await;
    persist_course(&app_state, result).await
}

/// Rewrite a saved course following free-form instructions.
///
/// The improved course is saved under a new id; the original is left untouched.
#[utoipa::path(
    post,
    path = "/courses/{id}/enhance",
    request_body = EnhanceCourseRequest,
    responses(
        (status = 201, description = "Enhanced course generated and saved", body = GenerationEnvelope),
        (status = 404, description = "No course with that id", body = GenerationEnvelope),
        (status = 502, description = "The model failed or returned unusable output", body = GenerationEnvelope)
    ),
    params(
        ("id" = Uuid, Path, description = "The id of the course to enhance.")
    )
)]
pub async fn enhance_course_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    JsonBody(payload): JsonBody<EnhanceCourseRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = app_state
        .pipeline
        .enhance_course(course_id, &payload.instructions, payload.config)
        .await;
    persist_course(&app_state, result).await
}

/// Fetch a saved course.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    responses(
        (status = 200, description = "The saved course"),
        (status = 404, description = "No course with that id")
    ),
    params(
        ("id" = Uuid, Path, description = "The id of the course.")
    )
)]
pub async fn get_course_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.courses.find_course(course_id).await {
        Ok(course) => Ok(Json(course)),
        Err(PortError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            format!("Course {} not found", course_id),
        )),
        Err(e) => {
            error!("Failed to load course {}: {:?}", course_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load course".to_string(),
            ))
        }
    }
}

/// Extract a quiz from the text of an uploaded document.
///
/// Questions are only taken from the document itself; large documents are read
/// chunk by chunk and numbered continuously.
#[utoipa::path(
    post,
    path = "/quizzes/from-document",
    request_body = QuizFromDocumentRequest,
    responses(
        (status = 200, description = "Quiz extracted", body = GenerationEnvelope),
        (status = 400, description = "Invalid request (e.g., empty document or a zero question limit)", body = GenerationEnvelope),
        (status = 502, description = "The model failed or returned unusable output", body = GenerationEnvelope)
    )
)]
pub async fn quiz_from_document_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<QuizFromDocumentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = match parse_document_type(&payload.document_type) {
        Ok(document_type) => {
            app_state
                .pipeline
                .build_quiz_from_document(&payload.document_content, document_type, payload.config)
                .await
        }
        Err(result) => result,
    };
    let status = status_for(&result, StatusCode::OK);
    Ok((status, Json(result)))
}

//=========================================================================================
// Tests
//=========================================================================================

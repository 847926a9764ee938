//! HTTP surface over the orchestrator.
//!
//! Routes:
//! - `GET /faqs?lang=xx` - active FAQs, newest first
//! - `GET /faqs/:id?lang=xx` - one FAQ
//! - `POST /faqs`, `PUT /faqs/:id`, `DELETE /faqs/:id`
//! - `POST /faqs/:id/refresh_translation`
//! - `GET /metrics`, `GET /health`

use crate::content::{SourceFields, StatusMap};
use crate::error::{FaqError, ValidationError};
use crate::i18n::{Language, MetricsReport};
use crate::orchestrator::{LocalizedContent, TranslationOrchestrator};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

const MIN_QUESTION_CHARS: usize = 10;
const MIN_ANSWER_CHARS: usize = 20;

// ============================================================================
// ERRORS
// ============================================================================

/// Error response: `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<FaqError> for ApiError {
    fn from(err: FaqError) -> Self {
        let status = match &err {
            FaqError::Validation(_) | FaqError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            FaqError::NotFound(_) => StatusCode::NOT_FOUND,
            FaqError::Storage(e) => {
                // Keep storage details out of the response
                error!("Storage error while serving request: {:#}", e);
                return ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error".to_string(),
                };
            }
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        FaqError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    lang: Option<String>,
}

impl LangQuery {
    fn code(&self) -> &str {
        self.lang
            .as_deref()
            .unwrap_or_else(|| Language::canonical().code())
    }
}

/// Body of `POST /faqs` and `PUT /faqs/:id`.
#[derive(Debug, Deserialize)]
pub struct FaqRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

impl FaqRequest {
    /// Presence first, then the minimum lengths.
    fn into_source(self) -> Result<SourceFields, ValidationError> {
        let source = SourceFields::new(self.question, self.answer);
        source.validate()?;

        if source.question.trim().chars().count() < MIN_QUESTION_CHARS {
            return Err(ValidationError::TooShort {
                field: "Question",
                min: MIN_QUESTION_CHARS,
            });
        }
        if source.answer.trim().chars().count() < MIN_ANSWER_CHARS {
            return Err(ValidationError::TooShort {
                field: "Answer",
                min: MIN_ANSWER_CHARS,
            });
        }
        Ok(source)
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    message: &'static str,
    translation_status: StatusMap,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn list_faqs(
    State(orchestrator): State<TranslationOrchestrator>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Vec<LocalizedContent>>> {
    Ok(Json(orchestrator.list_localized(query.code()).await?))
}

async fn get_faq(
    State(orchestrator): State<TranslationOrchestrator>,
    Path(id): Path<i64>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<LocalizedContent>> {
    Ok(Json(orchestrator.get_localized(id, query.code()).await?))
}

async fn create_faq(
    State(orchestrator): State<TranslationOrchestrator>,
    Json(request): Json<FaqRequest>,
) -> ApiResult<(StatusCode, Json<LocalizedContent>)> {
    let id = orchestrator.create_content(request.into_source()?).await?;
    let created = orchestrator
        .get_localized(id, Language::canonical().code())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_faq(
    State(orchestrator): State<TranslationOrchestrator>,
    Path(id): Path<i64>,
    Json(request): Json<FaqRequest>,
) -> ApiResult<Json<LocalizedContent>> {
    orchestrator
        .update_content(id, request.into_source()?)
        .await?;
    let updated = orchestrator
        .get_localized(id, Language::canonical().code())
        .await?;
    Ok(Json(updated))
}

async fn delete_faq(
    State(orchestrator): State<TranslationOrchestrator>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    orchestrator.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_translation(
    State(orchestrator): State<TranslationOrchestrator>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RefreshResponse>> {
    let translation_status = orchestrator.refresh_translations(id).await?;
    Ok(Json(RefreshResponse {
        message: "Translations refreshed successfully",
        translation_status,
    }))
}

async fn metrics(State(orchestrator): State<TranslationOrchestrator>) -> Json<MetricsReport> {
    Json(orchestrator.metrics().report())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(orchestrator: TranslationOrchestrator) -> Router {
    Router::new()
        .route("/faqs", get(list_faqs).post(create_faq))
        .route("/faqs/:id", get(get_faq).put(update_faq).delete(delete_faq))
        .route("/faqs/:id/refresh_translation", post(refresh_translation))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

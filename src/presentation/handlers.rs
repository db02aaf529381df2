use crate::application::auth_service::AuthService;
use crate::application::note_service::NoteService;
use crate::application::writing_service::WritingService;
use crate::domain::error::DomainError;
use crate::domain::inference::Pipelines;
use crate::domain::note::NoteCreate;
use crate::domain::repository::{NoteRepository, UserRepository};
use crate::domain::writing::{AssistRequest, AssistResponse, CorrectionRequest, CorrectionResponse};
use crate::infrastructure::config::AuthConfig;
use crate::presentation::middleware::{AuthRejection, AuthenticatedUser};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use std::future::{Ready, ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Services shared by every worker.
pub struct AppState {
    pub auth_service: AuthService,
    pub note_service: NoteService,
    pub writing_service: WritingService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notes: Arc<dyn NoteRepository>,
        pipelines: Pipelines,
        auth: AuthConfig,
    ) -> Self {
        Self {
            auth_service: AuthService::new(users, auth),
            note_service: NoteService::new(notes, pipelines.summarizer),
            writing_service: WritingService::new(pipelines.grammar, pipelines.writer),
        }
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Inference(msg)
            | ApiError::Database(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Inference(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        if status.is_server_error() {
            error!(error = %error_msg, status = %status, "Request failed");
        } else {
            warn!(error = %error_msg, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error_msg,
            details: serde_json::json!({ "message": self.message() }),
        })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            Some(DomainError::Conflict(msg)) => ApiError::Conflict(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Inference(msg)) => ApiError::Inference(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None if err.downcast_ref::<sqlx::Error>().is_some() => {
                ApiError::Database(err.to_string())
            }
            None => ApiError::Internal(err.to_string()),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                let reason = extensions
                    .get::<AuthRejection>()
                    .map(|r| r.0.to_string())
                    .unwrap_or_else(|| "User not authenticated".to_string());
                Err(ApiError::Unauthorized(reason))
            }
        };
        ready(result)
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct DetailResponse {
    detail: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "Welcome to AI Notes!".to_string(),
    })
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[instrument(skip(state), fields(user = %user.email))]
pub async fn list_notes(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let notes = state.note_service.list(&user.email).await.map_err(|e| {
        error!(error = %e, "Failed to list notes");
        e
    })?;
    info!(count = notes.len(), "Notes retrieved");
    Ok(HttpResponse::Ok().json(notes))
}

#[instrument(skip(state, req), fields(user = %user.email, note_id))]
pub async fn create_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<NoteCreate>,
) -> Result<HttpResponse, ApiError> {
    info!(title = %req.title, "Creating note");
    let note = state
        .note_service
        .create(&user.email, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create note");
            e
        })?;
    tracing::Span::current().record("note_id", note.id);
    Ok(HttpResponse::Ok().json(note))
}

#[instrument(skip(state), fields(user = %user.email, note_id = %*path))]
pub async fn delete_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let note_id = path.into_inner();
    state
        .note_service
        .delete(&user.email, note_id)
        .await
        .map_err(|e| {
            warn!(note_id = note_id, error = %e, "Failed to delete note");
            e
        })?;
    Ok(HttpResponse::Ok().json(DetailResponse {
        detail: format!("Note {} deleted", note_id),
    }))
}

#[instrument(skip(state, req), fields(user = %user.email))]
pub async fn correct_grammar(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CorrectionRequest>,
) -> Result<HttpResponse, ApiError> {
    let corrected_text = state
        .writing_service
        .correct(&req.text)
        .await
        .map_err(|e| {
            error!(error = %e, "Grammar correction failed");
            e
        })?;
    Ok(HttpResponse::Ok().json(CorrectionResponse { corrected_text }))
}

#[instrument(skip(state, req), fields(user = %user.email, mode = %req.mode))]
pub async fn generate_assist(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<AssistRequest>,
) -> Result<HttpResponse, ApiError> {
    let completion = state
        .writing_service
        .assist(&req.prompt, &req.mode)
        .await
        .map_err(|e| {
            error!(error = %e, "Writing assistance failed");
            e
        })?;
    Ok(HttpResponse::Ok().json(AssistResponse { completion }))
}

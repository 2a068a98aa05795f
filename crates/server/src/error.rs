use assistant::AssistantError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{project::ProjectError, task::TaskError, user::UserError},
};
use serde::Serialize;
use services::services::auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// `{message}` plus an `error` detail that is only present in development
/// mode.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn dev_mode() -> bool {
    std::env::var("PLANBOARD_ENV").is_ok_and(|env| env.trim() == "development")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::User(err) => match err {
                UserError::EmailTaken => (StatusCode::CONFLICT, "UserError"),
                UserError::Database(DbErr::RecordNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "UserError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "UserError"),
            },
            ApiError::Project(err) => match err {
                ProjectError::ProjectNotFound => (StatusCode::NOT_FOUND, "ProjectError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ProjectError"),
            },
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound => (StatusCode::NOT_FOUND, "TaskError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "TaskError"),
            },
            ApiError::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::Token(_) => {
                    (StatusCode::UNAUTHORIZED, "AuthError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "AuthError"),
            },
            // The chat route pre-checks configuration and raises
            // ServiceUnavailable itself; an unconfigured assistant reaching
            // this point is the generic handler failure.
            ApiError::Assistant(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AssistantError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        let message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::User(err) => err.to_string(),
            ApiError::Project(err) => err.to_string(),
            ApiError::Task(err) => err.to_string(),
            ApiError::Auth(err) => err.to_string(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        let detail = (status_code.is_server_error() && dev_mode()).then(|| self.to_string());
        let body = ErrorBody {
            message,
            error: detail,
        };
        (status_code, Json(body)).into_response()
    }
}

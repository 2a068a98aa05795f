use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, http::auth::AuthUser};
use deployment::Deployment;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct AuthResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub user: User,
    pub token: String,
}

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<AuthResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        payload.name.filter(|v| !v.trim().is_empty()),
        payload.email.filter(|v| !v.trim().is_empty()),
        payload.password.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Please provide name, email and password".to_string(),
        ));
    };

    let password_hash = deployment.auth().hash_password(&password)?;
    let user = User::create(
        &deployment.db().pool,
        &CreateUser {
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password,
        },
        password_hash,
        Uuid::new_v4(),
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered new user");

    let token = deployment.auth().issue_token(user.id)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        payload.email.filter(|v| !v.trim().is_empty()),
        payload.password.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    };

    let credentials =
        User::find_credentials_by_email(&deployment.db().pool, email.trim().to_lowercase().as_str())
            .await?;
    let Some((user, stored_hash)) = credentials else {
        return Err(ApiError::Auth(
            services::services::auth::AuthError::InvalidCredentials,
        ));
    };

    deployment.auth().verify_password(&password, &stored_hash)?;
    let token = deployment.auth().issue_token(user.id)?;
    Ok(Json(AuthResponse { user, token }))
}

pub async fn me(
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<User>, ApiError> {
    Ok(Json(user))
}

/// Routes reachable without a bearer token.
pub fn public_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/auth/me", get(me))
}

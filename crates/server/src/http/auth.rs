use axum::{
    Json,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::user::User;
use deployment::Deployment;
use utils::response::MessageResponse;

use crate::DeploymentImpl;

/// The authenticated caller, resolved from the bearer token and attached
/// to the request extensions for every protected route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
}

fn unauthorized(req: &Request, reason: &'static str) -> Response {
    tracing::warn!(
        path = %req.uri().path(),
        method = %req.method(),
        reason,
        "Unauthorized API request"
    );
    let body = MessageResponse::new("Unauthorized");
    (axum::http::StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

pub async fn require_api_auth(
    State(deployment): State<DeploymentImpl>,
    req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_request_token(&req) else {
        return unauthorized(&req, "missing_token");
    };

    let user_id = match deployment.auth().verify_token(token) {
        Ok(user_id) => user_id,
        Err(_) => return unauthorized(&req, "invalid_token"),
    };

    // The token outliving its account is treated the same as a bad token.
    let user = match User::find_by_id(&deployment.db().pool, user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized(&req, "unknown_user"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to resolve authenticated user");
            return crate::error::ApiError::Database(err).into_response();
        }
    };

    let mut req = req;
    req.extensions_mut().insert(AuthUser(user));
    next.run(req).await
}

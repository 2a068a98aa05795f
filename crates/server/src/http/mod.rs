use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use services::services::config::Config;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utils::response::MessageResponse;

use crate::{DeploymentImpl, routes};

pub mod auth;

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(err) => {
            tracing::warn!(
                frontend_url = %config.frontend_url,
                error = %err,
                "Invalid frontend URL; allowing any origin"
            );
            CorsLayer::permissive()
        }
    }
}

pub fn router(deployment: DeploymentImpl, config: &Config) -> Router {
    let api_routes = Router::new()
        .merge(routes::auth::router())
        .merge(routes::projects::router(&deployment))
        .merge(routes::tasks::router(&deployment))
        .merge(routes::ai::router())
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_api_auth,
        ))
        .merge(routes::auth::public_router())
        .route("/health", get(routes::health::health_check));

    Router::new()
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
    };
    use deployment::Deployment;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::test_support::TestEnvGuard;

    async fn setup_app() -> (TestEnvGuard, Router) {
        let temp_root = std::env::temp_dir().join(format!("planboard-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&temp_root).unwrap();

        let db_path = temp_root.join("db.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let env_guard = TestEnvGuard::new(&temp_root, db_url);

        let deployment = DeploymentImpl::new().await.unwrap();
        let config = deployment.config().read().await.clone();
        let app = router(deployment, &config);

        (env_guard, app)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(app: &Router, name: &str, email: &str) -> (String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["id"].as_str().unwrap().to_string();
        (token, user_id)
    }

    async fn create_project(app: &Router, token: &str, name: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/projects",
            Some(token),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (_guard, app) = setup_app().await;

        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["message"], "Server is running");
    }

    #[tokio::test]
    async fn api_routes_require_bearer_token() {
        let (_guard, app) = setup_app().await;

        let (status, body) = send(&app, Method::GET, "/api/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");

        let (status, _) = send(&app, Method::GET, "/api/projects", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unmatched_routes_return_message_404() {
        let (_guard, app) = setup_app().await;

        let (status, body) = send(&app, Method::GET, "/api/does-not-exist", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn register_login_me_flow() {
        let (_guard, app) = setup_app().await;

        let (token, user_id) = register(&app, "Ada", "ada@example.com").await;

        let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], user_id.as_str());
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("passwordHash").is_none());

        // Same email again conflicts.
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn project_authorization_reports_not_found_before_forbidden() {
        let (_guard, app) = setup_app().await;

        let (ada, ada_id) = register(&app, "Ada", "ada@example.com").await;
        let (mallory, _) = register(&app, "Mallory", "mallory@example.com").await;

        let project_id = create_project(&app, &ada, "Apollo").await;

        // Existing project, non-member: forbidden.
        let uri = format!("/api/projects/{project_id}");
        let (status, _) = send(&app, Method::GET, &uri, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Unknown id: not found, even for a non-member.
        let missing = format!("/api/projects/{}", Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &missing, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Members see the populated project with the owner in members.
        let (status, body) = send(&app, Method::GET, &uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"]["id"], ada_id.as_str());
        assert_eq!(body["members"][0]["id"], ada_id.as_str());

        // Listing is scoped to membership.
        let (_, ada_list) = send(&app, Method::GET, "/api/projects", Some(&ada), None).await;
        assert_eq!(ada_list.as_array().unwrap().len(), 1);
        let (_, mallory_list) =
            send(&app, Method::GET, "/api/projects", Some(&mallory), None).await;
        assert_eq!(mallory_list.as_array().unwrap().len(), 0);

        // Only the owner updates or deletes.
        let (status, _) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&mallory),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&ada),
            Some(json!({ "description": "lunar program" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "lunar program");
        assert_eq!(body["name"], "Apollo");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("deleted"));

        let (status, _) = send(&app, Method::GET, &uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_crud_stats_and_cascade() {
        let (_guard, app) = setup_app().await;

        let (ada, _) = register(&app, "Ada", "ada@example.com").await;
        let (mallory, _) = register(&app, "Mallory", "mallory@example.com").await;
        let project_id = create_project(&app, &ada, "Apollo").await;

        // Required fields enforced with a 400.
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&ada),
            Some(json!({ "project": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("title"));

        // Defaults applied on create.
        let (status, task) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&ada),
            Some(json!({ "title": "Design schema", "project": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "todo");
        assert_eq!(task["priority"], "medium");
        assert_eq!(task["position"], 0);
        assert!(task["assignedTo"].is_null());
        let task_id = task["id"].as_str().unwrap().to_string();

        // Non-members cannot touch tasks of the project.
        let task_uri = format!("/api/tasks/{task_id}");
        let (status, _) = send(&app, Method::GET, &task_uri, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&mallory),
            Some(json!({ "title": "sneaky", "project": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Partial update distinguishes omitted from explicit null.
        let (status, updated) = send(
            &app,
            Method::PUT,
            &task_uri,
            Some(&ada),
            Some(json!({ "dueDate": "2030-01-01T00:00:00Z", "priority": "urgent" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["dueDate"].as_str().is_some());
        assert_eq!(updated["priority"], "urgent");

        let (status, cleared) = send(
            &app,
            Method::PUT,
            &task_uri,
            Some(&ada),
            Some(json!({ "dueDate": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(cleared["dueDate"].is_null());
        assert_eq!(cleared["priority"], "urgent");

        // Listing and stats require membership.
        let list_uri = format!("/api/tasks/project/{project_id}");
        let (status, tasks) = send(&app, Method::GET, &list_uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tasks.as_array().unwrap().len(), 1);
        let (status, _) = send(&app, Method::GET, &list_uri, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let stats_uri = format!("/api/tasks/stats/{project_id}");
        let (status, stats) = send(&app, Method::GET, &stats_uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["todo"], 1);
        assert_eq!(stats["highPriority"], 1);

        // Deleting the project cascades to its tasks.
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            Some(&ada),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, &task_uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ai_routes_validate_and_report_unconfigured_assistant() {
        let (_guard, app) = setup_app().await;
        let (token, _) = register(&app, "Ada", "ada@example.com").await;

        // Validation failures come first.
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/ai/generate-tasks",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/ai/analyze-delays",
            Some(&token),
            Some(json!({ "tasks": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // No API key configured in the test environment: chat reports the
        // service as unavailable, the generators fail as handler errors.
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/chat",
            Some(&token),
            Some(json!({ "message": "help" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("not available"));

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/ai/generate-tasks",
            Some(&token),
            Some(json!({ "projectDescription": "Build a CRM" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use db::models::{
    project::{Project, ProjectError},
    task::{CreateTask, Subtask, Task, TaskError, TaskPriority, TaskStats, TaskStatus, UpdateTask},
};
use deployment::Deployment;
use serde::Deserialize;
use utils::response::MessageResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::AuthUser, middleware::load_task_middleware,
    permissions::require_member,
};

async fn load_project_for_task(
    deployment: &DeploymentImpl,
    project_id: Uuid,
) -> Result<Project, ApiError> {
    Ok(Project::find_by_id(&deployment.db().pool, project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?)
}

pub async fn get_tasks_by_project(
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<Vec<Task>>, ApiError> {
    let project = load_project_for_task(&deployment, project_id).await?;
    require_member(&project, &user, "access this project")?;

    let tasks = Task::find_by_project_id(&deployment.db().pool, project_id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<Task>, ApiError> {
    let project = load_project_for_task(&deployment, task.project_id).await?;
    require_member(&project, &user, "access this task")?;
    Ok(Json(task))
}

/// Create body with every field optional so missing required fields get a
/// 400 with a message instead of a bare deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub project: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub subtasks: Option<Vec<Subtask>>,
}

pub async fn create_task(
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, ResponseJson<Task>), ApiError> {
    let (Some(title), Some(project_id)) = (
        payload.title.filter(|title| !title.trim().is_empty()),
        payload.project,
    ) else {
        return Err(ApiError::BadRequest(
            "Please provide title and project".to_string(),
        ));
    };

    let project = load_project_for_task(&deployment, project_id).await?;
    require_member(&project, &user, "create tasks in this project")?;

    tracing::debug!("Creating task '{}' in project {}", title, project_id);

    let data = CreateTask {
        title,
        project: project_id,
        description: payload.description,
        status: payload.status,
        priority: payload.priority,
        due_date: payload.due_date,
        assigned_to: payload.assigned_to,
        subtasks: payload.subtasks,
    };
    let task = Task::create(&deployment.db().pool, &data, user.id, Uuid::new_v4()).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<Task>, ApiError> {
    let project = load_project_for_task(&deployment, task.project_id).await?;
    require_member(&project, &user, "update this task")?;

    let updated = Task::update(&deployment.db().pool, task.id, &payload).await?;
    Ok(Json(updated))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    let project = load_project_for_task(&deployment, task.project_id).await?;
    require_member(&project, &user, "delete this task")?;

    let rows_affected = Task::delete(&deployment.db().pool, task.id).await?;
    if rows_affected == 0 {
        return Err(TaskError::TaskNotFound.into());
    }

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

pub async fn get_task_stats(
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<TaskStats>, ApiError> {
    let project = load_project_for_task(&deployment, project_id).await?;
    require_member(&project, &user, "access this project")?;

    let stats = Task::stats_for_project(&deployment.db().pool, project_id).await?;
    Ok(Json(stats))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_task_middleware::<DeploymentImpl>,
        ));

    let tasks_router = Router::new()
        .route("/", post(create_task))
        .route("/project/{project_id}", get(get_tasks_by_project))
        .route("/stats/{project_id}", get(get_task_stats))
        .nest("/{id}", task_id_router);

    Router::new().nest("/tasks", tasks_router)
}

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::project::{CreateProject, Project, ProjectError, UpdateProject},
};
use deployment::Deployment;
use serde::Deserialize;
use utils::response::MessageResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    http::auth::AuthUser,
    middleware::load_project_middleware,
    permissions::{require_member, require_owner},
};

pub async fn get_projects(
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<Vec<Project>>, ApiError> {
    let projects = Project::find_for_member(&deployment.db().pool, user.id).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<Project>, ApiError> {
    require_member(&project, &user, "access this project")?;
    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

pub async fn create_project(
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, ResponseJson<Project>), ApiError> {
    let Some(name) = payload.name.filter(|name| !name.trim().is_empty()) else {
        return Err(ApiError::BadRequest(
            "Please provide a project name".to_string(),
        ));
    };

    tracing::debug!("Creating project '{}'", name);

    let data = CreateProject {
        name,
        description: payload.description,
        color: payload.color,
    };

    // Project row and owner membership land together or not at all.
    let tx = deployment.db().pool.begin().await?;
    let project = Project::create(&tx, &data, uuid::Uuid::new_v4(), user.id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    Extension(existing): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<Project>, ApiError> {
    require_owner(&existing, &user, "update this project")?;
    let project = Project::update(&deployment.db().pool, existing.id, &payload).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    require_owner(&project, &user, "delete this project")?;

    // Tasks and membership rows go in the same transaction, so a failure
    // cannot leave orphaned tasks behind.
    let tx = deployment.db().pool.begin().await?;
    let rows_affected = Project::delete(&tx, project.id).await?;
    tx.commit().await?;

    if rows_affected == 0 {
        return Err(ProjectError::ProjectNotFound.into());
    }

    Ok(Json(MessageResponse::new(
        "Project and associated tasks deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let project_id_router = Router::new()
        .route(
            "/",
            get(get_project).put(update_project).delete(delete_project),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ));

    let projects_router = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{id}", project_id_router);

    Router::new().nest("/projects", projects_router)
}

use assistant::{DelayAnalysis, SubtaskSuggestion, TaskDigest, TaskSuggestion};
use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTasksRequest {
    pub project_description: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct GenerateTasksResponse {
    pub tasks: Vec<TaskSuggestion>,
}

pub async fn generate_tasks(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<GenerateTasksRequest>,
) -> Result<ResponseJson<GenerateTasksResponse>, ApiError> {
    let Some(description) = payload
        .project_description
        .filter(|text| !text.trim().is_empty())
    else {
        return Err(ApiError::BadRequest(
            "Please provide a project description".to_string(),
        ));
    };

    let outcome = deployment
        .assistant()
        .generate_tasks(&description, payload.context.as_deref())
        .await?;

    Ok(Json(GenerateTasksResponse {
        tasks: outcome.into_inner(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSubtasksRequest {
    pub task_title: Option<String>,
    pub task_description: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct GenerateSubtasksResponse {
    pub subtasks: Vec<SubtaskSuggestion>,
}

pub async fn generate_subtasks(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<GenerateSubtasksRequest>,
) -> Result<ResponseJson<GenerateSubtasksResponse>, ApiError> {
    let Some(title) = payload.task_title.filter(|text| !text.trim().is_empty()) else {
        return Err(ApiError::BadRequest(
            "Please provide a task title".to_string(),
        ));
    };

    let outcome = deployment
        .assistant()
        .generate_subtasks(&title, payload.task_description.as_deref())
        .await?;

    Ok(Json(GenerateSubtasksResponse {
        subtasks: outcome.into_inner(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDelaysRequest {
    pub tasks: Option<Vec<TaskDigest>>,
    pub project_context: Option<String>,
}

pub async fn analyze_delays(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<AnalyzeDelaysRequest>,
) -> Result<ResponseJson<DelayAnalysis>, ApiError> {
    let Some(tasks) = payload.tasks.filter(|tasks| !tasks.is_empty()) else {
        return Err(ApiError::BadRequest(
            "Please provide tasks to analyze".to_string(),
        ));
    };

    let analysis = deployment
        .assistant()
        .analyze_delays(&tasks, payload.project_context.as_deref())
        .await?;

    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ChatRequest>,
) -> Result<ResponseJson<ChatResponse>, ApiError> {
    let Some(message) = payload.message.filter(|text| !text.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Please provide a message".to_string()));
    };

    // Chat is the one operation that reports a missing credential as an
    // availability problem instead of a handler failure.
    if !deployment.assistant().is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "AI service is not available. Please configure an assistant API key.".to_string(),
        ));
    }

    let reply = deployment
        .assistant()
        .chat(&message, payload.context.as_deref())
        .await?;

    Ok(Json(ChatResponse { reply }))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/ai/generate-tasks", post(generate_tasks))
        .route("/ai/generate-subtasks", post(generate_subtasks))
        .route("/ai/analyze-delays", post(analyze_delays))
        .route("/ai/chat", post(chat))
}

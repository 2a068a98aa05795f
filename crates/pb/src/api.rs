use anyhow::{Context, anyhow};
use db::{models::task::Task, types::TaskStatus};
use serde::Serialize;
use uuid::Uuid;

use crate::board::PositionWrite;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskPatch {
    position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn get_task(&self, task_id: Uuid) -> anyhow::Result<Task> {
        let response = self
            .http
            .get(format!("{}/api/tasks/{task_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach the server")?;
        if !response.status().is_success() {
            return Err(anyhow!("Fetching task failed with status {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn list_project_tasks(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let response = self
            .http
            .get(format!("{}/api/tasks/project/{project_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach the server")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Listing tasks failed with status {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn apply_write(&self, write: &PositionWrite) -> anyhow::Result<()> {
        let patch = TaskPatch {
            position: write.position,
            status: write.status,
        };
        let response = self
            .http
            .put(format!("{}/api/tasks/{}", self.base_url, write.task))
            .bearer_auth(&self.token)
            .json(&patch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Position update failed with status {}",
                response.status()
            ));
        }
        Ok(())
    }
}

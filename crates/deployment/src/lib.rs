//! Process-level service container. Everything with a lifecycle (the
//! database pool, the assistant client, credential handling, config) is
//! constructed exactly once in [`Deployment::new`] and handed to request
//! handlers through the router state. No module-level mutable state.

use std::sync::Arc;

use assistant::AssistantService;
use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{auth::AuthService, config::Config};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    fn assistant(&self) -> &AssistantService;
}

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    auth: AuthService,
    assistant: AssistantService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env();
        let auth = AuthService::new(config.jwt_secret.clone());

        let assistant = AssistantService::from_env();
        if !assistant.is_configured() {
            tracing::warn!("No assistant API key found; AI features are disabled");
        }

        let db = DBService::new().await?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            db,
            auth,
            assistant,
        })
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn assistant(&self) -> &AssistantService {
        &self.assistant
    }
}

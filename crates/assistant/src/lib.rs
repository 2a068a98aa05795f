//! Thin adapter over an OpenAI-compatible chat-completions API.
//!
//! The client is constructed once at process bootstrap and injected into
//! handlers; there is no module-level state. When no API key is configured
//! every operation fails fast with [`AssistantError::NotConfigured`]
//! before any network activity. Upstream or decode failures on the three
//! generation operations degrade to fixed fallback payloads instead of
//! surfacing errors.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod extract;
pub mod prompts;
mod types;

pub use types::{
    AiOutcome, DelayAdvice, DelayAnalysis, SubtaskSuggestion, TaskDigest, TaskSuggestion,
    fallback_delay_advice, fallback_subtask_suggestions, fallback_task_suggestions,
};

const API_KEY_ENV: &str = "PLANBOARD_OPENAI_API_KEY";
const API_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";
const API_BASE_ENV: &str = "PLANBOARD_OPENAI_API_BASE";
const API_BASE_FALLBACK_ENV: &str = "OPENAI_API_BASE";
const MODEL_ENV: &str = "PLANBOARD_OPENAI_MODEL";
const MODEL_FALLBACK_ENV: &str = "OPENAI_DEFAULT_MODEL";

const DEFAULT_API_BASE: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const TEMPERATURE: f32 = 0.7;
const GENERATE_TASKS_MAX_TOKENS: u32 = 1000;
const GENERATE_SUBTASKS_MAX_TOKENS: u32 = 500;
const ANALYZE_DELAYS_MAX_TOKENS: u32 = 800;
const CHAT_MAX_TOKENS: u32 = 500;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(
        "Assistant is not configured. Set {API_KEY_ENV} (or {API_KEY_FALLBACK_ENV}) to enable AI features"
    )]
    NotConfigured,
    #[error("Assistant request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Assistant request failed with status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("Assistant returned an empty completion")]
    EmptyCompletion,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl AssistantConfig {
    /// `None` when no API key is present; the service then rejects every
    /// operation without touching the network.
    pub fn from_env() -> Option<Self> {
        let api_key = resolve_env(API_KEY_ENV, API_KEY_FALLBACK_ENV)?;
        let api_base = resolve_env(API_BASE_ENV, API_BASE_FALLBACK_ENV)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = resolve_env(MODEL_ENV, MODEL_FALLBACK_ENV)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self {
            api_base,
            api_key,
            model,
        })
    }
}

fn resolve_env(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            std::env::var(fallback)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

fn completions_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        format!("{trimmed}/chat/completions")
    } else {
        format!("{trimmed}/v1/chat/completions")
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorResponse {
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct AssistantService {
    http: reqwest::Client,
    config: Option<AssistantConfig>,
}

impl AssistantService {
    pub fn new(config: Option<AssistantConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(AssistantConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AssistantError> {
        let config = self.config.as_ref().ok_or(AssistantError::NotConfigured)?;

        let request = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens,
        };

        let response = self
            .http
            .post(completions_url(&config.api_base))
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = parse_upstream_error(&body)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(AssistantError::UpstreamStatus { status, message });
        }

        let data = response.json::<ChatResponse>().await?;
        data.choices
            .iter()
            .find_map(|choice| choice.message.as_ref()?.content.as_ref())
            .map(|text| text.to_string())
            .filter(|text| !text.trim().is_empty())
            .ok_or(AssistantError::EmptyCompletion)
    }

    /// Generate 5-8 task suggestions from a project description.
    pub async fn generate_tasks(
        &self,
        project_description: &str,
        context: Option<&str>,
    ) -> Result<AiOutcome<Vec<TaskSuggestion>>, AssistantError> {
        if !self.is_configured() {
            return Err(AssistantError::NotConfigured);
        }

        let prompt = prompts::generate_tasks_prompt(project_description, context);
        match self
            .complete(prompts::GENERATE_TASKS_SYSTEM, &prompt, GENERATE_TASKS_MAX_TOKENS)
            .await
        {
            Ok(text) => Ok(match extract::parse_array(&text) {
                Some(tasks) => AiOutcome::Generated(tasks),
                None => {
                    tracing::warn!("Task generation completion was not decodable JSON");
                    AiOutcome::Fallback(fallback_task_suggestions())
                }
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Task generation failed; returning fallback");
                Ok(AiOutcome::Fallback(fallback_task_suggestions()))
            }
        }
    }

    /// Break a task down into 3-6 subtask titles.
    pub async fn generate_subtasks(
        &self,
        task_title: &str,
        task_description: Option<&str>,
    ) -> Result<AiOutcome<Vec<SubtaskSuggestion>>, AssistantError> {
        if !self.is_configured() {
            return Err(AssistantError::NotConfigured);
        }

        let prompt = prompts::generate_subtasks_prompt(task_title, task_description);
        match self
            .complete(
                prompts::GENERATE_SUBTASKS_SYSTEM,
                &prompt,
                GENERATE_SUBTASKS_MAX_TOKENS,
            )
            .await
        {
            Ok(text) => Ok(match extract::parse_array(&text) {
                Some(subtasks) => AiOutcome::Generated(subtasks),
                None => {
                    tracing::warn!("Subtask generation completion was not decodable JSON");
                    AiOutcome::Fallback(fallback_subtask_suggestions())
                }
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Subtask generation failed; returning fallback");
                Ok(AiOutcome::Fallback(fallback_subtask_suggestions()))
            }
        }
    }

    /// Analyze overdue tasks. Short-circuits to an on-track result without
    /// any upstream call when nothing is overdue.
    pub async fn analyze_delays(
        &self,
        tasks: &[TaskDigest],
        project_context: Option<&str>,
    ) -> Result<DelayAnalysis, AssistantError> {
        if !self.is_configured() {
            return Err(AssistantError::NotConfigured);
        }

        let now = Utc::now();
        let overdue: Vec<TaskDigest> = tasks
            .iter()
            .filter(|task| task.is_overdue(now))
            .cloned()
            .collect();

        if overdue.is_empty() {
            return Ok(DelayAnalysis::on_track());
        }

        let prompt = prompts::analyze_delays_prompt(&overdue, project_context);
        let advice = match self
            .complete(prompts::ANALYZE_DELAYS_SYSTEM, &prompt, ANALYZE_DELAYS_MAX_TOKENS)
            .await
        {
            Ok(text) => extract::parse_object(&text).unwrap_or_else(|| {
                tracing::warn!("Delay analysis completion was not decodable JSON");
                fallback_delay_advice()
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Delay analysis failed; returning fallback");
                fallback_delay_advice()
            }
        };

        Ok(DelayAnalysis::from_advice(overdue.len(), advice))
    }

    /// Free-form chat with the project assistant persona. Unlike the
    /// generation operations there is no fallback payload; upstream
    /// failures surface to the caller.
    pub async fn chat(
        &self,
        message: &str,
        context: Option<&str>,
    ) -> Result<String, AssistantError> {
        let system = prompts::chat_system_prompt(context);
        self.complete(&system, message, CHAT_MAX_TOKENS).await
    }
}

fn parse_upstream_error(body: &str) -> Option<String> {
    let parsed: UpstreamErrorResponse = serde_json::from_str(body).ok()?;
    parsed.error.and_then(|err| err.message)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Result of an assistant operation: either the typed payload decoded from
/// the completion, or the fixed fallback payload when the upstream call or
/// the decode failed. Callers that only serve the payload use
/// `into_inner`; tests discriminate on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome<T> {
    Generated(T),
    Fallback(T),
}

impl<T> AiOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            AiOutcome::Generated(value) | AiOutcome::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AiOutcome::Fallback(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct SubtaskSuggestion {
    pub title: String,
}

/// Digest of a task as submitted by the client for delay analysis. Only
/// the fields the analysis looks at are typed; anything else in the
/// request is ignored.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskDigest {
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDigest {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date
            .is_some_and(|due| due < now && self.status.as_deref() != Some("done"))
    }
}

/// The advice portion of a delay analysis, decoded from the completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DelayAdvice {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DelayAnalysis {
    pub has_delays: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_recommendation: Option<String>,
}

impl DelayAnalysis {
    pub fn on_track() -> Self {
        Self {
            has_delays: false,
            overdue_count: None,
            message: Some("All tasks are on track! No delays detected.".to_string()),
            analysis: None,
            suggestions: Vec::new(),
            priority_recommendation: None,
        }
    }

    pub fn from_advice(overdue_count: usize, advice: DelayAdvice) -> Self {
        Self {
            has_delays: true,
            overdue_count: Some(overdue_count),
            message: None,
            analysis: Some(advice.analysis),
            suggestions: advice.suggestions,
            priority_recommendation: advice.priority_recommendation,
        }
    }
}

pub fn fallback_task_suggestions() -> Vec<TaskSuggestion> {
    vec![TaskSuggestion {
        title: "Review generated tasks".to_string(),
        description: "AI response needs manual review".to_string(),
        priority: "medium".to_string(),
        estimated_time: Some("1 hour".to_string()),
    }]
}

pub fn fallback_subtask_suggestions() -> Vec<SubtaskSuggestion> {
    [
        "Review task requirements",
        "Plan implementation approach",
        "Execute and test",
    ]
    .into_iter()
    .map(|title| SubtaskSuggestion {
        title: title.to_string(),
    })
    .collect()
}

pub fn fallback_delay_advice() -> DelayAdvice {
    DelayAdvice {
        analysis: "Multiple tasks are overdue. Consider reprioritizing and reallocating resources."
            .to_string(),
        suggestions: vec![
            "Review task priorities and adjust accordingly".to_string(),
            "Break down large tasks into smaller milestones".to_string(),
            "Consider delegating tasks to team members".to_string(),
        ],
        priority_recommendation: Some("Focus on high-priority tasks first".to_string()),
    }
}

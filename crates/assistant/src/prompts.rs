//! Prompt text for the three generation operations and chat. The wording
//! tracks what the web client expects back: JSON with the documented
//! properties.

use crate::types::TaskDigest;

pub const GENERATE_TASKS_SYSTEM: &str = "You are a helpful project management assistant that \
generates structured task lists. Always respond with valid JSON.";

pub const GENERATE_SUBTASKS_SYSTEM: &str = "You are a helpful assistant that breaks down tasks \
into smaller subtasks. Always respond with valid JSON.";

pub const ANALYZE_DELAYS_SYSTEM: &str = "You are a project management consultant analyzing task \
delays and providing practical solutions. Always respond with valid JSON.";

pub fn generate_tasks_prompt(project_description: &str, context: Option<&str>) -> String {
    let context_line = match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Additional Context: {context}\n"),
        None => String::new(),
    };
    format!(
        "You are a project management assistant. Generate a list of tasks for the following project.\n\n\
Project Description: {project_description}\n\
{context_line}\n\
Generate 5-8 actionable tasks with the following details for each:\n\
- Title (concise, action-oriented)\n\
- Description (brief explanation)\n\
- Priority (low, medium, high, or urgent)\n\
- Estimated completion time\n\n\
Format your response as a JSON array of task objects with properties: title, description, priority, estimatedTime."
    )
}

pub fn generate_subtasks_prompt(task_title: &str, task_description: Option<&str>) -> String {
    let description_line = match task_description.filter(|d| !d.trim().is_empty()) {
        Some(description) => format!("Description: {description}\n"),
        None => String::new(),
    };
    format!(
        "Break down the following task into smaller, actionable subtasks:\n\n\
Task: {task_title}\n\
{description_line}\n\
Generate 3-6 subtasks that would help complete this main task. Each subtask should be:\n\
- Specific and actionable\n\
- Smaller in scope than the main task\n\
- Logically ordered\n\n\
Format your response as a JSON array of objects with property: title."
    )
}

pub fn analyze_delays_prompt(overdue: &[TaskDigest], project_context: Option<&str>) -> String {
    let task_summary = overdue
        .iter()
        .map(|task| {
            format!(
                "- {} (Priority: {}, Due: {})",
                task.title,
                task.priority.as_deref().unwrap_or("unknown"),
                task.due_date
                    .map(|due| due.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let context_line = match project_context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Project Context: {context}\n"),
        None => String::new(),
    };
    format!(
        "Analyze the following overdue tasks and provide actionable suggestions to get back on track:\n\n\
{task_summary}\n\n\
{context_line}\n\
Provide:\n\
1. A brief analysis of potential causes\n\
2. 3-5 specific, actionable suggestions to address delays\n\
3. Priority recommendations\n\n\
Format your response as JSON with properties: analysis, suggestions (array of strings), priorityRecommendation."
    )
}

pub fn chat_system_prompt(context: Option<&str>) -> String {
    let mut prompt = "You are a helpful project management assistant. Help users with task \
planning, project organization, and productivity tips."
        .to_string();
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(" Context: {context}"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_lines_are_omitted_when_absent() {
        let with = generate_tasks_prompt("Build a CRM", Some("small team"));
        assert!(with.contains("Additional Context: small team"));

        let without = generate_tasks_prompt("Build a CRM", None);
        assert!(!without.contains("Additional Context"));
        assert!(without.contains("Project Description: Build a CRM"));
    }

    #[test]
    fn chat_system_prompt_appends_context() {
        assert!(!chat_system_prompt(None).contains("Context:"));
        assert!(chat_system_prompt(Some("sprint 4")).contains("Context: sprint 4"));
    }
}

//! Strict decode of free-form completion text into typed payloads.
//!
//! Language models wrap JSON in prose and markdown fences; the contract
//! here is: try the whole trimmed text first, then the outermost
//! bracket-delimited (or brace-delimited) substring. Anything that still
//! fails to deserialize is the caller's cue to use its fallback payload.

use serde::de::DeserializeOwned;

fn delimited_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

pub fn parse_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let trimmed = text.trim();
    if let Ok(parsed) = serde_json::from_str(trimmed) {
        return Some(parsed);
    }
    delimited_slice(trimmed, '[', ']').and_then(|slice| serde_json::from_str(slice).ok())
}

pub fn parse_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();
    if let Ok(parsed) = serde_json::from_str(trimmed) {
        return Some(parsed);
    }
    delimited_slice(trimmed, '{', '}').and_then(|slice| serde_json::from_str(slice).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DelayAdvice, SubtaskSuggestion, TaskSuggestion};

    #[test]
    fn parses_bare_json_array() {
        let text = r#"[{"title": "Set up CI", "description": "", "priority": "high"}]"#;
        let tasks: Vec<TaskSuggestion> = parse_array(text).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Set up CI");
        assert_eq!(tasks[0].priority, "high");
    }

    #[test]
    fn extracts_array_from_markdown_fence() {
        let text = "Here are your tasks:\n```json\n[{\"title\": \"Design schema\"}]\n```\nGood luck!";
        let tasks: Vec<SubtaskSuggestion> = parse_array(text).unwrap();
        assert_eq!(tasks[0].title, "Design schema");
    }

    #[test]
    fn extracts_object_from_prose() {
        let text = "Based on the data: {\"analysis\": \"Scope creep\", \"suggestions\": [\"cut scope\"]} hope that helps.";
        let advice: DelayAdvice = parse_object(text).unwrap();
        assert_eq!(advice.analysis, "Scope creep");
        assert_eq!(advice.suggestions, vec!["cut scope".to_string()]);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let tasks: Vec<TaskSuggestion> = parse_array(r#"[{"title": "Just a title"}]"#).unwrap();
        assert_eq!(tasks[0].priority, "medium");
        assert_eq!(tasks[0].description, "");
        assert!(tasks[0].estimated_time.is_none());
    }

    #[test]
    fn garbage_yields_none() {
        assert!(parse_array::<TaskSuggestion>("I could not produce JSON, sorry.").is_none());
        assert!(parse_object::<DelayAdvice>("] backwards [").is_none());
        assert!(parse_array::<TaskSuggestion>("[not json]").is_none());
    }
}

//! SeaORM entities, one module per table.

pub mod admin;
pub mod analytics_event;
pub mod category;
pub mod comment;
pub mod post;
pub mod setting;
pub mod tutorial;
pub mod user_activity;

use quill_core::domain::Difficulty;

pub(crate) fn tags_to_json(tags: Vec<String>) -> serde_json::Value {
    serde_json::Value::from(tags)
}

/// Non-string entries are dropped rather than failing the whole row.
pub(crate) fn tags_from_json(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn difficulty_from_column(value: Option<String>) -> Option<Difficulty> {
    value.and_then(|d| d.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_survive_json_column() {
        let json = tags_to_json(vec!["rust".into(), "web".into()]);
        assert_eq!(tags_from_json(json), vec!["rust", "web"]);
        assert!(tags_from_json(serde_json::json!({"oops": 1})).is_empty());
        assert_eq!(tags_from_json(serde_json::json!(["a", 3])), vec!["a"]);
    }

    #[test]
    fn unknown_difficulty_reads_as_none() {
        assert_eq!(difficulty_from_column(Some("advanced".into())), Some(Difficulty::Advanced));
        assert_eq!(difficulty_from_column(Some("expert".into())), None);
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub order_index: i64,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Mid,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Mid => "mid",
            Priority::High => "high",
        }
    }

    /// Next step in the none → low → mid → high → none cycle.
    pub fn next(self) -> Self {
        match self {
            Priority::None => Priority::Low,
            Priority::Low => Priority::Mid,
            Priority::Mid => Priority::High,
            Priority::High => Priority::None,
        }
    }
}

/// Ordering strategy for listing tasks, carried as the `sortBy` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Default,
    Priority,
    DueDate,
}

impl SortMode {
    /// Parses a `sortBy` value. Anything unrecognized falls back to `Default`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "priority" => SortMode::Priority,
            "dueDate" => SortMode::DueDate,
            _ => SortMode::Default,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::Priority => "priority",
            SortMode::DueDate => "dueDate",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Default => SortMode::Priority,
            SortMode::Priority => SortMode::DueDate,
            SortMode::DueDate => SortMode::Default,
        }
    }

    pub(crate) fn order_clause(self) -> &'static str {
        match self {
            SortMode::Default => "ORDER BY order_index ASC, created_at DESC, id DESC",
            SortMode::Priority => {
                "ORDER BY
                    CASE priority
                        WHEN 'high' THEN 1
                        WHEN 'mid' THEN 2
                        WHEN 'low' THEN 3
                        ELSE 4
                    END,
                    order_index ASC"
            }
            SortMode::DueDate => {
                "ORDER BY
                    CASE WHEN due_date IS NULL THEN 1 ELSE 0 END,
                    due_date ASC,
                    order_index ASC"
            }
        }
    }
}

/// Body of a create request. A missing `text` deserializes as empty and is
/// rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Partial update. Absent fields are left untouched.
///
/// `due_date` distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`), which clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub todos: Vec<ReorderEntry>,
}

impl ReorderRequest {
    pub fn from_ids(ids: &[i64]) -> Self {
        Self {
            todos: ids.iter().map(|&id| ReorderEntry { id }).collect(),
        }
    }

    pub fn ids(&self) -> Vec<i64> {
        self.todos.iter().map(|entry| entry.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("default", SortMode::Default)]
    #[case("priority", SortMode::Priority)]
    #[case("dueDate", SortMode::DueDate)]
    #[case("duedate", SortMode::Default)]
    #[case("", SortMode::Default)]
    fn sort_param_falls_back_to_default(#[case] param: &str, #[case] expected: SortMode) {
        assert_eq!(SortMode::from_param(param), expected);
    }

    #[test]
    fn patch_tells_null_due_date_from_missing() {
        let cleared: TaskPatch = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let untouched: TaskPatch = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(untouched.due_date, None);
        assert_eq!(untouched.completed, Some(true));

        let set: TaskPatch = serde_json::from_str(r#"{"due_date": "2026-03-01"}"#).unwrap();
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2026, 3, 1)));
    }

    #[test]
    fn patch_serializes_only_supplied_fields() {
        let patch = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"due_date":null}"#
        );
    }

    #[test]
    fn new_task_defaults() {
        let task: NewTask = serde_json::from_str(r#"{"text": "Buy milk"}"#).unwrap();
        assert_eq!(task, NewTask::new("Buy milk"));
        assert_eq!(task.priority, Priority::None);

        let missing: NewTask = serde_json::from_str("{}").unwrap();
        assert!(missing.text.is_empty());
    }

    #[test]
    fn reorder_request_requires_an_array() {
        assert!(serde_json::from_str::<ReorderRequest>(r#"{"todos": 3}"#).is_err());
        assert!(serde_json::from_str::<ReorderRequest>("{}").is_err());

        let request: ReorderRequest =
            serde_json::from_str(r#"{"todos": [{"id": 3}, {"id": 1}]}"#).unwrap();
        assert_eq!(request.ids(), vec![3, 1]);
    }

    #[test]
    fn priority_cycles_back_to_none() {
        let mut priority = Priority::None;
        for _ in 0..4 {
            priority = priority.next();
        }
        assert_eq!(priority, Priority::None);
        assert_eq!(Priority::Mid.as_str(), "mid");
    }
}

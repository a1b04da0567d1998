use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::VeryHigh => "very_high",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "very_high" => Some(Priority::VeryHigh),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// Task record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub deadline: Date,
    pub description: Option<String>,
    pub priority: Priority,
    pub is_completed: bool,
    pub user_id: i64, // owner
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub deadline: Date,
    pub description: Option<String>,
    pub priority: Priority,
    pub is_completed: bool,
    pub user_id: i64,
}

/// Partial task update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub deadline: Option<Date>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

impl TodoChanges {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(v) = self.title {
            todo.title = v;
        }
        if let Some(v) = self.deadline {
            todo.deadline = v;
        }
        if let Some(v) = self.description {
            todo.description = Some(v);
        }
        if let Some(v) = self.priority {
            todo.priority = v;
        }
        if let Some(v) = self.is_completed {
            todo.is_completed = v;
        }
    }
}

/// Search criteria. Text fields match case-insensitive substrings, the rest
/// match exactly. `owner` restricts results to one user's tasks.
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub title: Option<String>,
    pub deadline: Option<Date>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub is_completed: Option<bool>,
    pub owner: Option<i64>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        fn contains(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.title.as_deref().map_or(true, |t| contains(&todo.title, t))
            && self.deadline.map_or(true, |d| todo.deadline == d)
            && self.description.as_deref().map_or(true, |d| {
                todo.description.as_deref().map_or(false, |desc| contains(desc, d))
            })
            && self
                .priority
                .as_deref()
                .map_or(true, |p| contains(todo.priority.as_str(), p))
            && self.is_completed.map_or(true, |c| todo.is_completed == c)
            && self.owner.map_or(true, |o| todo.user_id == o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn todo() -> Todo {
        Todo {
            id: 7,
            title: "Write spec".into(),
            deadline: date!(2025 - 01 - 01),
            description: Some("Draft the API section".into()),
            priority: Priority::VeryHigh,
            is_completed: false,
            user_id: 3,
        }
    }

    #[test]
    fn priority_uses_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Priority::VeryHigh).unwrap(), "\"very_high\"");
        let p: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(p, Priority::Low);
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
    }

    #[test]
    fn filter_matches_substrings_case_insensitively() {
        let t = todo();
        let f = TodoFilter {
            title: Some("SPEC".into()),
            priority: Some("high".into()),
            ..Default::default()
        };
        assert!(f.matches(&t));

        let f = TodoFilter {
            description: Some("api".into()),
            deadline: Some(date!(2025 - 01 - 01)),
            is_completed: Some(false),
            ..Default::default()
        };
        assert!(f.matches(&t));
    }

    #[test]
    fn filter_rejects_on_any_mismatch() {
        let t = todo();
        assert!(!TodoFilter {
            deadline: Some(date!(2025 - 01 - 02)),
            ..Default::default()
        }
        .matches(&t));
        assert!(!TodoFilter {
            owner: Some(4),
            ..Default::default()
        }
        .matches(&t));

        let mut no_desc = t.clone();
        no_desc.description = None;
        assert!(!TodoFilter {
            description: Some("draft".into()),
            ..Default::default()
        }
        .matches(&no_desc));
    }

    #[test]
    fn changes_only_touch_present_fields() {
        let mut t = todo();
        TodoChanges {
            is_completed: Some(true),
            ..Default::default()
        }
        .apply(&mut t);
        assert!(t.is_completed);
        assert_eq!(t.title, "Write spec");
        assert_eq!(t.priority, Priority::VeryHigh);
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Theme preference persisted alongside the task list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// One to-do item. `id` and `created_at` are fixed at creation; only
/// `title` and `completed` change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub completed: bool,

    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Task {
    /// Caller is responsible for normalizing `title` first; this does not
    /// reject empty strings.
    pub fn new(title: String, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            completed: false,
            created_at: now_ms,
        }
    }
}

/// Collapses internal whitespace runs to a single space and trims the ends.
/// An all-whitespace input comes back empty.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::normalize_title;

    #[test]
    fn normalization_collapses_and_trims() {
        assert_eq!(normalize_title("  hello   world  "), "hello world");
        assert_eq!(normalize_title("one\t\ntwo"), "one two");
        assert_eq!(normalize_title("plain"), "plain");
    }

    #[test]
    fn whitespace_only_normalizes_to_empty() {
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("\t\n"), "");
    }
}

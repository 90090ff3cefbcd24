use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::{Task, Theme};

/// File-per-slot store: two string-valued slots under one data directory,
/// one for the serialized task list and one for the theme preference.
#[derive(Debug)]
pub struct SlotStore {
    pub data_dir: PathBuf,
    pub theme_path: PathBuf,
    pub tasks_path: PathBuf,
}

impl SlotStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let theme_path = data_dir.join("theme.slot");
        let tasks_path = data_dir.join("todos.slot");

        if !theme_path.exists() {
            fs::write(&theme_path, "")?;
        }
        if !tasks_path.exists() {
            fs::write(&tasks_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            theme = %theme_path.display(),
            tasks = %tasks_path.display(),
            "opened slot store"
        );

        Ok(Self {
            data_dir,
            theme_path,
            tasks_path,
        })
    }

    /// `Dark` only when the slot holds exactly `dark`; anything else,
    /// including a missing or unreadable slot, falls back to `Light`.
    #[tracing::instrument(skip(self))]
    pub fn load_theme(&self) -> Theme {
        let raw = match fs::read_to_string(&self.theme_path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "theme slot unreadable; defaulting to light");
                return Theme::Light;
            }
        };

        if raw == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn save_theme(&self, theme: Theme) -> anyhow::Result<()> {
        fs::write(&self.theme_path, theme.as_str())
            .with_context(|| format!("failed writing {}", self.theme_path.display()))
    }

    /// Loads whatever the task slot holds, dropping entries that do not
    /// survive projection. Corruption is never an error here: the worst
    /// outcome is an empty list.
    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> Vec<Task> {
        let raw = match fs::read_to_string(&self.tasks_path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "task slot unreadable; starting empty");
                return Vec::new();
            }
        };

        let now_ms = chrono::Utc::now().timestamp_millis();
        let candidates = parse_task_slot(&raw);
        let total = candidates.len();
        let tasks: Vec<Task> = candidates
            .iter()
            .filter_map(|value| project_task(value, now_ms))
            .collect();

        if tasks.len() < total {
            warn!(
                dropped = total - tasks.len(),
                kept = tasks.len(),
                "dropped malformed entries from task slot"
            );
        }
        debug!(count = tasks.len(), "loaded tasks");
        tasks
    }

    /// Serializes the full list and atomically replaces the slot file.
    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(count = tasks.len(), "saving task slot");

        let dir = self
            .tasks_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string(tasks)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;

        temp.persist(&self.tasks_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.tasks_path.display(), err))?;

        Ok(())
    }
}

/// Stage one of the defensive decode: loose parse of the raw slot text.
/// Empty, unparsable, or non-array content yields no candidates.
pub fn parse_task_slot(raw: &str) -> Vec<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("task slot is not an array; ignoring");
            Vec::new()
        }
        Err(err) => {
            warn!(error = %err, "task slot is unparsable; ignoring");
            Vec::new()
        }
    }
}

/// Stage two: validating projection into the strict task shape. An element
/// is a candidate only if it carries string `id` and `title`; `completed`
/// takes JSON truthiness, and a non-numeric `createdAt` defaults to
/// `now_ms`.
pub fn project_task(value: &Value, now_ms: i64) -> Option<Task> {
    let record = value.as_object()?;
    let id = record.get("id")?.as_str()?.to_string();
    let title = record.get("title")?.as_str()?.to_string();

    let completed = record
        .get("completed")
        .map(json_truthy)
        .unwrap_or(false);

    let created_at = record
        .get("createdAt")
        .and_then(json_number_ms)
        .unwrap_or(now_ms);

    Some(Task {
        id,
        title,
        completed,
        created_at,
    })
}

/// Any JSON number counts as a timestamp: exact when it fits in i64,
/// truncated (saturating) when it only fits in f64.
fn json_number_ms(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|ms| ms as i64))
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().is_some_and(|f| f != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_task_slot, project_task};

    #[test]
    fn non_array_slot_yields_nothing() {
        assert!(parse_task_slot("").is_empty());
        assert!(parse_task_slot("not json").is_empty());
        assert!(parse_task_slot("{\"id\":\"a\"}").is_empty());
        assert!(parse_task_slot("42").is_empty());
    }

    #[test]
    fn projection_requires_string_id_and_title() {
        assert!(project_task(&json!({"id": "a", "title": "x"}), 0).is_some());
        assert!(project_task(&json!({"id": 7, "title": "x"}), 0).is_none());
        assert!(project_task(&json!({"id": "a"}), 0).is_none());
        assert!(project_task(&json!("bad"), 0).is_none());
        assert!(project_task(&json!(null), 0).is_none());
    }

    #[test]
    fn projection_coerces_completed_truthily() {
        let cases = [
            (json!({"id": "a", "title": "t", "completed": true}), true),
            (json!({"id": "a", "title": "t", "completed": 1}), true),
            (json!({"id": "a", "title": "t", "completed": "yes"}), true),
            (json!({"id": "a", "title": "t", "completed": 0}), false),
            (json!({"id": "a", "title": "t", "completed": ""}), false),
            (json!({"id": "a", "title": "t", "completed": null}), false),
            (json!({"id": "a", "title": "t"}), false),
        ];
        for (value, expected) in cases {
            let task = project_task(&value, 0).expect("candidate should project");
            assert_eq!(task.completed, expected, "input: {value}");
        }
    }

    #[test]
    fn projection_defaults_non_numeric_created_at() {
        let kept = project_task(&json!({"id": "a", "title": "t", "createdAt": 123}), 999)
            .expect("project");
        assert_eq!(kept.created_at, 123);

        let defaulted = project_task(&json!({"id": "a", "title": "t", "createdAt": "old"}), 999)
            .expect("project");
        assert_eq!(defaulted.created_at, 999);
    }

    #[test]
    fn projection_honors_float_and_oversized_created_at() {
        let truncated = project_task(&json!({"id": "a", "title": "t", "createdAt": 123.9}), 999)
            .expect("project");
        assert_eq!(truncated.created_at, 123);

        let huge = project_task(
            &json!({"id": "a", "title": "t", "createdAt": 10_000_000_000_000_000_000_u64}),
            999,
        )
        .expect("project");
        assert_eq!(huge.created_at, i64::MAX);
    }
}

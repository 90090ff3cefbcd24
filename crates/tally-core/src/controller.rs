use serde::Serialize;
use tracing::{debug, info, warn};

use crate::store::SlotStore;
use crate::task::{Task, Theme, normalize_title};

/// At most one edit at a time: which task is being retitled and the
/// in-progress draft text. The draft is kept verbatim while typing;
/// normalization happens only on save.
#[derive(Debug, Clone)]
struct EditSession {
    task_id: String,
    draft: String,
}

/// Read-only view handed to the rendering side after every operation.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub theme: Theme,
    pub editing_id: Option<String>,
    pub draft_title: Option<String>,
    pub remaining_count: usize,
}

/// Owns the canonical task list, theme, and edit session for the session
/// lifetime. Every accepted mutation writes the affected slot back through
/// the store; a failed write is logged and the in-memory state stays
/// authoritative.
#[derive(Debug)]
pub struct Controller {
    store: SlotStore,
    tasks: Vec<Task>,
    theme: Theme,
    edit: Option<EditSession>,
}

impl Controller {
    #[tracing::instrument(skip(store))]
    pub fn open(store: SlotStore) -> Self {
        let tasks = store.load_tasks();
        let theme = store.load_theme();
        info!(count = tasks.len(), theme = theme.as_str(), "controller loaded");
        Self {
            store,
            tasks,
            theme,
            edit: None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            theme: self.theme,
            editing_id: self.edit.as_ref().map(|e| e.task_id.clone()),
            draft_title: self.edit.as_ref().map(|e| e.draft.clone()),
            remaining_count: self.remaining_count(),
        }
    }

    /// Recomputed from the live list on every read, never cached.
    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// Prepends a fresh task. An empty-after-normalize title is a silent
    /// no-op, not an error.
    #[tracing::instrument(skip(self, raw_title))]
    pub fn add_task(&mut self, raw_title: &str) -> Snapshot {
        let title = normalize_title(raw_title);
        if title.is_empty() {
            debug!("add ignored: empty title after normalize");
            return self.snapshot();
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let task = Task::new(title, now_ms);
        info!(id = %task.id, "task added");
        self.tasks.insert(0, task);
        self.persist_tasks();
        self.snapshot()
    }

    /// Opens an edit session seeded with the task's current title. An
    /// unknown id leaves any existing session untouched.
    #[tracing::instrument(skip(self))]
    pub fn start_edit(&mut self, task_id: &str) -> Snapshot {
        if let Some(task) = self.tasks.iter().find(|t| t.id == task_id) {
            self.edit = Some(EditSession {
                task_id: task.id.clone(),
                draft: task.title.clone(),
            });
            debug!(id = %task_id, "edit session opened");
        } else {
            debug!(id = %task_id, "edit ignored: no such task");
        }
        self.snapshot()
    }

    /// Replaces the draft verbatim so live input is never rewritten under
    /// the user.
    pub fn update_draft(&mut self, text: &str) -> Snapshot {
        if let Some(edit) = self.edit.as_mut() {
            edit.draft = text.to_string();
        }
        self.snapshot()
    }

    /// Commits the draft. An empty-after-normalize draft does not commit
    /// and keeps the session open so no work is silently discarded.
    #[tracing::instrument(skip(self))]
    pub fn save_edit(&mut self) -> Snapshot {
        let Some(edit) = self.edit.as_ref() else {
            return self.snapshot();
        };

        let next = normalize_title(&edit.draft);
        if next.is_empty() {
            debug!(id = %edit.task_id, "save ignored: empty draft; session stays open");
            return self.snapshot();
        }

        // Storage may supply duplicate ids; a retitle addresses all of them.
        let task_id = edit.task_id.clone();
        let mut touched = 0_usize;
        for task in self.tasks.iter_mut().filter(|t| t.id == task_id) {
            task.title = next.clone();
            touched += 1;
        }
        if touched > 0 {
            info!(id = %task_id, count = touched, "title updated");
            self.persist_tasks();
        }
        self.edit = None;
        self.snapshot()
    }

    pub fn cancel_edit(&mut self) -> Snapshot {
        self.edit = None;
        self.snapshot()
    }

    /// Flips the completed flag on every task carrying the id (duplicates
    /// from storage flip together); unknown ids are a benign no-op.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completed(&mut self, task_id: &str) -> Snapshot {
        let mut touched = 0_usize;
        for task in self.tasks.iter_mut().filter(|t| t.id == task_id) {
            task.completed = !task.completed;
            touched += 1;
        }
        if touched > 0 {
            info!(id = %task_id, count = touched, "toggled");
            self.persist_tasks();
        }
        self.snapshot()
    }

    /// Removes the task. An edit session targeting it cannot outlive it.
    #[tracing::instrument(skip(self))]
    pub fn delete_task(&mut self, task_id: &str) -> Snapshot {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        if self.tasks.len() < before {
            info!(id = %task_id, "task deleted");
            if self.edit.as_ref().is_some_and(|e| e.task_id == task_id) {
                self.edit = None;
            }
            self.persist_tasks();
        }
        self.snapshot()
    }

    #[tracing::instrument(skip(self))]
    pub fn clear_completed(&mut self) -> Snapshot {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        if self.tasks.len() < before {
            info!(removed = before - self.tasks.len(), "cleared completed");
            self.persist_tasks();
        }
        self.snapshot()
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_theme(&mut self) -> Snapshot {
        self.theme = self.theme.toggled();
        info!(theme = self.theme.as_str(), "theme toggled");
        if let Err(err) = self.store.save_theme(self.theme) {
            warn!(error = %err, "theme write failed; in-memory theme kept");
        }
        self.snapshot()
    }

    fn persist_tasks(&self) {
        if let Err(err) = self.store.save_tasks(&self.tasks) {
            warn!(error = %err, "task write failed; in-memory list kept");
        }
    }
}

use crate::error::AppError;
use crate::model::{Subtask, Task};
use crate::storage::json_store;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Owns the active and archived collections and the directory they persist
/// to. Every mutation writes both collections back synchronously.
///
/// Mutations are total over unresolvable ids: a missing task or subtask id is
/// a no-op reported through the return value, never an error.
#[derive(Debug)]
pub struct TaskStore {
    dir: PathBuf,
    active: Vec<Task>,
    archived: Vec<Task>,
}

fn next_id(prefix: &str) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{nanos}-{seq}")
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::encode(err.to_string()))
}

impl TaskStore {
    pub fn open(dir: &Path) -> Result<Self, AppError> {
        let state = json_store::load(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            active: state.active,
            archived: state.archived,
        })
    }

    pub fn active(&self) -> &[Task] {
        &self.active
    }

    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn find_active(&self, id: &str) -> Option<&Task> {
        self.active.iter().find(|task| task.id == id)
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.find_active(id)
            .or_else(|| self.archived.iter().find(|task| task.id == id))
    }

    pub fn add_task(&mut self, title: &str) -> Result<Task, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let task = Task {
            id: next_id("task"),
            title: trimmed.to_string(),
            completed: false,
            subtasks: Vec::new(),
            archived_at: None,
        };

        self.active.push(task.clone());
        self.persist()?;
        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<bool, AppError> {
        let before = self.active.len();
        self.active.retain(|task| task.id != id);
        let removed = self.active.len() != before;
        self.persist()?;
        Ok(removed)
    }

    /// Title is stored as given; trimming happens at the presentation
    /// boundary.
    pub fn set_task_title(&mut self, id: &str, title: &str) -> Result<bool, AppError> {
        let updated = match self.active.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.title = title.to_string();
                true
            }
            None => false,
        };
        self.persist()?;
        Ok(updated)
    }

    /// Does not archive; archival is a separate explicit operation the
    /// caller offers when a task transitions to completed.
    pub fn set_task_completed(&mut self, id: &str, completed: bool) -> Result<bool, AppError> {
        let updated = match self.active.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed = completed;
                true
            }
            None => false,
        };
        self.persist()?;
        Ok(updated)
    }

    /// Moves the task from active to the front of archived, stamping
    /// `archived_at`. No-op when the id is not in the active collection,
    /// which also makes a second call for the same id idempotent.
    pub fn archive_task(&mut self, id: &str) -> Result<bool, AppError> {
        let index = match self.active.iter().position(|task| task.id == id) {
            Some(index) => index,
            None => return Ok(false),
        };

        let mut task = self.active.remove(index);
        task.archived_at = Some(now_rfc3339()?);
        self.archived.insert(0, task);
        self.persist()?;
        Ok(true)
    }

    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<Option<Subtask>, AppError> {
        let added = match self.active.iter_mut().find(|task| task.id == task_id) {
            Some(task) => {
                let subtask = Subtask {
                    id: next_id("sub"),
                    title: title.to_string(),
                    completed: false,
                };
                task.subtasks.push(subtask.clone());
                Some(subtask)
            }
            None => None,
        };
        self.persist()?;
        Ok(added)
    }

    pub fn set_subtask_completed(
        &mut self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<bool, AppError> {
        let updated = match self.find_subtask_mut(task_id, subtask_id) {
            Some(subtask) => {
                subtask.completed = completed;
                true
            }
            None => false,
        };
        self.persist()?;
        Ok(updated)
    }

    pub fn set_subtask_title(
        &mut self,
        task_id: &str,
        subtask_id: &str,
        title: &str,
    ) -> Result<bool, AppError> {
        let updated = match self.find_subtask_mut(task_id, subtask_id) {
            Some(subtask) => {
                subtask.title = title.to_string();
                true
            }
            None => false,
        };
        self.persist()?;
        Ok(updated)
    }

    /// Removes only the one matching subtask, preserving the order of the
    /// remainder.
    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, AppError> {
        let removed = match self.active.iter_mut().find(|task| task.id == task_id) {
            Some(task) => match task.subtasks.iter().position(|sub| sub.id == subtask_id) {
                Some(index) => {
                    task.subtasks.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };
        self.persist()?;
        Ok(removed)
    }

    fn find_subtask_mut(&mut self, task_id: &str, subtask_id: &str) -> Option<&mut Subtask> {
        self.active
            .iter_mut()
            .find(|task| task.id == task_id)?
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
    }

    fn persist(&self) -> Result<(), AppError> {
        json_store::store(&self.dir, &self.active, &self.archived)
    }
}

use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const ACTIVE_FILE_NAME: &str = "tasks.json";
pub const ARCHIVE_FILE_NAME: &str = "archive.json";
pub const SETTINGS_FILE_NAME: &str = "settings.dat";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredState {
    pub active: Vec<Task>,
    pub archived: Vec<Task>,
}

pub fn data_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TASKPAD_DATA_DIR")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::io("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::io("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("taskpad"))
    }
}

pub fn load(dir: &Path) -> Result<StoredState, AppError> {
    let active = load_collection(&dir.join(ACTIVE_FILE_NAME))?;
    let archived = load_collection(&dir.join(ARCHIVE_FILE_NAME))?;

    let mut seen = HashSet::new();
    for task in active.iter().chain(archived.iter()) {
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::corrupt_store(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
    }
    for task in &active {
        if task.is_archived() {
            return Err(AppError::corrupt_store(format!(
                "active task '{}' carries an archive date",
                task.id
            )));
        }
    }
    for task in &archived {
        if !task.is_archived() {
            return Err(AppError::corrupt_store(format!(
                "archived task '{}' is missing its archive date",
                task.id
            )));
        }
    }

    Ok(StoredState { active, archived })
}

// Plain files have no multi-key transaction; archived is written first.
pub fn store(dir: &Path, active: &[Task], archived: &[Task]) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|err| AppError::io(err.to_string()))?;
    write_collection(&dir.join(ARCHIVE_FILE_NAME), archived)?;
    write_collection(&dir.join(ACTIVE_FILE_NAME), active)?;
    Ok(())
}

fn load_collection(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    serde_json::from_str(&content).map_err(|err| AppError::corrupt_store(err.to_string()))
}

fn write_collection(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let content =
        serde_json::to_string_pretty(tasks).map_err(|err| AppError::encode(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ACTIVE_FILE_NAME, load, store};
    use crate::model::Task;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskpad-{nanos}-{name}"))
    }

    fn task(id: &str, archived_at: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            title: "demo".to_string(),
            completed: false,
            subtasks: Vec::new(),
            archived_at: archived_at.map(str::to_string),
        }
    }

    #[test]
    fn store_and_load_round_trip() {
        let dir = temp_dir("round-trip");
        let active = vec![task("task-1", None)];
        let archived = vec![task("task-2", Some("2025-12-20T00:00:00Z"))];

        store(&dir, &active, &archived).unwrap();
        let loaded = load(&dir).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.active, active);
        assert_eq!(loaded.archived, archived);
    }

    #[test]
    fn load_missing_dir_yields_empty_collections() {
        let dir = temp_dir("missing");
        let loaded = load(&dir).unwrap();

        assert!(loaded.active.is_empty());
        assert!(loaded.archived.is_empty());
    }

    #[test]
    fn load_reports_malformed_file() {
        let dir = temp_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ACTIVE_FILE_NAME), "{ not json ").unwrap();

        let err = load(&dir).unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "corrupt_store");
    }

    #[test]
    fn load_rejects_duplicate_ids_across_collections() {
        let dir = temp_dir("duplicate-id");
        store(
            &dir,
            &[task("task-1", None)],
            &[task("task-1", Some("2025-12-20T00:00:00Z"))],
        )
        .unwrap();

        let err = load(&dir).unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "corrupt_store");
        assert!(err.message().contains("duplicate"));
    }

    #[test]
    fn load_rejects_archived_task_without_stamp() {
        let dir = temp_dir("bad-archive");
        store(&dir, &[], &[]).unwrap();
        let content = "[{\"id\":\"task-1\",\"title\":\"demo\",\"completed\":true}]";
        fs::write(dir.join(super::ARCHIVE_FILE_NAME), content).unwrap();

        let err = load(&dir).unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "corrupt_store");
    }

    #[test]
    fn load_rejects_active_task_with_stamp() {
        let dir = temp_dir("bad-active");
        store(&dir, &[], &[]).unwrap();
        let content = "[{\"id\":\"task-1\",\"title\":\"demo\",\"completed\":false,\"archived_at\":\"2025-12-20T00:00:00Z\"}]";
        fs::write(dir.join(ACTIVE_FILE_NAME), content).unwrap();

        let err = load(&dir).unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "corrupt_store");
    }
}

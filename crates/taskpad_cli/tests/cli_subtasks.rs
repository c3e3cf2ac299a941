use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskpad-{nanos}-{name}"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskpad"))
        .args(args)
        .env("TASKPAD_DATA_DIR", dir)
        .output()
        .expect("failed to run taskpad")
}

fn add_task(dir: &Path, title: &str) -> String {
    let output = run(dir, &["add", title, "--json"]);
    assert!(output.status.success());
    let task: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    task["id"].as_str().unwrap().to_string()
}

fn add_subtask(dir: &Path, task_id: &str, title: &str) -> String {
    let output = run(dir, &["subtask", "add", task_id, title, "--json"]);
    assert!(output.status.success());
    let subtask: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    subtask["id"].as_str().unwrap().to_string()
}

#[test]
fn subtask_add_appends_to_parent() {
    let dir = temp_dir("cli-sub-add");
    let task_id = add_task(&dir, "parent");
    let sub_id = add_subtask(&dir, &task_id, "step one");

    let output = run(&dir, &["show", &task_id, "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let task: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(task["subtasks"][0]["id"], sub_id.as_str());
    assert_eq!(task["subtasks"][0]["title"], "step one");
    assert_eq!(task["subtasks"][0]["completed"], false);
}

#[test]
fn subtask_add_rejects_unknown_task() {
    let dir = temp_dir("cli-sub-unknown");
    let output = run(&dir, &["subtask", "add", "task-missing", "step"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("task not found"));
}

#[test]
fn subtask_done_and_undo_toggle_completion() {
    let dir = temp_dir("cli-sub-done");
    let task_id = add_task(&dir, "parent");
    let sub_id = add_subtask(&dir, &task_id, "flip");

    assert!(run(&dir, &["subtask", "done", &task_id, &sub_id]).status.success());
    let shown = run(&dir, &["show", &task_id, "--json"]);
    let task: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(task["subtasks"][0]["completed"], true);

    assert!(
        run(&dir, &["subtask", "done", &task_id, &sub_id, "--undo"])
            .status
            .success()
    );
    let shown = run(&dir, &["show", &task_id, "--json"]);
    std::fs::remove_dir_all(&dir).ok();
    let task: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(task["subtasks"][0]["completed"], false);
}

#[test]
fn subtask_edit_updates_title() {
    let dir = temp_dir("cli-sub-edit");
    let task_id = add_task(&dir, "parent");
    let sub_id = add_subtask(&dir, &task_id, "draft");

    let output = run(&dir, &["subtask", "edit", &task_id, &sub_id, "final"]);
    let shown = run(&dir, &["show", &task_id, "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let task: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(task["subtasks"][0]["title"], "final");
}

#[test]
fn subtask_delete_preserves_order_of_remainder() {
    let dir = temp_dir("cli-sub-delete");
    let task_id = add_task(&dir, "parent");
    let a = add_subtask(&dir, &task_id, "A");
    let b = add_subtask(&dir, &task_id, "B");
    let c = add_subtask(&dir, &task_id, "C");

    assert!(run(&dir, &["subtask", "delete", &task_id, &b]).status.success());
    let shown = run(&dir, &["show", &task_id, "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let task: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    let ids: Vec<&str> = task["subtasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|sub| sub["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![a.as_str(), c.as_str()]);
}

#[test]
fn subtask_delete_rejects_unknown_subtask() {
    let dir = temp_dir("cli-sub-delete-unknown");
    let task_id = add_task(&dir, "parent");

    let output = run(&dir, &["subtask", "delete", &task_id, "sub-missing"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("subtask not found"));
}

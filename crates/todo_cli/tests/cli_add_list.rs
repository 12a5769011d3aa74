use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todoapp-{nanos}-{file_name}"))
}

fn run_local(store_path: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_todo");
    Command::new(exe)
        .arg("--local")
        .args(args)
        .env("TODOAPP_STORE_PATH", store_path)
        .env("TODOAPP_CONFIG_PATH", temp_path("missing-config.json"))
        .env_remove("TODOAPP_SERVER_URL")
        .output()
        .expect("failed to run todo")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn add_persists_todo_with_defaults() {
    let store_path = temp_path("cli-add.json");

    let output = run_local(&store_path, &["--json", "add", "Buy milk"]);
    assert!(output.status.success());

    let created = stdout_json(&output);
    assert_eq!(created["id"], 1);
    assert_eq!(created["text"], "Buy milk");
    assert_eq!(created["completed"], false);
    assert_eq!(created["priority"], "medium");

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert_eq!(stored["next_id"], 2);
    assert_eq!(stored["tasks"][0]["text"], "Buy milk");
}

#[test]
fn add_with_due_date_and_priority() {
    let store_path = temp_path("cli-add-due.json");

    let output = run_local(
        &store_path,
        &[
            "--json",
            "add",
            "Dentist",
            "--priority",
            "high",
            "--due",
            "2025-07-01T09:00:00Z",
            "--description",
            "bring card",
        ],
    );
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let created = stdout_json(&output);
    assert_eq!(created["priority"], "high");
    assert_eq!(created["dueDate"], "2025-07-01T09:00:00Z");
    assert_eq!(created["description"], "bring card");
}

#[test]
fn add_rejects_blank_text() {
    let store_path = temp_path("cli-add-blank.json");

    let output = run_local(&store_path, &["add", "   "]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: validation_error"));
    assert!(!store_path.exists());
}

#[test]
fn add_rejects_unknown_priority() {
    let store_path = temp_path("cli-add-priority.json");

    let output = run_local(&store_path, &["add", "demo", "--priority", "urgent"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ERROR: validation_error"));
}

#[test]
fn list_filters_and_sorts() {
    let store_path = temp_path("cli-list.json");

    for (text, priority) in [("low", "low"), ("high", "high"), ("medium", "medium")] {
        let output = run_local(&store_path, &["add", text, "--priority", priority]);
        assert!(output.status.success());
    }
    assert!(run_local(&store_path, &["toggle", "2"]).status.success());

    let active = stdout_json(&run_local(
        &store_path,
        &["--json", "list", "--filter", "active", "--sort", "priority"],
    ));
    let completed = stdout_json(&run_local(
        &store_path,
        &["--json", "list", "--filter", "completed"],
    ));
    std::fs::remove_file(&store_path).ok();

    let texts: Vec<_> = active
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["medium", "low"]);
    assert_eq!(completed.as_array().unwrap().len(), 1);
    assert_eq!(completed[0]["text"], "high");
}

#[test]
fn list_uses_default_sort_from_config_override() {
    let store_path = temp_path("cli-list-override.json");

    for (text, priority) in [("low", "low"), ("high", "high")] {
        assert!(
            run_local(&store_path, &["add", text, "--priority", priority])
                .status
                .success()
        );
    }

    let listed = stdout_json(&run_local(
        &store_path,
        &["--json", "--config-override", "sort=priority", "list"],
    ));
    std::fs::remove_file(&store_path).ok();

    assert_eq!(listed[0]["text"], "high");
    assert_eq!(listed[1]["text"], "low");
}

#[test]
fn list_empty_store_prints_placeholder() {
    let store_path = temp_path("cli-list-empty.json");

    let output = run_local(&store_path, &["list"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "No todos");
}

#[test]
fn list_table_shows_text_and_priority() {
    let store_path = temp_path("cli-list-table.json");
    assert!(
        run_local(&store_path, &["add", "Buy milk", "--priority", "high"])
            .status
            .success()
    );

    let output = run_local(&store_path, &["list"]);
    std::fs::remove_file(&store_path).ok();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Buy milk"));
    assert!(stdout.contains("high"));
}

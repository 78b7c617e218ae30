//! End-to-end runs of the crab-utils binary for commands that need no
//! grid services.

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn crab_utils(args: &[&str], config_dir: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crab-utils"))
        .args(args)
        .arg("--config")
        .arg(config_dir.path().join("config.yaml"))
        .env_remove("X509_USER_PROXY")
        .env_remove("X509_CERT_DIR")
        .output()
        .expect("failed to run crab-utils")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = crab_utils(&["version"], &dir);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("crab-utils "));
}

#[test]
fn test_template_lists_sections() {
    let dir = TempDir::new().unwrap();
    let output = crab_utils(&["template"], &dir);
    assert!(output.status.success());
    let yaml = stdout(&output);
    for section in ["General:", "JobType:", "Data:", "Site:", "User:", "Debug:"] {
        assert!(yaml.contains(section), "missing {} in {}", section, yaml);
    }
}

#[test]
fn test_config_reads_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "dbs_instance: global\nconsole_level: warn\n",
    )
    .unwrap();

    let output = crab_utils(&["config"], &dir);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("dbs_instance: global"));
    assert!(text.contains("console_level: warn"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.yaml"), "console_level: loud\n").unwrap();

    let output = crab_utils(&["config"], &dir);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_column_prints_value() {
    let dir = TempDir::new().unwrap();
    let result = dir.path().join("task.json");
    fs::write(
        &result,
        r#"{"desc": {"columns": ["tm_taskname", "tm_taskstatus"]}, "result": ["my_task", "SUBMITTED"]}"#,
    )
    .unwrap();

    let output = crab_utils(&["column", result.to_str().unwrap(), "tm_taskstatus"], &dir);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "SUBMITTED");

    let output = crab_utils(&["column", result.to_str().unwrap(), "missing"], &dir);
    assert_eq!(output.status.code(), Some(1));
}

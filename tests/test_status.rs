//! Muted status queries and column lookup.

use serde_json::json;
use tracing::level_filters::LevelFilter;

use crab_utils::exec::{ExternalCommand, ScriptedRunner};
use crab_utils::logging::{Handler, Logging, AGGREGATE_LOGGER};
use crab_utils::status::{get_column, muted_status_info, CommandStatusProvider};
use crab_utils::ClientError;

#[test]
fn test_status_command_runs_muted() {
    let logging = Logging::new(LevelFilter::INFO);
    let console = Handler::new("console", LevelFilter::INFO);
    logging.register(AGGREGATE_LOGGER, console.clone());

    let runner = ScriptedRunner::new();
    runner
        .expect("crab")
        .matching("status")
        .stdout(r#"{"status": "FAILED", "statusFailureMsg": "Task could not be submitted"}"#)
        .finish();
    let provider = CommandStatusProvider::new(
        &runner,
        ExternalCommand::new("crab").args(["status", "-d", "crab_task", "--json"]),
    );

    let info = muted_status_info(&provider, &logging).unwrap();

    assert_eq!(info.get("status"), Some(&json!("FAILED")));
    assert_eq!(
        info.failure_message().as_deref(),
        Some("Task could not be submitted")
    );
    assert_eq!(console.level(), LevelFilter::INFO);
}

#[test]
fn test_failed_status_command_restores_console() {
    let logging = Logging::new(LevelFilter::WARN);
    let runner = ScriptedRunner::new();
    runner.expect("crab").fails_to_spawn().finish();
    let provider = CommandStatusProvider::new(&runner, ExternalCommand::new("crab"));

    let err = muted_status_info(&provider, &logging).unwrap_err();
    assert!(matches!(err, ClientError::Spawn { .. }));
    assert_eq!(logging.console_level(), LevelFilter::WARN);
}

#[test]
fn test_column_of_task_row() {
    let row = json!({
        "desc": {"columns": ["tm_taskname", "tm_user_sandbox", "tm_totalunits"]},
        "result": ["240101_120000:jdoe_crab_task", "None", 120]
    });

    assert_eq!(
        get_column(&row, "tm_taskname").unwrap(),
        Some(json!("240101_120000:jdoe_crab_task"))
    );
    assert_eq!(get_column(&row, "tm_user_sandbox").unwrap(), None);
    assert_eq!(get_column(&row, "tm_totalunits").unwrap(), Some(json!(120)));
    assert!(matches!(
        get_column(&row, "tm_nope"),
        Err(ClientError::ColumnNotFound(_))
    ));
}

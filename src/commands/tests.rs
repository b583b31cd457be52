//! Tests for command dispatch.

use super::*;
use crate::cli::{
    CounterArgs, DeadlockArgs, FairnessArgs, HandoffArgs, ReadWriteArgs, VisibilityArgs,
};
use lockwork::events::EventAction;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cli(command: Command, config: Option<PathBuf>, events: Option<PathBuf>) -> Cli {
    Cli {
        config,
        events,
        command,
    }
}

#[test]
fn select_applies_fairness_flags() {
    let mut config = ScenarioConfig::default();
    let selected = select(
        &mut config,
        Command::Fairness(FairnessArgs {
            unfair: true,
            tasks: Some(7),
            hold_ms: None,
        }),
    );

    assert_eq!(selected, vec![Scenario::Fairness]);
    assert!(!config.fairness.fair);
    assert_eq!(config.fairness.tasks, 7);
    assert_eq!(config.fairness.hold_ms, 20);
}

#[test]
fn select_leaves_config_without_flags() {
    let mut config = ScenarioConfig::default();
    config.read_write.reader_preferred = true;

    select(&mut config, Command::ReadWrite(ReadWriteArgs::default()));
    select(&mut config, Command::Deadlock(DeadlockArgs::default()));

    // A flag that is not given never resets a configured value
    assert!(config.read_write.reader_preferred);
    assert!(!config.deadlock.ordered);
    assert_eq!(config, {
        let mut expected = ScenarioConfig::default();
        expected.read_write.reader_preferred = true;
        expected
    });
}

#[test]
fn select_all_runs_every_scenario() {
    let mut config = ScenarioConfig::default();
    let selected = select(&mut config, Command::All);

    assert_eq!(selected.len(), 8);
    assert!(selected.contains(&Scenario::Deadlock));
    assert!(selected.contains(&Scenario::DeadlockOrdered));
    assert!(selected.contains(&Scenario::Visibility));
}

#[test]
fn select_applies_visibility_flags() {
    let mut config = ScenarioConfig::default();
    let selected = select(
        &mut config,
        Command::Visibility(VisibilityArgs {
            delay_ms: Some(5),
            timeout_ms: None,
        }),
    );

    assert_eq!(selected, vec![Scenario::Visibility]);
    assert_eq!(config.visibility.delay_ms, 5);
    assert_eq!(config.visibility.timeout_ms, 2000);
}

#[test]
fn finish_keeps_scenario_failure_when_trace_write_fails() {
    let temp_dir = TempDir::new().unwrap();
    // A directory cannot be opened for appending
    let unwritable = temp_dir.path();

    let failure = LockworkError::ScenarioFailed("1 of 8 scenarios failed (fairness)".to_string());
    let result = finish(Err(failure.clone()), unwritable, &[]);
    assert_eq!(result, Err(failure));

    let result = finish(Ok(()), unwritable, &[]);
    assert!(matches!(result, Err(LockworkError::UserError(_))));
}

#[test]
fn finish_writes_trace_and_keeps_result() {
    let temp_dir = TempDir::new().unwrap();
    let events = temp_dir.path().join("trace.ndjson");
    let failure = LockworkError::ScenarioFailed("counter".to_string());

    let trace = vec![Event::new(EventAction::Start)];
    assert_eq!(finish(Err(failure.clone()), &events, &trace), Err(failure));
    assert_eq!(fs::read_to_string(&events).unwrap().lines().count(), 1);
}

#[test]
fn dispatch_runs_counter_and_writes_trace() {
    let temp_dir = TempDir::new().unwrap();
    let events = temp_dir.path().join("trace.ndjson");

    dispatch(cli(
        Command::Counter(CounterArgs {
            tasks: Some(2),
            increments: Some(50),
        }),
        None,
        Some(events.clone()),
    ))
    .unwrap();

    let content = fs::read_to_string(&events).unwrap();
    let trace: Vec<Event> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(trace.first().map(|e| e.action), Some(EventAction::Start));
    assert_eq!(trace.last().map(|e| e.action), Some(EventAction::Complete));
    let seqs: Vec<u64> = trace.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=trace.len() as u64).collect::<Vec<_>>());
}

#[test]
fn dispatch_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("scenarios.yaml");
    fs::write(&config_path, "handoff:\n  items: 5\n  capacity: 2\n").unwrap();

    let result = dispatch(cli(
        Command::Handoff(HandoffArgs::default()),
        Some(config_path),
        None,
    ));
    assert!(result.is_ok());
}

#[test]
fn dispatch_rejects_invalid_override() {
    let result = dispatch(cli(
        Command::Handoff(HandoffArgs {
            items: None,
            capacity: Some(0),
        }),
        None,
        None,
    ));

    match result {
        Err(LockworkError::UserError(msg)) => assert!(msg.contains("handoff.capacity")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn dispatch_reports_missing_config() {
    let temp_dir = TempDir::new().unwrap();
    let result = dispatch(cli(
        Command::All,
        Some(temp_dir.path().join("missing.yaml")),
        None,
    ));

    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), lockwork::exit_codes::USER_ERROR);
}

#[test]
fn dispatch_runs_visibility() {
    let result = dispatch(cli(
        Command::Visibility(VisibilityArgs {
            delay_ms: Some(10),
            timeout_ms: None,
        }),
        None,
        None,
    ));
    assert!(result.is_ok());
}

#[test]
fn dispatch_ordered_deadlock_passes() {
    let temp_dir = TempDir::new().unwrap();
    let events = temp_dir.path().join("trace.ndjson");

    dispatch(cli(
        Command::Deadlock(DeadlockArgs {
            ordered: true,
            timeout_ms: None,
        }),
        None,
        Some(events.clone()),
    ))
    .unwrap();

    let content = fs::read_to_string(&events).unwrap();
    let actions: Vec<EventAction> = content
        .lines()
        .map(|line| serde_json::from_str::<Event>(line).unwrap().action)
        .collect();
    assert!(!actions.contains(&EventAction::Deadlock));
    assert!(actions.contains(&EventAction::Acquire));
}

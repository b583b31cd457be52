//! Command implementations for lockwork.
//!
//! This module provides the dispatcher that routes CLI commands to the
//! scenario runner. Each scenario runs with its own event log; the logs are
//! concatenated into one trace for `--events`.

mod overrides;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command};
use lockwork::config::ScenarioConfig;
use lockwork::error::{LockworkError, Result};
use lockwork::events::{Event, EventLog, append_events};
use lockwork::scenarios::{account, counter, deadlock, fairness, handoff, read_write, visibility};
use std::fmt;
use std::path::Path;

/// One runnable scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Fairness,
    Withdraw,
    ReadWrite,
    Handoff,
    Deadlock,
    /// The deadlock scenario through the lock ordering policy, whatever the
    /// config says.
    DeadlockOrdered,
    Counter,
    Visibility,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Fairness => write!(f, "fairness"),
            Scenario::Withdraw => write!(f, "withdraw"),
            Scenario::ReadWrite => write!(f, "read-write"),
            Scenario::Handoff => write!(f, "handoff"),
            Scenario::Deadlock => write!(f, "deadlock"),
            Scenario::DeadlockOrdered => write!(f, "deadlock --ordered"),
            Scenario::Counter => write!(f, "counter"),
            Scenario::Visibility => write!(f, "visibility"),
        }
    }
}

/// Everything `all` runs, in order.
const ALL: [Scenario; 8] = [
    Scenario::Fairness,
    Scenario::Withdraw,
    Scenario::ReadWrite,
    Scenario::Handoff,
    Scenario::Deadlock,
    Scenario::DeadlockOrdered,
    Scenario::Counter,
    Scenario::Visibility,
];

/// Dispatch a parsed command line.
///
/// Loads the config (defaults when no `--config` is given), applies command
/// flags, validates, runs the selected scenarios, and writes the trace when
/// `--events` is set. The trace is written even when a scenario fails.
pub fn dispatch(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    let selected = select(&mut config, cli.command);
    config.validate()?;

    let mut trace = Vec::new();
    let result = run_all(&selected, &config, &mut trace);

    match &cli.events {
        Some(path) => finish(result, path, &trace),
        None => result,
    }
}

/// Append `trace` to `path` and settle the outcome of the run.
///
/// A scenario failure takes precedence: when the trace cannot be written
/// either, that is only warned about.
fn finish(result: Result<()>, path: &Path, trace: &[Event]) -> Result<()> {
    match append_events(path, trace) {
        Ok(()) => {
            println!("Event trace appended to {}", path.display());
            result
        }
        Err(err) => match result {
            Ok(()) => Err(err),
            Err(failure) => {
                eprintln!("Warning: {}", err);
                Err(failure)
            }
        },
    }
}

/// Apply the command's flags to `config` and return the scenarios to run.
pub fn select(config: &mut ScenarioConfig, command: Command) -> Vec<Scenario> {
    match command {
        Command::Fairness(args) => {
            overrides::fairness(config, args);
            vec![Scenario::Fairness]
        }
        Command::Withdraw(args) => {
            overrides::withdraw(config, args);
            vec![Scenario::Withdraw]
        }
        Command::ReadWrite(args) => {
            overrides::read_write(config, args);
            vec![Scenario::ReadWrite]
        }
        Command::Handoff(args) => {
            overrides::handoff(config, args);
            vec![Scenario::Handoff]
        }
        Command::Deadlock(args) => {
            overrides::deadlock(config, args);
            vec![Scenario::Deadlock]
        }
        Command::Counter(args) => {
            overrides::counter(config, args);
            vec![Scenario::Counter]
        }
        Command::Visibility(args) => {
            overrides::visibility(config, args);
            vec![Scenario::Visibility]
        }
        Command::All => ALL.to_vec(),
    }
}

fn run_all(selected: &[Scenario], config: &ScenarioConfig, trace: &mut Vec<Event>) -> Result<()> {
    if let [scenario] = selected {
        return run_one(*scenario, config, trace);
    }

    let mut failed = Vec::new();
    for scenario in selected {
        if let Err(err) = run_one(*scenario, config, trace) {
            eprintln!("Warning: scenario '{}' failed: {}", scenario, err);
            failed.push(scenario.to_string());
        }
    }

    if failed.is_empty() {
        println!("All {} scenarios passed.", selected.len());
        Ok(())
    } else {
        Err(LockworkError::ScenarioFailed(format!(
            "{} of {} scenarios failed ({})",
            failed.len(),
            selected.len(),
            failed.join(", ")
        )))
    }
}

/// Run one scenario with a fresh log, print its report, and move its events
/// onto `trace` with sequence numbers continuing from the trace.
fn run_one(scenario: Scenario, config: &ScenarioConfig, trace: &mut Vec<Event>) -> Result<()> {
    let log = EventLog::new();
    let result = report(scenario, config, &log);

    for mut event in log.snapshot() {
        event.seq = trace.len() as u64 + 1;
        trace.push(event);
    }

    let report = result?;
    println!("{}", report);
    println!();
    Ok(())
}

fn report(scenario: Scenario, config: &ScenarioConfig, log: &EventLog) -> Result<String> {
    let text = match scenario {
        Scenario::Fairness => fairness::run(&config.fairness, log)?.to_string(),
        Scenario::Withdraw => account::run(&config.withdraw, log)?.to_string(),
        Scenario::ReadWrite => read_write::run(&config.read_write, log)?.to_string(),
        Scenario::Handoff => handoff::run(&config.handoff, log)?.to_string(),
        Scenario::Deadlock => deadlock::run(&config.deadlock, log)?.to_string(),
        Scenario::DeadlockOrdered => {
            let mut ordered = config.deadlock.clone();
            ordered.ordered = true;
            deadlock::run(&ordered, log)?.to_string()
        }
        Scenario::Counter => counter::run(&config.counter, log)?.to_string(),
        Scenario::Visibility => visibility::run(&config.visibility, log)?.to_string(),
    };
    Ok(text)
}

//! CLI argument parsing for lockwork.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module. Every scenario flag is optional and, when
//! given, overrides the value from the config file.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lockwork: run lock, channel and lock-ordering scenarios on OS threads.
///
/// Each command runs one demonstration scenario, prints a summary, and
/// fails with a non-zero exit code when the outcome is not the expected one.
#[derive(Parser, Debug)]
#[command(name = "lockwork")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML file with scenario settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append the run's event trace to this NDJSON file.
    #[arg(long, global = true)]
    pub events: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available scenarios.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Contend for one lock and report the acquisition order.
    Fairness(FairnessArgs),

    /// Withdraw from a shared account with a timed lock acquire.
    Withdraw(WithdrawArgs),

    /// Readers and writers over a shared counter.
    #[command(name = "read-write")]
    ReadWrite(ReadWriteArgs),

    /// Producer-consumer through the bounded handoff channel.
    Handoff(HandoffArgs),

    /// Two tasks, two locks: reversed order deadlocks, ordered completes.
    Deadlock(DeadlockArgs),

    /// Tasks incrementing a shared counter under a lock.
    Counter(CounterArgs),

    /// One task raises a flag under a lock, another waits to see it.
    Visibility(VisibilityArgs),

    /// Run every scenario with the configured settings.
    All,
}

/// Arguments for the `fairness` command.
#[derive(Args, Debug, Default)]
pub struct FairnessArgs {
    /// Use an unordered (barging) lock instead of a FIFO one.
    #[arg(long)]
    pub unfair: bool,

    /// Number of contending tasks.
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Milliseconds each task holds the lock.
    #[arg(long)]
    pub hold_ms: Option<u64>,
}

/// Arguments for the `withdraw` command.
#[derive(Args, Debug, Default)]
pub struct WithdrawArgs {
    /// Number of withdrawing tasks.
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Amount each task withdraws.
    #[arg(long)]
    pub amount: Option<u64>,

    /// Opening balance.
    #[arg(long)]
    pub balance: Option<u64>,

    /// Milliseconds a task waits for the account lock.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Milliseconds spent inside the critical section.
    #[arg(long)]
    pub work_ms: Option<u64>,
}

/// Arguments for the `read-write` command.
#[derive(Args, Debug, Default)]
pub struct ReadWriteArgs {
    /// Number of reader tasks.
    #[arg(long)]
    pub readers: Option<usize>,

    /// Number of writer tasks.
    #[arg(long)]
    pub writers: Option<usize>,

    /// Reads or writes per task.
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Let readers pass a queued writer.
    #[arg(long)]
    pub reader_preferred: bool,
}

/// Arguments for the `handoff` command.
#[derive(Args, Debug, Default)]
pub struct HandoffArgs {
    /// Number of values to pass through the channel.
    #[arg(long)]
    pub items: Option<usize>,

    /// Channel capacity.
    #[arg(long)]
    pub capacity: Option<usize>,
}

/// Arguments for the `deadlock` command.
#[derive(Args, Debug, Default)]
pub struct DeadlockArgs {
    /// Acquire through the lock ordering policy.
    #[arg(long)]
    pub ordered: bool,

    /// Milliseconds a task waits for its second lock.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the `counter` command.
#[derive(Args, Debug, Default)]
pub struct CounterArgs {
    /// Number of incrementing tasks.
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Increments per task.
    #[arg(long)]
    pub increments: Option<usize>,
}

/// Arguments for the `visibility` command.
#[derive(Args, Debug, Default)]
pub struct VisibilityArgs {
    /// Milliseconds before the writer raises the flag.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Milliseconds the reader waits for the flag.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_all() {
        let cli = Cli::try_parse_from(["lockwork", "all"]).unwrap();
        assert!(matches!(cli.command, Command::All));
        assert!(cli.config.is_none());
        assert!(cli.events.is_none());
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lockwork",
            "counter",
            "--config",
            "scenarios.yaml",
            "--events",
            "trace.ndjson",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scenarios.yaml")));
        assert_eq!(cli.events, Some(PathBuf::from("trace.ndjson")));
    }

    #[test]
    fn parse_fairness_defaults() {
        let cli = Cli::try_parse_from(["lockwork", "fairness"]).unwrap();
        if let Command::Fairness(args) = cli.command {
            assert!(!args.unfair);
            assert!(args.tasks.is_none());
            assert!(args.hold_ms.is_none());
        } else {
            panic!("Expected Fairness command");
        }
    }

    #[test]
    fn parse_fairness_unfair() {
        let cli =
            Cli::try_parse_from(["lockwork", "fairness", "--unfair", "--tasks", "6"]).unwrap();
        if let Command::Fairness(args) = cli.command {
            assert!(args.unfair);
            assert_eq!(args.tasks, Some(6));
        } else {
            panic!("Expected Fairness command");
        }
    }

    #[test]
    fn parse_withdraw_full() {
        let cli = Cli::try_parse_from([
            "lockwork",
            "withdraw",
            "--tasks",
            "3",
            "--amount",
            "500",
            "--balance",
            "1000",
            "--timeout-ms",
            "1000",
            "--work-ms",
            "2000",
        ])
        .unwrap();
        if let Command::Withdraw(args) = cli.command {
            assert_eq!(args.tasks, Some(3));
            assert_eq!(args.amount, Some(500));
            assert_eq!(args.balance, Some(1000));
            assert_eq!(args.timeout_ms, Some(1000));
            assert_eq!(args.work_ms, Some(2000));
        } else {
            panic!("Expected Withdraw command");
        }
    }

    #[test]
    fn parse_read_write() {
        let cli = Cli::try_parse_from([
            "lockwork",
            "read-write",
            "--readers",
            "5",
            "--reader-preferred",
        ])
        .unwrap();
        if let Command::ReadWrite(args) = cli.command {
            assert_eq!(args.readers, Some(5));
            assert!(args.writers.is_none());
            assert!(args.reader_preferred);
        } else {
            panic!("Expected ReadWrite command");
        }
    }

    #[test]
    fn parse_deadlock_ordered() {
        let cli = Cli::try_parse_from(["lockwork", "deadlock", "--ordered"]).unwrap();
        if let Command::Deadlock(args) = cli.command {
            assert!(args.ordered);
        } else {
            panic!("Expected Deadlock command");
        }
    }

    #[test]
    fn parse_visibility() {
        let cli =
            Cli::try_parse_from(["lockwork", "visibility", "--delay-ms", "0", "--timeout-ms", "300"])
                .unwrap();
        if let Command::Visibility(args) = cli.command {
            assert_eq!(args.delay_ms, Some(0));
            assert_eq!(args.timeout_ms, Some(300));
        } else {
            panic!("Expected Visibility command");
        }
    }

    #[test]
    fn parse_rejects_non_numeric_capacity() {
        assert!(Cli::try_parse_from(["lockwork", "handoff", "--capacity", "one"]).is_err());
    }
}

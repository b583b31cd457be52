//! Account withdrawals through a timed acquire.
//!
//! Every task tries to withdraw the same amount at once. A task that cannot
//! get the account lock within the timeout gives up, and a task that finds
//! too little money withdraws nothing. The balance never goes negative.

use super::{StartGate, join_task, spawn_task, start_abandoned, wait_for, work};
use crate::config::WithdrawConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::{Lock, RawLock};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Result of one withdrawal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawal {
    Completed { remaining: u64 },
    InsufficientFunds { balance: u64 },
    LockTimedOut,
}

impl fmt::Display for Withdrawal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Withdrawal::Completed { remaining } => write!(f, "completed, {} remaining", remaining),
            Withdrawal::InsufficientFunds { balance } => {
                write!(f, "insufficient funds (balance {})", balance)
            }
            Withdrawal::LockTimedOut => write!(f, "could not get the account lock in time"),
        }
    }
}

/// A balance guarded by a FIFO lock.
#[derive(Debug)]
pub struct Account {
    lock: Lock,
    /// Read and written only while `lock` is held.
    balance: AtomicU64,
}

impl Account {
    pub fn new(balance: u64) -> Self {
        Self {
            lock: Lock::fair().named("account"),
            balance: AtomicU64::new(balance),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance.load(Ordering::SeqCst)
    }

    /// Withdraw `amount`, waiting at most `timeout` for the account lock and
    /// spending `work_ms` inside the critical section.
    pub fn withdraw(
        &self,
        amount: u64,
        timeout: Duration,
        work_ms: u64,
        log: &EventLog,
    ) -> Result<Withdrawal> {
        let _guard = match self.lock.try_acquire_for(timeout) {
            Ok(guard) => guard,
            Err(LockworkError::TimedOut) => {
                log.record(
                    Event::new(EventAction::TimedOut)
                        .with_subject(self.lock.name())
                        .with_details(json!({"timeout_ms": timeout.as_millis() as u64})),
                );
                return Ok(Withdrawal::LockTimedOut);
            }
            Err(err) => return Err(err),
        };
        log.record(Event::new(EventAction::Acquire).with_subject(self.lock.name()));

        let balance = self.balance.load(Ordering::SeqCst);
        let outcome = if balance >= amount {
            work(work_ms);
            let remaining = balance - amount;
            self.balance.store(remaining, Ordering::SeqCst);
            Withdrawal::Completed { remaining }
        } else {
            Withdrawal::InsufficientFunds { balance }
        };

        log.record(
            Event::new(EventAction::Withdraw)
                .with_subject(self.lock.name())
                .with_details(json!({
                    "amount": amount,
                    "completed": matches!(outcome, Withdrawal::Completed { .. }),
                    "balance": self.balance.load(Ordering::SeqCst),
                })),
        );
        Ok(outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawReport {
    pub opening: u64,
    pub amount: u64,
    /// Outcome per task, in task order.
    pub outcomes: Vec<(String, Withdrawal)>,
    pub closing: u64,
}

impl WithdrawReport {
    pub fn completed(&self) -> usize {
        self.count(|w| matches!(w, Withdrawal::Completed { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|w| *w == Withdrawal::LockTimedOut)
    }

    pub fn insufficient(&self) -> usize {
        self.count(|w| matches!(w, Withdrawal::InsufficientFunds { .. }))
    }

    fn count(&self, predicate: impl Fn(&Withdrawal) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, w)| predicate(w)).count()
    }
}

impl fmt::Display for WithdrawReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account withdrawals ({} each)", self.amount)?;
        for (task, outcome) in &self.outcomes {
            writeln!(f, "  {:8} {}", task, outcome)?;
        }
        write!(
            f,
            "  Balance: {} -> {} ({} completed, {} timed out, {} insufficient)",
            self.opening,
            self.closing,
            self.completed(),
            self.timed_out(),
            self.insufficient()
        )
    }
}

pub fn run(config: &WithdrawConfig, log: &EventLog) -> Result<WithdrawReport> {
    let account = Account::new(config.balance);
    let timeout = Duration::from_millis(config.timeout_ms);
    let gate = StartGate::new();

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "withdraw",
        "tasks": config.tasks,
        "balance": config.balance,
        "amount": config.amount,
    })));

    let outcomes = thread::scope(|s| -> Result<Vec<(String, Withdrawal)>> {
        let hold = gate.shut();
        let mut handles = Vec::with_capacity(config.tasks);
        for i in 1..=config.tasks {
            let (account, gate) = (&account, &gate);
            let name = format!("task-{}", i);
            handles.push((
                name.clone(),
                spawn_task(s, name, move || {
                    if !gate.pass() {
                        return Err(start_abandoned());
                    }
                    account.withdraw(config.amount, timeout, config.work_ms, log)
                })?,
            ));
        }
        // Release every task at once
        wait_for("tasks to reach the start gate", || {
            gate.waiting() == config.tasks
        })?;
        gate.open(hold);

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            outcomes.push((name, join_task(handle)??));
        }
        Ok(outcomes)
    })?;

    let report = WithdrawReport {
        opening: config.balance,
        amount: config.amount,
        outcomes,
        closing: account.balance(),
    };
    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "withdraw",
        "completed": report.completed(),
        "balance": report.closing,
    })));

    let withdrawn = report.amount * report.completed() as u64;
    if withdrawn > report.opening || report.closing != report.opening - withdrawn {
        return Err(LockworkError::ScenarioFailed(format!(
            "balance {} after {} withdrawals of {} from {}",
            report.closing,
            report.completed(),
            report.amount,
            report.opening
        )));
    }
    Ok(report)
}

//! Apply command-line flags on top of the loaded config.

use crate::cli::{
    CounterArgs, DeadlockArgs, FairnessArgs, HandoffArgs, ReadWriteArgs, VisibilityArgs,
    WithdrawArgs,
};
use lockwork::config::ScenarioConfig;

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

pub fn fairness(config: &mut ScenarioConfig, args: FairnessArgs) {
    let section = &mut config.fairness;
    if args.unfair {
        section.fair = false;
    }
    set(&mut section.tasks, args.tasks);
    set(&mut section.hold_ms, args.hold_ms);
}

pub fn withdraw(config: &mut ScenarioConfig, args: WithdrawArgs) {
    let section = &mut config.withdraw;
    set(&mut section.tasks, args.tasks);
    set(&mut section.amount, args.amount);
    set(&mut section.balance, args.balance);
    set(&mut section.timeout_ms, args.timeout_ms);
    set(&mut section.work_ms, args.work_ms);
}

pub fn read_write(config: &mut ScenarioConfig, args: ReadWriteArgs) {
    let section = &mut config.read_write;
    set(&mut section.readers, args.readers);
    set(&mut section.writers, args.writers);
    set(&mut section.iterations, args.iterations);
    if args.reader_preferred {
        section.reader_preferred = true;
    }
}

pub fn handoff(config: &mut ScenarioConfig, args: HandoffArgs) {
    set(&mut config.handoff.items, args.items);
    set(&mut config.handoff.capacity, args.capacity);
}

pub fn deadlock(config: &mut ScenarioConfig, args: DeadlockArgs) {
    if args.ordered {
        config.deadlock.ordered = true;
    }
    set(&mut config.deadlock.timeout_ms, args.timeout_ms);
}

pub fn counter(config: &mut ScenarioConfig, args: CounterArgs) {
    set(&mut config.counter.tasks, args.tasks);
    set(&mut config.counter.increments, args.increments);
}

pub fn visibility(config: &mut ScenarioConfig, args: VisibilityArgs) {
    set(&mut config.visibility.delay_ms, args.delay_ms);
    set(&mut config.visibility.timeout_ms, args.timeout_ms);
}

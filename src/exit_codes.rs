//! Exit code constants for the lockwork CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Scenario finished with an unexpected outcome
//! - 3: A wait timed out or was cancelled
//! - 4: Lock usage defect (non-owner release, order violation)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or I/O failure.
pub const USER_ERROR: i32 = 1;

/// Scenario failure: a demonstration did not reach its expected outcome.
pub const SCENARIO_FAILURE: i32 = 2;

/// Wait failure: a bounded or cancellable wait did not complete.
pub const WAIT_FAILURE: i32 = 3;

/// Usage defect: a lock was released by a non-owner or acquired out of order.
pub const USAGE_DEFECT: i32 = 4;

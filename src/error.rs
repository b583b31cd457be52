//! Error types for lockwork.
//!
//! Uses thiserror for derive macros. Primitive outcomes (`TimedOut`,
//! `Cancelled`) are expected and recoverable; `NotOwner` and
//! `LockOrderViolation` are caller bugs and always propagate.

use crate::exit_codes;
use crate::ordering::Rank;
use thiserror::Error;

/// Main error type for lockwork operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockworkError {
    /// A bounded wait reached its deadline before the resource was granted.
    #[error("timed out before the wait was satisfied")]
    TimedOut,

    /// The wait's cancel token fired before the resource was granted.
    #[error("wait was cancelled")]
    Cancelled,

    /// A lock was released by a thread that does not hold it.
    #[error("lock '{lock}' is not held by the calling thread")]
    NotOwner { lock: String },

    /// A lock was requested while holding a lock of equal or higher rank.
    #[error("lock order violation: requested '{lock}' (rank {requested}) while holding rank {held}")]
    LockOrderViolation {
        lock: String,
        held: Rank,
        requested: Rank,
    },

    /// A lock was used with an ordering policy it was never registered with.
    #[error("lock '{lock}' is not registered with this ordering policy")]
    UnregisteredLock { lock: String },

    /// Two locks were given the same rank.
    #[error("rank {rank} is already assigned to another lock")]
    RankConflict { rank: Rank },

    /// A constructor or operation received an argument outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Bad CLI input, configuration, or I/O failure.
    #[error("{0}")]
    UserError(String),

    /// A scenario finished with an outcome other than the expected one.
    #[error("Scenario failed: {0}")]
    ScenarioFailed(String),
}

impl LockworkError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockworkError::TimedOut | LockworkError::Cancelled => exit_codes::WAIT_FAILURE,
            LockworkError::NotOwner { .. }
            | LockworkError::LockOrderViolation { .. }
            | LockworkError::UnregisteredLock { .. }
            | LockworkError::RankConflict { .. } => exit_codes::USAGE_DEFECT,
            LockworkError::InvalidArgument(_) | LockworkError::UserError(_) => {
                exit_codes::USER_ERROR
            }
            LockworkError::ScenarioFailed(_) => exit_codes::SCENARIO_FAILURE,
        }
    }

    /// Whether this error is an expected outcome of a bounded or cancellable wait.
    pub fn is_wait_outcome(&self) -> bool {
        matches!(self, LockworkError::TimedOut | LockworkError::Cancelled)
    }
}

/// Result type alias for lockwork operations.
pub type Result<T> = std::result::Result<T, LockworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_outcomes_share_an_exit_code() {
        assert_eq!(LockworkError::TimedOut.exit_code(), exit_codes::WAIT_FAILURE);
        assert_eq!(LockworkError::Cancelled.exit_code(), exit_codes::WAIT_FAILURE);
        assert!(LockworkError::TimedOut.is_wait_outcome());
        assert!(LockworkError::Cancelled.is_wait_outcome());
    }

    #[test]
    fn caller_bugs_are_usage_defects() {
        let err = LockworkError::NotOwner {
            lock: "account".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::USAGE_DEFECT);
        assert!(!err.is_wait_outcome());

        let err = LockworkError::LockOrderViolation {
            lock: "lock1".to_string(),
            held: 2,
            requested: 1,
        };
        assert_eq!(err.exit_code(), exit_codes::USAGE_DEFECT);
    }

    #[test]
    fn user_and_scenario_errors_have_correct_exit_codes() {
        let err = LockworkError::UserError("bad config".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = LockworkError::InvalidArgument("capacity must be at least 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = LockworkError::ScenarioFailed("count mismatch".to_string());
        assert_eq!(err.exit_code(), exit_codes::SCENARIO_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = LockworkError::NotOwner {
            lock: "account".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "lock 'account' is not held by the calling thread"
        );

        let err = LockworkError::LockOrderViolation {
            lock: "lock1".to_string(),
            held: 2,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "lock order violation: requested 'lock1' (rank 1) while holding rank 2"
        );
    }
}

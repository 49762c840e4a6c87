//! Outcomes of two-step creates that are not wrapped in a transaction
//!
//! Sign-up writes an auth identity and then a profile row; an enquiry writes
//! a conversation and then its first message. Each step is a separate call
//! to a separate system, so a failure between them leaves one of the states
//! below. Which terminal states a workflow can reach depends on whether it
//! defines a compensation step.

use crate::error::{AppError, AppResult};

#[derive(Debug)]
pub enum SagaOutcome<T> {
    /// Both steps succeeded
    Completed(T),

    /// The first step failed (or input was rejected); nothing was written
    Aborted(AppError),

    /// The second step failed and the first step's write was kept.
    /// Used where no compensation is defined.
    LeftInPlace { error: AppError },

    /// The second step failed and the first step was undone
    Compensated { error: AppError },

    /// The second step failed and undoing the first step failed too. The
    /// first step's write is orphaned.
    CompensationFailed {
        error: AppError,
        compensation_error: AppError,
    },
}

impl<T> SagaOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SagaOutcome::Completed(_))
    }

    /// Collapse to the value or the error the caller should see
    pub fn into_result(self) -> AppResult<T> {
        match self {
            SagaOutcome::Completed(value) => Ok(value),
            SagaOutcome::Aborted(error)
            | SagaOutcome::LeftInPlace { error }
            | SagaOutcome::Compensated { error }
            | SagaOutcome::CompensationFailed { error, .. } => Err(error),
        }
    }
}

//! Error types for streakust.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad recurrence, bad date, unknown task, not scheduled today)
//! - 4: Operation failed (I/O, corrupt database, lock contention)

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Exit codes for the streakust CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid recurrence configuration: {0}")]
    InvalidRecurrenceConfig(String),

    #[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Task {id} is not scheduled on {date}")]
    NotDueToday { id: u64, date: NaiveDate },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidRecurrenceConfig(_)
            | Error::InvalidDate(_)
            | Error::TaskNotFound(_)
            | Error::NotDueToday { .. } => exit_codes::USER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

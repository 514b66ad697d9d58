//! # Streakust
//!
//! Recurring tasks ("dailies") with streak tracking.
//!
//! The core is pure and date driven: every operation takes the current
//! calendar date as an argument instead of reading the system clock.
//!
//! * [`recurrence`]: is a task due on a given date?
//! * [`completion`]: complete / uncomplete / archive / reset transitions.
//! * [`rollover`]: the daily sweep that clears yesterday's completions.
//! * [`leaderboard`]: ordering tasks by their streaks.
//!
//! [`storage`] persists tasks behind the [`storage::TaskRepository`] trait and
//! [`commands`] wires everything together for the `streakust` binary.

pub mod clock;
pub mod commands;
pub mod completion;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod recurrence;
pub mod rollover;
pub mod storage;

pub use error::{Error, Result};

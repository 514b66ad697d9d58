//! Completion and streak transitions.
//!
//! A task cycles between [`CompletionState::Pending`] and
//! [`CompletionState::DoneToday`]. Every transition takes the task by value and
//! hands it back, so callers decide when the result is persisted.
//!
//! These functions do not check whether the task is due: gating a completion
//! on [`crate::recurrence::is_due_today`] is the caller's policy.
//!
//! `complete` reads `last_completed_date` and then writes the streak. Two
//! concurrent completions of the same stored task must therefore go through a
//! single atomic load/transition/save (see [`crate::storage::TaskRepository::update`]),
//! otherwise both can observe a stale date and the streak is counted twice.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Not completed on the given date.
    Pending,
    /// Completed on the given date.
    DoneToday,
}

pub fn state(task: &Task, today: NaiveDate) -> CompletionState {
    if task.last_completed_date == Some(today) {
        CompletionState::DoneToday
    } else {
        CompletionState::Pending
    }
}

/// Marks the task done for `today` and extends its streak.
///
/// A second completion on the same date returns the task unchanged.
pub fn complete(mut task: Task, today: NaiveDate) -> Task {
    if task.last_completed_date == Some(today) {
        debug!(task = task.id, %today, "already completed today");
        return task;
    }
    task.is_completed = true;
    task.last_completed_date = Some(today);
    task.streak = task.streak.saturating_add(1);
    task.longest_streak = task.longest_streak.max(task.streak);
    info!(task = task.id, %today, streak = task.streak, "task completed");
    task
}

/// Undoes a completion made on `today`.
///
/// Completions from earlier dates cannot be undone; in that case, or when
/// there is nothing to undo, the task is returned unchanged. The longest
/// streak is kept.
pub fn uncomplete(mut task: Task, today: NaiveDate) -> Task {
    if task.last_completed_date != Some(today) {
        debug!(task = task.id, %today, "no completion today to undo");
        return task;
    }
    task.is_completed = false;
    task.last_completed_date = None;
    task.streak = task.streak.saturating_sub(1);
    info!(task = task.id, %today, streak = task.streak, "task uncompleted");
    task
}

pub fn archive(mut task: Task) -> Task {
    task.is_archived = true;
    info!(task = task.id, "task archived");
    task
}

pub fn unarchive(mut task: Task) -> Task {
    task.is_archived = false;
    info!(task = task.id, "task unarchived");
    task
}

/// Breaks the streak, e.g. as a penalty for a missed day.
///
/// The rollover sweep never calls this; it is up to the caller.
pub fn reset_streak(mut task: Task) -> Task {
    task.streak = 0;
    task.is_completed = false;
    info!(task = task.id, "streak reset");
    task
}

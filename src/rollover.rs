use chrono::NaiveDate;
use tracing::info;

use crate::models::Task;

/// Clears the "completed" flag of every task completed before `today`.
///
/// Archived tasks are skipped. Streaks and `last_completed_date` are left
/// alone, so a missed day does not break a streak here. Running it twice on
/// the same date changes nothing the second time.
///
/// Meant to run once per calendar day as a single serialized batch. If the
/// work is split, each task must belong to exactly one partition.
///
/// # Returns
/// The number of tasks that were changed.
pub fn sweep(tasks: &mut [Task], today: NaiveDate) -> usize {
    let mut count = 0;
    for task in tasks.iter_mut() {
        if needs_rollover(task, today) {
            task.is_completed = false;
            count += 1;
        }
    }
    info!(%today, count, "rollover sweep finished");
    count
}

fn needs_rollover(task: &Task, today: NaiveDate) -> bool {
    !task.is_archived && task.is_completed && task.last_completed_date != Some(today)
}

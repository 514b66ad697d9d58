use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::{Recurrence, Task};

/// How far ahead [`next_due_dates`] looks before giving up.
const LOOKAHEAD_DAYS: i64 = 366 * 5;

/// Decides whether a task is due on `today`.
///
/// - Archived tasks and tasks whose schedule has not started are never due.
/// - **Daily**: every `every_x` days counted from the start date.
/// - **Weekly**: on the listed weekdays (or any day if none are listed) of
///   every `every_x`-th week counted in whole weeks from the start date.
/// - **Monthly** / **Yearly**: any day of every `every_x`-th calendar month
///   or year. The day of month is not compared.
///
/// Never fails: recurrence values are validated when they are constructed.
pub fn is_due_today(task: &Task, today: NaiveDate) -> bool {
    if task.is_archived || task.start_date > today {
        return false;
    }
    let due = matches_schedule(&task.recurrence, task.start_date, today);
    debug!(task = task.id, %today, due, "evaluated recurrence");
    due
}

fn matches_schedule(recurrence: &Recurrence, start: NaiveDate, today: NaiveDate) -> bool {
    let every_x = i64::from(recurrence.every_x().get());
    let days_since_start = (today - start).num_days();
    match recurrence {
        Recurrence::Daily { .. } => days_since_start % every_x == 0,
        Recurrence::Weekly { repeat_days, .. } => {
            let weekday_ok = repeat_days.is_empty() || repeat_days.contains(today.weekday());
            let weeks_since_start = days_since_start / 7;
            weekday_ok && weeks_since_start % every_x == 0
        }
        Recurrence::Monthly { .. } => {
            let months_since_start = i64::from(today.year() - start.year()) * 12
                + i64::from(today.month()) - i64::from(start.month());
            months_since_start % every_x == 0
        }
        Recurrence::Yearly { .. } => {
            let years_since_start = i64::from(today.year() - start.year());
            years_since_start % every_x == 0
        }
    }
}

/// Lists the next `count` dates, starting at `from` inclusive, on which the
/// task is due.
///
/// Looks at most five years ahead, so a sparse schedule may return fewer
/// than `count` dates. Archived tasks return an empty list.
pub fn next_due_dates(task: &Task, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    if task.is_archived || count == 0 {
        return Vec::new();
    }
    // Nothing can be due before the schedule starts.
    let first = from.max(task.start_date);
    let last = from
        .checked_add_signed(Duration::days(LOOKAHEAD_DAYS))
        .unwrap_or(NaiveDate::MAX);
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| matches_schedule(&task.recurrence, task.start_date, *d))
        .take(count)
        .collect()
}

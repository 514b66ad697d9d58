use std::cmp::Ordering;

use crate::models::Task;

/// Orders tasks by longest streak, then current streak, then newest first,
/// and keeps the top `limit`.
pub fn rank(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut ranked: Vec<Task> = tasks.to_vec();
    ranked.sort_by(compare);
    ranked.truncate(limit);
    ranked
}

fn compare(a: &Task, b: &Task) -> Ordering {
    b.longest_streak
        .cmp(&a.longest_streak)
        .then_with(|| b.streak.cmp(&a.streak))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

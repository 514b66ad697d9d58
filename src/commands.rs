use chrono::{NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::warn;

use crate::completion::{self, CompletionState};
use crate::error::{Error, Result};
use crate::leaderboard::rank;
use crate::models::{parse_date, NewTask, Recurrence, RepeatType, Task};
use crate::recurrence::{is_due_today, next_due_dates};
use crate::storage::TaskRepository;

/// Options for [`cmd_add`], as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub name: String,
    pub repeat: String,
    pub every: u32,
    pub days: Vec<String>,
    pub start: Option<String>,
    pub owner: Option<String>,
    pub position: Option<u32>,
}

/// Parses a weekday given as a number (0 = Sunday), a full name (`Monday`)
/// or a three-letter abbreviation (`mon`).
pub fn parse_weekday(s: &str) -> Result<u8> {
    const NAMES: [&str; 7] = ["sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday"];

    let s = s.trim().to_lowercase();
    if let Ok(n) = s.parse::<u8>() {
        return Ok(n);
    }
    NAMES
        .iter()
        .position(|name| *name == s || (s.len() == 3 && name.starts_with(s.as_str())))
        .map(|i| i as u8)
        .ok_or_else(|| Error::InvalidRecurrenceConfig(format!("unknown weekday '{}'", s)))
}

/// Status column text for a task on `today`.
///
/// A task whose streak was reset after completing today counts as pending,
/// even though its completion date is still today.
pub fn status_label(task: &Task, today: NaiveDate) -> &'static str {
    if task.is_archived {
        return "Archived";
    }
    match completion::state(task, today) {
        CompletionState::DoneToday if task.is_completed => "Done",
        _ if is_due_today(task, today) => "Pending",
        _ => "-",
    }
}

/// Adds a new recurring task.
///
/// The recurrence is validated here, before the task ever reaches the core.
/// The schedule starts today unless `start` is given.
pub fn cmd_add<R: TaskRepository>(repo: &R, opts: AddOptions, today: NaiveDate, silent: bool) -> Result<Task> {
    let repeat_type: RepeatType = opts.repeat.parse()?;
    let days = opts
        .days
        .iter()
        .flat_map(|d| d.split(','))
        .filter(|d| !d.trim().is_empty())
        .map(parse_weekday)
        .collect::<Result<Vec<u8>>>()?;
    let recurrence = Recurrence::from_parts(repeat_type, opts.every, &days)?;
    let start_date = match &opts.start {
        Some(s) => parse_date(s)?,
        None => today,
    };

    let mut new_task = NewTask::new(opts.name, recurrence, start_date).position(opts.position.unwrap_or(0));
    if let Some(owner) = opts.owner {
        new_task = new_task.owner(owner);
    }
    let task = repo.insert(new_task, Utc::now())?;
    if !silent {
        println!("Task added (id = {}), {} from {}", task.id, task.recurrence, task.start_date);
    }
    Ok(task)
}

/// Completes a task for `today`.
///
/// Refuses tasks that are not scheduled on `today`. Completing twice on the
/// same day is accepted and leaves the streak as it was.
pub fn cmd_complete<R: TaskRepository>(repo: &R, id: u64, today: NaiveDate, silent: bool) -> Result<Task> {
    let task = repo.update(id, |t| {
        if !is_due_today(&t, today) {
            warn!(task = id, %today, "completion rejected, task not due");
            return Err(Error::NotDueToday { id, date: today });
        }
        Ok(completion::complete(t, today))
    })?;
    if !task.is_completed {
        // Reset earlier today: the completion date is already taken.
        warn!(task = id, %today, "completion ignored, streak was reset today");
        if !silent {
            println!("Task {} had its streak reset today and can be completed again tomorrow.", id);
        }
    } else if !silent {
        println!("Task {} completed. Streak: {} (best {})", id, task.streak, task.longest_streak);
    }
    Ok(task)
}

/// Undoes today's completion of a task, if any.
pub fn cmd_uncomplete<R: TaskRepository>(repo: &R, id: u64, today: NaiveDate, silent: bool) -> Result<Task> {
    let task = repo.update(id, |t| Ok(completion::uncomplete(t, today)))?;
    if !silent {
        println!("Task {} is pending. Streak: {}", id, task.streak);
    }
    Ok(task)
}

pub fn cmd_archive<R: TaskRepository>(repo: &R, id: u64, silent: bool) -> Result<Task> {
    let task = repo.update(id, |t| Ok(completion::archive(t)))?;
    if !silent {
        println!("Task {} archived.", id);
    }
    Ok(task)
}

pub fn cmd_unarchive<R: TaskRepository>(repo: &R, id: u64, silent: bool) -> Result<Task> {
    let task = repo.update(id, |t| Ok(completion::unarchive(t)))?;
    if !silent {
        println!("Task {} restored.", id);
    }
    Ok(task)
}

pub fn cmd_reset_streak<R: TaskRepository>(repo: &R, id: u64, silent: bool) -> Result<Task> {
    let task = repo.update(id, |t| Ok(completion::reset_streak(t)))?;
    if !silent {
        println!("Streak of task {} reset.", id);
    }
    Ok(task)
}

/// Removes a task from the database by ID.
pub fn cmd_remove<R: TaskRepository>(repo: &R, id: u64, silent: bool) -> Result<Task> {
    let task = repo.remove(id)?;
    if !silent {
        println!("Task {} removed.", id);
    }
    Ok(task)
}

/// Runs the daily rollover over the whole database.
pub fn cmd_sweep<R: TaskRepository>(repo: &R, today: NaiveDate, silent: bool) -> Result<usize> {
    let count = repo.sweep(today)?;
    if !silent {
        println!("Rolled over {} task(s) for {}.", count, today);
    }
    Ok(count)
}

/// Lists tasks in a formatted table, ordered by position.
///
/// Archived tasks are hidden unless `all` is true. With `due_only`, only
/// tasks due on `today` are shown.
pub fn cmd_list<R: TaskRepository>(repo: &R, all: bool, due_only: bool, today: NaiveDate) -> Result<()> {
    let mut tasks = repo.load_tasks()?;
    if !all {
        tasks.retain(|t| !t.is_archived);
    }
    if due_only {
        tasks.retain(|t| is_due_today(t, today));
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    tasks.sort_by_key(|t| (t.position, t.id));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Schedule").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Streak").add_attribute(Attribute::Bold),
            Cell::new("Best").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let due = is_due_today(&t, today);
        let status = status_label(&t, today);
        let status_color = match status {
            "Done" => Color::Green,
            "Pending" => Color::Yellow,
            "Archived" => Color::Grey,
            _ => Color::Reset,
        };

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.name),
            Cell::new(t.recurrence),
            Cell::new(t.start_date),
            Cell::new(if due { "Today" } else { "" }).fg(if due { Color::Cyan } else { Color::Reset }),
            Cell::new(t.streak),
            Cell::new(t.longest_streak),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Prints the tasks with the best streaks.
pub fn cmd_leaderboard<R: TaskRepository>(repo: &R, limit: usize) -> Result<Vec<Task>> {
    let tasks = repo.load_tasks()?;
    let ranked = rank(&tasks, limit);
    if ranked.is_empty() {
        println!("No tasks found.");
        return Ok(ranked);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "ID", "Name", "Best", "Streak", "Created"]);
    for (i, t) in ranked.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            t.id.to_string(),
            t.name.clone(),
            t.longest_streak.to_string(),
            t.streak.to_string(),
            t.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    println!("{table}");
    Ok(ranked)
}

/// Prints the next `count` dates on which a task is due.
pub fn cmd_upcoming<R: TaskRepository>(repo: &R, id: u64, count: usize, today: NaiveDate) -> Result<Vec<NaiveDate>> {
    let task = repo.load_task(id)?;
    let dates = next_due_dates(&task, today, count);
    if dates.is_empty() {
        println!("Task {} has no upcoming dates.", id);
    } else {
        println!("Task {} ({}):", id, task.recurrence);
        for d in &dates {
            println!("  {} {}", d, d.format("%a"));
        }
    }
    Ok(dates)
}

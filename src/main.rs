//! # Streakust
//!
//! A terminal tracker for recurring tasks and the streaks you build on them.
//!
//! ## Usage
//!
//! ```bash
//! # Every day
//! streakust add "Stretch" --repeat daily
//!
//! # Mondays, Wednesdays and Fridays of every other week
//! streakust add "Gym" --repeat weekly --every 2 --days mon,wed,fri
//!
//! # What is due today
//! streakust due
//!
//! # Mark done / undo
//! streakust complete <ID>
//! streakust uncomplete <ID>
//!
//! # Daily housekeeping, e.g. from cron
//! streakust sweep
//!
//! # Best streaks
//! streakust leaderboard --limit 10
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/streakust/tasks.json`
//! *   macOS: `~/Library/Application Support/streakust/tasks.json`
//! *   Windows: `%APPDATA%\streakust\tasks.json`
//!
//! You can override this by setting the `STREAKS_DB` environment variable.
//! `--today YYYY-MM-DD` (or `STREAKS_TODAY`) replaces the system date.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use streakust::clock::{Clock, FixedClock, SystemClock};
use streakust::commands::*;
use streakust::error::{exit_codes, Result};
use streakust::models::parse_date;
use streakust::storage::JsonTaskStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "streakust")]
#[command(about = "Recurring tasks and streaks", long_about = None)]
struct Cli {
    /// Use this date (YYYY-MM-DD) instead of the system date
    #[arg(long, global = true, env = "STREAKS_TODAY")]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new recurring task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Repeat type (daily, weekly, monthly, yearly)
        #[arg(short, long, default_value = "daily")]
        repeat: String,
        /// Repeat every N periods
        #[arg(short, long, default_value_t = 1)]
        every: u32,
        /// Weekdays for weekly tasks, e.g. mon,wed,fri or 1,3,5 (0 = Sunday)
        #[arg(short, long, value_delimiter = ',')]
        days: Vec<String>,
        /// Start date in YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        start: Option<String>,
        /// Owner identifier
        #[arg(short, long)]
        owner: Option<String>,
        /// Display position
        #[arg(short, long)]
        position: Option<u32>,
    },
    /// List tasks
    List {
        /// Include archived tasks
        #[arg(short, long)]
        all: bool,
    },
    /// List tasks due today
    Due,
    /// Mark a task as done for today
    Complete { id: u64 },
    /// Undo today's completion of a task
    Uncomplete { id: u64 },
    /// Archive a task
    Archive { id: u64 },
    /// Restore an archived task
    Unarchive { id: u64 },
    /// Reset the streak of a task
    ResetStreak { id: u64 },
    /// Remove a task
    Remove { id: u64 },
    /// Clear completions from previous days
    Sweep,
    /// Show the tasks with the best streaks
    Leaderboard {
        /// Number of tasks to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the next dates a task is due
    Upcoming {
        id: u64,
        /// Number of dates to show
        #[arg(short, long, default_value_t = 7)]
        count: usize,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn init_tracing() {
    // Opt-in via RUST_LOG.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let today = match &cli.today {
        Some(s) => FixedClock(parse_date(s)?).today(),
        None => SystemClock.today(),
    };
    let repo = JsonTaskStore::from_env();

    match cli.command {
        Commands::Add { name, repeat, every, days, start, owner, position } => {
            let opts = AddOptions { name, repeat, every, days, start, owner, position };
            cmd_add(&repo, opts, today, false).map(|_| ())
        }
        Commands::List { all } => cmd_list(&repo, all, false, today),
        Commands::Due => cmd_list(&repo, false, true, today),
        Commands::Complete { id } => cmd_complete(&repo, id, today, false).map(|_| ()),
        Commands::Uncomplete { id } => cmd_uncomplete(&repo, id, today, false).map(|_| ()),
        Commands::Archive { id } => cmd_archive(&repo, id, false).map(|_| ()),
        Commands::Unarchive { id } => cmd_unarchive(&repo, id, false).map(|_| ()),
        Commands::ResetStreak { id } => cmd_reset_streak(&repo, id, false).map(|_| ()),
        Commands::Remove { id } => cmd_remove(&repo, id, false).map(|_| ()),
        Commands::Sweep => cmd_sweep(&repo, today, false).map(|_| ()),
        Commands::Leaderboard { limit } => cmd_leaderboard(&repo, limit).map(|_| ()),
        Commands::Upcoming { id, count } => cmd_upcoming(&repo, id, count, today).map(|_| ()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "streakust", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

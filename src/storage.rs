use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewTask, Task};
use crate::rollover;

/// How long to wait for another process holding the database lock.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_RETRY_INTERVAL_MS: u64 = 25;

/// Returns the path to the tasks database file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `STREAKS_DB` environment variable.
/// 2. `~/.local/share/streakust/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var("STREAKS_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("streakust");
        p.push("tasks.json");
        p
    })
}

/// Persistence for tasks.
///
/// Implementors only provide [`TaskRepository::transaction`]; every other
/// operation is a read-check-write inside one transaction, which is what
/// keeps two concurrent completions of the same task from both extending
/// its streak.
pub trait TaskRepository {
    /// Runs `f` over all stored tasks while holding the repository's
    /// exclusive lock.
    ///
    /// `f` returns its result and whether it changed anything. Changes are
    /// persisted only when `f` succeeds and reports a change.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<(T, bool)>;

    fn load_tasks(&self) -> Result<Vec<Task>> {
        self.transaction(|tasks| Ok((tasks.clone(), false)))
    }

    fn load_task(&self, id: u64) -> Result<Task> {
        self.transaction(|tasks| {
            let task = tasks
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(Error::TaskNotFound(id))?;
            Ok((task, false))
        })
    }

    /// Stores a new task under the next free id.
    fn insert(&self, new_task: NewTask, created_at: DateTime<Utc>) -> Result<Task> {
        self.transaction(|tasks| {
            let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            let task = new_task.into_task(next_id, created_at);
            tasks.push(task.clone());
            Ok((task, true))
        })
    }

    fn remove(&self, id: u64) -> Result<Task> {
        self.transaction(|tasks| {
            let idx = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(Error::TaskNotFound(id))?;
            Ok((tasks.remove(idx), true))
        })
    }

    /// Loads one task, applies `f` and saves the result atomically.
    fn update<F>(&self, id: u64, f: F) -> Result<Task>
    where
        F: FnOnce(Task) -> Result<Task>,
    {
        self.transaction(|tasks| {
            let slot = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(Error::TaskNotFound(id))?;
            let updated = f(slot.clone())?;
            let changed = updated != *slot;
            *slot = updated.clone();
            Ok((updated, changed))
        })
    }

    /// Runs the rollover sweep over every stored task.
    fn sweep(&self, today: NaiveDate) -> Result<usize> {
        self.transaction(|tasks| {
            let count = rollover::sweep(tasks, today);
            Ok((count, count > 0))
        })
    }
}

/// Tasks stored as pretty-printed JSON, guarded by an exclusive file lock
/// next to the database (`tasks.json.lock`).
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonTaskStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self {
            path,
            lock_path,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    /// Opens the database at [`db_path`].
    pub fn from_env() -> Self {
        Self::open(db_path())
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Task>> {
        let mut f = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&s)?)
    }

    /// Writes to a temporary file and renames it over the database.
    fn write_all(&self, tasks: &[Task]) -> Result<()> {
        let s = serde_json::to_string_pretty(tasks)?;
        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        f.write_all(s.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl TaskRepository for JsonTaskStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<(T, bool)>,
    {
        let _lock = FileLock::acquire(&self.lock_path, self.lock_timeout)?;
        let mut tasks = self.read_all()?;
        let (out, changed) = f(&mut tasks)?;
        if changed {
            self.write_all(&tasks)?;
            debug!(path = %self.path.display(), count = tasks.len(), "tasks saved");
        }
        Ok(out)
    }
}

/// Exclusive lock on a file, released on drop.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    std::thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Tasks held in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }
}

impl TaskRepository for MemoryTaskStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<(T, bool)>,
    {
        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let mut working = guard.clone();
        let (out, changed) = f(&mut working)?;
        if changed {
            *guard = working;
        }
        Ok(out)
    }
}

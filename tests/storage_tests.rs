use std::fs::{self, OpenOptions};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use streakust::completion::complete;
use fs2::FileExt;
use streakust::error::{exit_codes, Error};
use streakust::models::{NewTask, Recurrence};
use streakust::storage::{JsonTaskStore, MemoryTaskStore, TaskRepository};
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn new_task(name: &str) -> NewTask {
    NewTask::new(name, Recurrence::default(), d(2024, 1, 1))
}

fn created() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn json_store() -> (TempDir, JsonTaskStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonTaskStore::open(dir.path().join("tasks.json"));
    (dir, store)
}

#[test]
fn test_missing_database_is_empty() {
    let (_dir, store) = json_store();
    assert!(store.load_tasks().unwrap().is_empty());
    assert!(matches!(store.load_task(1), Err(Error::TaskNotFound(1))));
}

#[test]
fn test_insert_assigns_ids_and_persists() {
    let (_dir, store) = json_store();
    let a = store.insert(new_task("A"), created()).unwrap();
    let b = store.insert(new_task("B"), created()).unwrap();
    assert_eq!((a.id, b.id), (1, 2));

    let reopened = JsonTaskStore::open(store.path());
    let tasks = reopened.load_tasks().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].name, "B");
}

#[test]
fn test_update_persists_transition() {
    let (_dir, store) = json_store();
    let t = store.insert(new_task("A"), created()).unwrap();
    let today = d(2024, 1, 5);
    store.update(t.id, |t| Ok(complete(t, today))).unwrap();

    let loaded = store.load_task(t.id).unwrap();
    assert_eq!(loaded.streak, 1);
    assert_eq!(loaded.last_completed_date, Some(today));
}

#[test]
fn test_failed_update_changes_nothing() {
    let (_dir, store) = json_store();
    let t = store.insert(new_task("A"), created()).unwrap();
    let res = store.update(t.id, |mut t| {
        t.streak = 99;
        Err(Error::NotDueToday { id: t.id, date: d(2024, 1, 1) })
    });
    assert!(matches!(res, Err(Error::NotDueToday { .. })));
    assert_eq!(store.load_task(t.id).unwrap().streak, 0);
    assert!(matches!(store.update(42, Ok), Err(Error::TaskNotFound(42))));
}

#[test]
fn test_remove() {
    let (_dir, store) = json_store();
    let t = store.insert(new_task("A"), created()).unwrap();
    assert_eq!(store.remove(t.id).unwrap().name, "A");
    assert!(store.load_tasks().unwrap().is_empty());
    assert!(matches!(store.remove(t.id), Err(Error::TaskNotFound(_))));
}

#[test]
fn test_sweep_persists() {
    let (_dir, store) = json_store();
    let t = store.insert(new_task("A"), created()).unwrap();
    store.update(t.id, |t| Ok(complete(t, d(2024, 1, 1)))).unwrap();

    assert_eq!(store.sweep(d(2024, 1, 2)).unwrap(), 1);
    assert_eq!(store.sweep(d(2024, 1, 2)).unwrap(), 0);
    let loaded = store.load_task(t.id).unwrap();
    assert!(!loaded.is_completed);
    assert_eq!(loaded.streak, 1);
}

#[test]
fn test_corrupt_database_is_an_error() {
    let (_dir, store) = json_store();
    fs::write(store.path(), "not json").unwrap();
    assert!(matches!(store.load_tasks(), Err(Error::Json(_))));
}

#[test]
fn test_concurrent_completions_count_once() {
    let (_dir, store) = json_store();
    let t = store.insert(new_task("A"), created()).unwrap();
    let today = d(2024, 1, 1);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || store.update(t.id, |t| Ok(complete(t, today))).unwrap())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.load_task(t.id).unwrap().streak, 1);
}

#[test]
fn test_memory_store_concurrent_completions_count_once() {
    let store = MemoryTaskStore::default();
    let t = store.insert(new_task("A"), created()).unwrap();
    let today = d(2024, 1, 1);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| store.update(t.id, |t| Ok(complete(t, today))).unwrap());
        }
    });
    let loaded = store.load_task(t.id).unwrap();
    assert_eq!(loaded.streak, 1);
    assert_eq!(loaded.longest_streak, 1);
}

#[test]
fn test_lock_contention_times_out() {
    let (dir, store) = json_store();
    store.insert(new_task("A"), created()).unwrap();

    let holder = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(dir.path().join("tasks.json.lock"))
        .unwrap();
    holder.lock_exclusive().unwrap();

    let store = store.with_lock_timeout(Duration::from_millis(50));
    let err = store.update(1, |t| Ok(complete(t, d(2024, 1, 1)))).unwrap_err();
    assert!(matches!(err, Error::LockFailed(_)));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);

    FileExt::unlock(&holder).unwrap();
    assert_eq!(store.load_task(1).unwrap().streak, 0);
}

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use streakust::models::{NewTask, Recurrence, RepeatType, Task};
use streakust::recurrence::{is_due_today, next_due_dates};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn task(repeat: RepeatType, every: u32, days: &[u8], start: NaiveDate) -> Task {
    let recurrence = Recurrence::from_parts(repeat, every, days).unwrap();
    NewTask::new("Test", recurrence, start).into_task(1, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

#[test]
fn test_daily_every_day_is_always_due() {
    let start = d(2024, 1, 1);
    let t = task(RepeatType::Daily, 1, &[], start);
    for offset in 0..400 {
        assert!(is_due_today(&t, start + Duration::days(offset)), "offset {}", offset);
    }
}

#[test]
fn test_daily_every_three_days() {
    let t = task(RepeatType::Daily, 3, &[], d(2024, 1, 1));
    assert!(is_due_today(&t, d(2024, 1, 1)));
    assert!(!is_due_today(&t, d(2024, 1, 2)));
    assert!(!is_due_today(&t, d(2024, 1, 3)));
    assert!(is_due_today(&t, d(2024, 1, 4)));
    // Crosses a leap day: 2024-01-01 + 60 days
    assert!(is_due_today(&t, d(2024, 3, 1)));
}

#[test]
fn test_not_due_before_start() {
    let t = task(RepeatType::Daily, 1, &[], d(2024, 1, 10));
    assert!(!is_due_today(&t, d(2024, 1, 9)));
    assert!(is_due_today(&t, d(2024, 1, 10)));
}

#[test]
fn test_archived_task_is_never_due() {
    let mut t = task(RepeatType::Daily, 1, &[], d(2024, 1, 1));
    t.is_archived = true;
    assert!(!is_due_today(&t, d(2024, 1, 1)));
    assert!(!is_due_today(&t, d(2024, 6, 1)));
}

#[test]
fn test_weekly_every_other_week_without_days() {
    // 2024-01-01 is a Monday
    let t = task(RepeatType::Weekly, 2, &[], d(2024, 1, 1));
    assert!(is_due_today(&t, d(2024, 1, 1)));
    assert!(!is_due_today(&t, d(2024, 1, 8)));
    assert!(is_due_today(&t, d(2024, 1, 15)));
    // Any weekday of a matching week
    assert!(is_due_today(&t, d(2024, 1, 4)));
    assert!(!is_due_today(&t, d(2024, 1, 10)));
}

#[test]
fn test_weekly_on_mon_wed_fri() {
    let t = task(RepeatType::Weekly, 1, &[1, 3, 5], d(2024, 1, 1));
    assert!(is_due_today(&t, d(2024, 1, 3)));
    assert!(!is_due_today(&t, d(2024, 1, 4)));
    assert!(is_due_today(&t, d(2024, 1, 5)));
    assert!(!is_due_today(&t, d(2024, 1, 6)));
    assert!(!is_due_today(&t, d(2024, 1, 7)));
    assert!(is_due_today(&t, d(2024, 1, 8)));
}

#[test]
fn test_weekly_weeks_count_from_start_date() {
    // Starts on a Wednesday; the following Monday is still week 0.
    let t = task(RepeatType::Weekly, 2, &[1], d(2024, 1, 3));
    assert!(is_due_today(&t, d(2024, 1, 8)));
    assert!(!is_due_today(&t, d(2024, 1, 15)));
    assert!(is_due_today(&t, d(2024, 1, 22)));
}

#[test]
fn test_monthly_ignores_day_of_month() {
    let t = task(RepeatType::Monthly, 1, &[], d(2024, 1, 31));
    assert!(is_due_today(&t, d(2024, 2, 5)));
    assert!(is_due_today(&t, d(2024, 2, 29)));
    // Earlier day of the start month is before the start date
    assert!(!is_due_today(&t, d(2024, 1, 15)));
}

#[test]
fn test_monthly_every_two_months() {
    let t = task(RepeatType::Monthly, 2, &[], d(2024, 1, 31));
    assert!(!is_due_today(&t, d(2024, 2, 10)));
    assert!(is_due_today(&t, d(2024, 3, 1)));
    assert!(!is_due_today(&t, d(2024, 4, 30)));
}

#[test]
fn test_monthly_across_year_boundary() {
    let t = task(RepeatType::Monthly, 3, &[], d(2023, 11, 15));
    assert!(is_due_today(&t, d(2024, 2, 1)));
    assert!(!is_due_today(&t, d(2024, 1, 15)));
}

#[test]
fn test_yearly_every_two_years() {
    let t = task(RepeatType::Yearly, 2, &[], d(2020, 6, 15));
    assert!(is_due_today(&t, d(2020, 12, 31)));
    assert!(!is_due_today(&t, d(2021, 12, 31)));
    assert!(is_due_today(&t, d(2022, 1, 1)));
    assert!(!is_due_today(&t, d(2020, 5, 1)));
}

#[test]
fn test_next_due_dates_weekly() {
    let t = task(RepeatType::Weekly, 1, &[1, 3, 5], d(2024, 1, 1));
    let dates = next_due_dates(&t, d(2024, 1, 1), 4);
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 5), d(2024, 1, 8)]);
}

#[test]
fn test_next_due_dates_start_in_future() {
    let t = task(RepeatType::Daily, 2, &[], d(2024, 1, 10));
    let dates = next_due_dates(&t, d(2024, 1, 1), 2);
    assert_eq!(dates, vec![d(2024, 1, 10), d(2024, 1, 12)]);
}

#[test]
fn test_next_due_dates_empty_cases() {
    let mut t = task(RepeatType::Daily, 1, &[], d(2024, 1, 1));
    assert!(next_due_dates(&t, d(2024, 1, 1), 0).is_empty());
    t.is_archived = true;
    assert!(next_due_dates(&t, d(2024, 1, 1), 5).is_empty());
}

#[test]
fn test_next_due_dates_stops_at_lookahead() {
    let t = task(RepeatType::Yearly, 10, &[], d(2024, 1, 1));
    // Only the rest of 2024 is within five years of the search start.
    let dates = next_due_dates(&t, d(2024, 12, 30), 5);
    assert_eq!(dates, vec![d(2024, 12, 30), d(2024, 12, 31)]);
}

#[test]
fn test_next_due_dates_near_end_of_calendar() {
    let from = NaiveDate::MAX - Duration::days(10);
    let t = task(RepeatType::Daily, 1, &[], d(2024, 1, 1));
    let dates = next_due_dates(&t, from, 3);
    assert_eq!(dates, vec![from, from + Duration::days(1), from + Duration::days(2)]);

    // Runs out of calendar instead of overflowing.
    let all = next_due_dates(&t, from, 100);
    assert!(all.len() >= 10 && all.len() <= 11);
    assert!(all.iter().all(|date| *date >= from));
}

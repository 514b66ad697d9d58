use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Interval multiplier applied to the base period (every X days, weeks, ...).
///
/// Always at least 1. Deserialisation goes through [`EveryX::new`], so a stored
/// `0` is rejected rather than loaded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "u32", into = "u32")]
pub struct EveryX(NonZeroU32);

impl EveryX {
    pub const ONE: EveryX = EveryX(NonZeroU32::MIN);

    pub fn new(n: u32) -> Result<Self> {
        NonZeroU32::new(n).map(EveryX).ok_or_else(|| {
            Error::InvalidRecurrenceConfig("everyX must be at least 1".into())
        })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for EveryX {
    fn default() -> Self {
        EveryX::ONE
    }
}

impl TryFrom<u32> for EveryX {
    type Error = Error;

    fn try_from(n: u32) -> Result<Self> {
        EveryX::new(n)
    }
}

impl From<EveryX> for u32 {
    fn from(every_x: EveryX) -> u32 {
        every_x.get()
    }
}

/// Set of weekdays, 0 = Sunday through 6 = Saturday.
///
/// Stored as a bitmask and serialised as a sorted list of day numbers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    /// Builds a set from day numbers, rejecting anything outside 0..=6.
    /// Duplicates are collapsed.
    pub fn from_days(days: &[u8]) -> Result<Self> {
        let mut bits = 0u8;
        for &day in days {
            if day > 6 {
                return Err(Error::InvalidRecurrenceConfig(format!(
                    "repeat day {} is outside 0-6 (0 = Sunday)",
                    day
                )));
            }
            bits |= 1 << day;
        }
        Ok(WeekdaySet(bits))
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Day numbers in ascending order.
    pub fn days(self) -> Vec<u8> {
        (0..7u8).filter(|d| self.0 & (1 << d) != 0).collect()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = Error;

    fn try_from(days: Vec<u8>) -> Result<Self> {
        WeekdaySet::from_days(&days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Vec<u8> {
        set.days()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .days()
            .into_iter()
            .map(|d| WEEKDAY_NAMES[d as usize])
            .collect();
        f.write_str(&names.join(", "))
    }
}

/// Base period of a recurrence, without its parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RepeatType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for RepeatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RepeatType::Daily),
            "weekly" => Ok(RepeatType::Weekly),
            "monthly" => Ok(RepeatType::Monthly),
            "yearly" => Ok(RepeatType::Yearly),
            other => Err(Error::InvalidRecurrenceConfig(format!(
                "unknown repeat type '{}'. Supported: daily, weekly, monthly, yearly.",
                other
            ))),
        }
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepeatType::Daily => "daily",
            RepeatType::Weekly => "weekly",
            RepeatType::Monthly => "monthly",
            RepeatType::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

/// A validated recurrence schedule.
///
/// `repeat_days` only exists on the weekly variant; an empty set there means
/// any weekday of a matching week. Deserialisation goes through
/// [`Recurrence::from_parts`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "repeat_type", rename_all = "snake_case", try_from = "RawRecurrence")]
pub enum Recurrence {
    Daily {
        every_x: EveryX,
    },
    Weekly {
        every_x: EveryX,
        repeat_days: WeekdaySet,
    },
    Monthly {
        every_x: EveryX,
    },
    Yearly {
        every_x: EveryX,
    },
}

impl Recurrence {
    /// Validating factory for loosely typed input (CLI flags, API payloads).
    pub fn from_parts(repeat_type: RepeatType, every_x: u32, repeat_days: &[u8]) -> Result<Self> {
        let every_x = EveryX::new(every_x)?;
        if repeat_type != RepeatType::Weekly && !repeat_days.is_empty() {
            return Err(Error::InvalidRecurrenceConfig(format!(
                "repeat days are only allowed for weekly tasks, not {}",
                repeat_type
            )));
        }
        Ok(match repeat_type {
            RepeatType::Daily => Recurrence::Daily { every_x },
            RepeatType::Weekly => Recurrence::Weekly {
                every_x,
                repeat_days: WeekdaySet::from_days(repeat_days)?,
            },
            RepeatType::Monthly => Recurrence::Monthly { every_x },
            RepeatType::Yearly => Recurrence::Yearly { every_x },
        })
    }

    pub fn repeat_type(&self) -> RepeatType {
        match self {
            Recurrence::Daily { .. } => RepeatType::Daily,
            Recurrence::Weekly { .. } => RepeatType::Weekly,
            Recurrence::Monthly { .. } => RepeatType::Monthly,
            Recurrence::Yearly { .. } => RepeatType::Yearly,
        }
    }

    pub fn every_x(&self) -> EveryX {
        match *self {
            Recurrence::Daily { every_x }
            | Recurrence::Weekly { every_x, .. }
            | Recurrence::Monthly { every_x }
            | Recurrence::Yearly { every_x } => every_x,
        }
    }

    /// Empty for every variant but weekly.
    pub fn repeat_days(&self) -> WeekdaySet {
        match *self {
            Recurrence::Weekly { repeat_days, .. } => repeat_days,
            _ => WeekdaySet::EMPTY,
        }
    }
}

/// Stored shape of a recurrence, before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecurrence {
    repeat_type: RepeatType,
    every_x: u32,
    #[serde(default)]
    repeat_days: Vec<u8>,
}

impl TryFrom<RawRecurrence> for Recurrence {
    type Error = Error;

    fn try_from(raw: RawRecurrence) -> Result<Self> {
        Recurrence::from_parts(raw.repeat_type, raw.every_x, &raw.repeat_days)
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::Daily { every_x: EveryX::ONE }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.every_x().get();
        let unit = match self.repeat_type() {
            RepeatType::Daily => "day",
            RepeatType::Weekly => "week",
            RepeatType::Monthly => "month",
            RepeatType::Yearly => "year",
        };
        if n == 1 {
            write!(f, "every {}", unit)?;
        } else {
            write!(f, "every {} {}s", n, unit)?;
        }
        let days = self.repeat_days();
        if !days.is_empty() {
            write!(f, " on {}", days)?;
        }
        Ok(())
    }
}

/// A recurring task ("daily") and its streak state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier, assigned by the repository.
    pub id: u64,
    /// Identifier of the owning user. Never resolved here.
    pub owner_id: String,
    /// The text of the task.
    pub name: String,
    /// When the task is due.
    pub recurrence: Recurrence,
    /// First calendar date of the schedule.
    pub start_date: NaiveDate,
    /// Consecutive completions.
    #[serde(default)]
    pub streak: u32,
    /// Highest value `streak` has ever reached.
    #[serde(default)]
    pub longest_streak: u32,
    /// Whether the task has been completed on the current calendar date.
    #[serde(default)]
    pub is_completed: bool,
    /// Date of the completion that `is_completed` refers to.
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
    /// Archived tasks are never due and are skipped by the rollover sweep.
    #[serde(default)]
    pub is_archived: bool,
    /// Display ordering.
    #[serde(default)]
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn repeat_type(&self) -> RepeatType {
        self.recurrence.repeat_type()
    }

    pub fn every_x(&self) -> EveryX {
        self.recurrence.every_x()
    }
}

/// Input for creating a task. Holds only already-validated pieces, so the
/// resulting [`Task`] always satisfies the recurrence invariants.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: String,
    pub name: String,
    pub recurrence: Recurrence,
    pub start_date: NaiveDate,
    pub position: u32,
}

impl NewTask {
    pub fn new(name: impl Into<String>, recurrence: Recurrence, start_date: NaiveDate) -> Self {
        Self {
            owner_id: String::new(),
            name: name.into(),
            recurrence,
            start_date,
            position: 0,
        }
    }

    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Materialises the task with fresh streak state.
    pub fn into_task(self, id: u64, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            owner_id: self.owner_id,
            name: self.name,
            recurrence: self.recurrence,
            start_date: self.start_date,
            streak: 0,
            longest_streak: 0,
            is_completed: false,
            last_completed_date: None,
            is_archived: false,
            position: self.position,
            created_at,
        }
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

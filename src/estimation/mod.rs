//! Occupancy estimation: slot bucketing, historical replay, weekly averages and trend fitting.

use crate::clock::Clock;
use crate::sheets::{SheetsError, TabularSource};
use serde::{Serialize, Serializer};
use time::Date;
use time::macros::format_description;
use tracing::debug;

pub mod anchor;
pub mod history;
pub mod slots;
pub mod trend;
pub mod weekly;

pub use anchor::{anchor_date, column_label, week_offset, weekday_from_index};
pub use history::{daily_series, fetch_daily_series};
pub use slots::{GridWidth, SeriesLayout, format_slot, normalize_to_grid};
pub use trend::{find_best_multiplier, fitted_curve};
pub use weekly::{fetch_weekly_averages, weekly_averages};

/// One `{time, count}` point of a live or averaged curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyRecord {
    pub time: String,
    pub count: u32,
}

impl OccupancyRecord {
    pub fn new(time: impl Into<String>, count: u32) -> Self {
        Self {
            time: time.into(),
            count,
        }
    }
}

/// A historical reading. `count` is `None` when the source cell was blank or not a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReading {
    pub time: String,
    pub count: Option<u32>,
}

/// One past occurrence of a weekday replayed from the historical matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub records: Vec<SlotReading>,
}

/// Average curve for one weekday. `average` is `None` when no row of that weekday parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAverage {
    pub day: String,
    pub values: Vec<OccupancyRecord>,
    pub average: Option<f64>,
}

/// Result of reading the tabular source, kept apart from the empty-on-failure boundary.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Data(T),
    Empty,
    Failed(SheetsError),
}

impl<T: Default> FetchOutcome<T> {
    /// Collapse to the value callers see: failures and empty reads both become `T::default()`.
    pub fn into_data(self) -> T {
        match self {
            FetchOutcome::Data(data) => data,
            FetchOutcome::Empty | FetchOutcome::Failed(_) => T::default(),
        }
    }
}

impl<T> FetchOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

fn serialize_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

/// Lenient integer read of a cell: skips leading whitespace, takes an optional sign and the
/// leading digits, ignores whatever follows. Blank, non-numeric and negative cells give `None`.
pub fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value: u32 = rest[..digits_end].parse().ok()?;
    if negative && value != 0 {
        return None;
    }
    Some(value)
}

/// Scale today's weekday average to the live samples seen so far.
///
/// Empty when the source has no average curve for today's weekday.
pub async fn todays_fitted_average(
    source: &dyn TabularSource,
    clock: &dyn Clock,
    live: &[OccupancyRecord],
) -> Vec<OccupancyRecord> {
    let today = clock.now().weekday.to_string();
    let averages = weekly_averages(source).await;
    let Some(average) = averages.into_iter().find(|avg| avg.day == today) else {
        debug!(day = %today, "No weekly average for today");
        return Vec::new();
    };
    fitted_curve(live, &average.values)
}

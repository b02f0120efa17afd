use crate::estimation::anchor::{anchor_date, week_offset};
use crate::estimation::slots::SeriesLayout;
use crate::estimation::{DailySeries, FetchOutcome, SlotReading, parse_count};
use crate::sheets::{Grid, MajorDimension, SheetRange, TabularSource};
use time::{Date, Duration, Weekday};
use tracing::{debug, warn};

/// Every column of a weekday sheet is one past occurrence, oldest first.
pub const HISTORY_CELLS: &str = "B2:ZZZ9999";

pub fn history_range(weekday: Weekday) -> SheetRange {
    SheetRange::new(weekday.to_string(), HISTORY_CELLS, MajorDimension::Columns)
}

/// Replay a weekday's history from `start` (its epoch when `None`).
pub async fn fetch_daily_series(
    source: &dyn TabularSource,
    layout: &SeriesLayout,
    weekday: Weekday,
    start: Option<Date>,
) -> FetchOutcome<Vec<DailySeries>> {
    let anchor = anchor_date(weekday);
    let start = start.unwrap_or(anchor);
    let offset = if start == anchor {
        0
    } else {
        week_offset(weekday, start).0
    };

    let range = history_range(weekday);
    match source.fetch_range(&range).await {
        Ok(grid) => {
            let series = build_series(grid, layout, start, offset as usize);
            if series.is_empty() {
                FetchOutcome::Empty
            } else {
                FetchOutcome::Data(series)
            }
        }
        Err(err) => FetchOutcome::Failed(err),
    }
}

/// Same as [`fetch_daily_series`], but a failed or empty read is just an empty list.
pub async fn daily_series(
    source: &dyn TabularSource,
    layout: &SeriesLayout,
    weekday: Weekday,
    start: Option<Date>,
) -> Vec<DailySeries> {
    let outcome = fetch_daily_series(source, layout, weekday, start).await;
    match &outcome {
        FetchOutcome::Failed(err) => {
            warn!(sheet = %weekday, error = %err, "Failed to fetch historical occupancy")
        }
        FetchOutcome::Empty => debug!(sheet = %weekday, "No historical occupancy after start"),
        FetchOutcome::Data(series) => debug!(sheet = %weekday, days = series.len(), "Loaded history"),
    }
    outcome.into_data()
}

fn build_series(grid: Grid, layout: &SeriesLayout, start: Date, offset: usize) -> Vec<DailySeries> {
    grid.into_iter()
        .skip(offset)
        .enumerate()
        .map(|(week, column)| DailySeries {
            date: start + Duration::weeks(week as i64),
            records: column
                .iter()
                .enumerate()
                .map(|(slot, raw)| SlotReading {
                    time: layout.slot_label(slot),
                    count: parse_count(raw),
                })
                .collect(),
        })
        .collect()
}

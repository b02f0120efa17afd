use crate::estimation::{FetchOutcome, OccupancyRecord, WeeklyAverage, parse_count};
use crate::sheets::{Grid, MajorDimension, SheetRange, TabularSource};
use time::Weekday;
use tracing::{debug, warn};

pub const AVERAGE_SHEET: &str = "Average";
/// Time label in column A, then one column per weekday starting Monday.
pub const AVERAGE_CELLS: &str = "A2:H66";

pub fn average_range() -> SheetRange {
    SheetRange::new(AVERAGE_SHEET, AVERAGE_CELLS, MajorDimension::Rows)
}

fn week() -> impl Iterator<Item = Weekday> {
    (0..7).map(|n| Weekday::Monday.nth_next(n))
}

fn empty_week() -> Vec<WeeklyAverage> {
    week()
        .map(|weekday| WeeklyAverage {
            day: weekday.to_string(),
            values: Vec::new(),
            average: None,
        })
        .collect()
}

pub async fn fetch_weekly_averages(source: &dyn TabularSource) -> FetchOutcome<Vec<WeeklyAverage>> {
    match source.fetch_range(&average_range()).await {
        Ok(grid) if grid.is_empty() => FetchOutcome::Empty,
        Ok(grid) => FetchOutcome::Data(reduce_averages(&grid)),
        Err(err) => FetchOutcome::Failed(err),
    }
}

/// All seven weekdays, Monday first. When the source cannot be read every weekday
/// comes back with no values and no average.
pub async fn weekly_averages(source: &dyn TabularSource) -> Vec<WeeklyAverage> {
    match fetch_weekly_averages(source).await {
        FetchOutcome::Data(days) => days,
        FetchOutcome::Empty => {
            debug!(sheet = AVERAGE_SHEET, "Average table is empty");
            empty_week()
        }
        FetchOutcome::Failed(err) => {
            warn!(sheet = AVERAGE_SHEET, error = %err, "Failed to fetch weekly averages");
            empty_week()
        }
    }
}

fn reduce_averages(grid: &Grid) -> Vec<WeeklyAverage> {
    let mut days = empty_week();

    for row in grid {
        let Some((time, counts)) = row.split_first() else {
            continue;
        };
        // Cells that do not parse are skipped for their own weekday only.
        for (day, raw) in days.iter_mut().zip(counts) {
            if let Some(count) = parse_count(raw) {
                day.values.push(OccupancyRecord::new(time.as_str(), count));
            }
        }
    }

    for day in &mut days {
        day.average = mean(&day.values);
    }
    days
}

fn mean(values: &[OccupancyRecord]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().map(|v| f64::from(v.count)).sum();
    Some(total / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::MockSheets;

    #[tokio::test]
    async fn reduces_rows_into_per_weekday_curves() {
        let source = MockSheets::new().with_sheet(
            AVERAGE_SHEET,
            vec![
                vec!["6:00 AM", "10", "20", "30", "40", "50", "60", "70"],
                vec!["6:15 AM", "20", "40", "", "x", "50", "60", "71"],
            ],
        );

        let days = weekly_averages(&source).await;

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].day, "Monday");
        assert_eq!(days[6].day, "Sunday");
        assert_eq!(
            days[0].values,
            vec![
                OccupancyRecord::new("6:00 AM", 10),
                OccupancyRecord::new("6:15 AM", 20),
            ]
        );
        assert_eq!(days[0].average, Some(15.0));
        assert_eq!(days[2].values, vec![OccupancyRecord::new("6:00 AM", 30)]);
        assert_eq!(days[3].values.len(), 1);
        assert_eq!(days[6].average, Some(70.5));
    }

    #[tokio::test]
    async fn weekday_without_valid_rows_has_no_average() {
        let source = MockSheets::new().with_sheet(
            AVERAGE_SHEET,
            vec![vec!["6:00 AM", "10"], vec!["6:15 AM", "12", "closed"]],
        );

        let days = weekly_averages(&source).await;

        assert_eq!(days[0].average, Some(11.0));
        assert!(days[1].values.is_empty());
        assert_eq!(days[1].average, None);
        assert_eq!(days[5].average, None);
    }

    #[tokio::test]
    async fn fetch_failure_yields_seven_empty_weekdays() {
        let days = weekly_averages(&MockSheets::unavailable()).await;

        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| d.values.is_empty() && d.average.is_none()));
    }

    #[tokio::test]
    async fn blank_rows_are_ignored() {
        let source = MockSheets::new().with_sheet(
            AVERAGE_SHEET,
            vec![vec![], vec!["7:00 AM", "4"]],
        );

        let outcome = fetch_weekly_averages(&source).await;

        let FetchOutcome::Data(days) = outcome else {
            panic!("expected data");
        };
        assert_eq!(days[0].values, vec![OccupancyRecord::new("7:00 AM", 4)]);
    }
}

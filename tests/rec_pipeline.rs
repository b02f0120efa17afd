use rec_pulse::clock::{FixedClock, WallClock};
use rec_pulse::estimation::{
    OccupancyRecord, SeriesLayout, daily_series, format_slot, normalize_to_grid,
    todays_fitted_average, weekly_averages,
};
use rec_pulse::sheets::MockSheets;
use rec_pulse::store::{MemoryStore, SlotKey, WriteOutcome, day_rows, record_count};
use time::Weekday;
use time::macros::date;

fn source() -> MockSheets {
    MockSheets::new()
        .with_sheet(
            "Wednesday",
            vec![
                vec!["4", "8", "12"],
                vec!["6", "10", ""],
                vec!["5", "9", "13"],
            ],
        )
        .with_sheet(
            "Average",
            vec![
                vec!["6:00 AM", "", "", "10"],
                vec!["6:15 AM", "", "", "20"],
                vec!["6:30 AM", "", "", "40"],
                vec!["6:45 AM", "", "", "30"],
            ],
        )
}

#[tokio::test]
async fn history_replays_from_requested_week() {
    let series = daily_series(
        &source(),
        &SeriesLayout::fifteen_minute(),
        Weekday::Wednesday,
        Some(date!(2022 - 02 - 09)),
    )
    .await;

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, date!(2022 - 02 - 09));
    assert_eq!(series[1].date, date!(2022 - 02 - 16));
    let labels: Vec<_> = series[0].records.iter().map(|r| r.time.as_str()).collect();
    assert_eq!(labels, vec!["6:00 AM", "6:15 AM", "6:30 AM"]);
    assert_eq!(series[0].records[2].count, None);
}

#[tokio::test]
async fn weekly_average_only_for_columns_with_data() {
    let days = weekly_averages(&source()).await;

    assert_eq!(days.len(), 7);
    assert_eq!(days[2].day, "Wednesday");
    assert_eq!(days[2].average, Some(25.0));
    assert!(days[0].values.is_empty());
    assert_eq!(days[0].average, None);
}

#[tokio::test]
async fn ingested_counts_drive_the_fitted_forecast() -> Result<(), rec_pulse::store::StoreError> {
    let store = MemoryStore::new();
    let layout = SeriesLayout::fifteen_minute();
    let samples = [(6, 3, 20), (6, 16, 40), (6, 31, 80)];

    for (hour, minute, count) in samples {
        let slot = normalize_to_grid(minute, layout.grid);
        let key = SlotKey::new(3, hour, slot as u8);
        assert_eq!(record_count(&store, key, count).await?, WriteOutcome::Inserted);
    }
    assert_eq!(
        record_count(&store, SlotKey::new(3, 6, 0), 20).await?,
        WriteOutcome::Updated
    );

    let live: Vec<_> = day_rows(&store, 3)
        .await?
        .into_iter()
        .map(|row| OccupancyRecord::new(format_slot(row.hour.into(), row.slot.into()), row.count))
        .collect();
    assert_eq!(live.len(), 3);

    let clock = FixedClock::new(WallClock {
        weekday: Weekday::Wednesday,
        hour: 6,
        minute: 40,
    });
    let fitted = todays_fitted_average(&source(), &clock, &live).await;

    assert_eq!(
        fitted,
        vec![
            OccupancyRecord::new("6:00 AM", 20),
            OccupancyRecord::new("6:15 AM", 40),
            OccupancyRecord::new("6:30 AM", 80),
            OccupancyRecord::new("6:45 AM", 60),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn unavailable_source_degrades_to_empty() {
    let source = MockSheets::unavailable();
    let clock = FixedClock::new(WallClock {
        weekday: Weekday::Monday,
        hour: 12,
        minute: 0,
    });

    assert!(
        daily_series(&source, &SeriesLayout::five_minute(), Weekday::Monday, None)
            .await
            .is_empty()
    );
    assert!(weekly_averages(&source).await.iter().all(|d| d.values.is_empty()));
    assert!(
        todays_fitted_average(&source, &clock, &[OccupancyRecord::new("12:00 PM", 4)])
            .await
            .is_empty()
    );
}

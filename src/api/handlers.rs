use crate::api::responses::{
    ApiResponse, CountResponse, DataResponse, ErrorCode, ErrorResponse, HealthStatus,
    HealthSuccessResponse, MessageResponse,
};
use crate::estimation::{
    DailySeries, OccupancyRecord, WeeklyAverage, daily_series, format_slot, normalize_to_grid,
    todays_fitted_average, weekday_from_index, weekly_averages,
};
use crate::state::AppState;
use crate::store::{SlotKey, StoreError, WriteOutcome, day_rows, record_count};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{error, info, warn};

pub const SERVICE_KEY_HEADER: &str = "x-ilefa-key";
const INVALID_BODY_MESSAGE: &str = "Missing or invalid request body";

#[derive(Debug, Deserialize)]
struct DailyHistoryRequest {
    day: Option<Value>,
    start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetricsRequest {
    count: Option<Value>,
}

pub async fn get_health() -> impl IntoResponse {
    ApiResponse::ok(HealthSuccessResponse {
        status: HealthStatus::Ok,
        timestamp: timestamp_now(),
    })
}

pub async fn post_daily_history(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    build_daily_history_response(&state, &body).await
}

pub async fn post_weekly_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_weekly_history_response(&state).await
}

pub async fn post_now(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_now_response(&state).await
}

pub async fn post_today(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_today_response(&state).await
}

pub async fn post_today_avg(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_today_avg_response(&state).await
}

pub async fn post_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let provided = headers
        .get(SERVICE_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    build_metrics_response(&state, provided, &body).await
}

pub async fn not_found() -> impl IntoResponse {
    error_response::<()>(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not found")
}

async fn build_daily_history_response(
    state: &AppState,
    body: &[u8],
) -> ApiResponse<DataResponse<Vec<DailySeries>>> {
    let Ok(request) = serde_json::from_slice::<DailyHistoryRequest>(body) else {
        return invalid_body();
    };
    let Some(weekday) = request
        .day
        .as_ref()
        .and_then(integer_from_value)
        .and_then(|index| u8::try_from(index).ok())
        .and_then(weekday_from_index)
    else {
        return invalid_body();
    };

    let start = match request.start.as_deref() {
        None => None,
        Some(raw) => match parse_start_date(raw) {
            Some(date) if date.weekday() == weekday => Some(date),
            _ => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidStartDate,
                    "Invalid start date",
                );
            }
        },
    };

    let data = daily_series(state.source(), state.layout(), weekday, start).await;
    ApiResponse::ok(DataResponse { data })
}

async fn build_weekly_history_response(
    state: &AppState,
) -> ApiResponse<DataResponse<Vec<WeeklyAverage>>> {
    let data = weekly_averages(state.source()).await;
    ApiResponse::ok(DataResponse { data })
}

async fn build_now_response(state: &AppState) -> ApiResponse<CountResponse> {
    let key = current_key(state);
    match state.store().select_count(key).await {
        Ok(row) => ApiResponse::ok(CountResponse {
            count: row.map(|r| r.count).unwrap_or(0),
        }),
        Err(err) => store_error(err),
    }
}

async fn build_today_response(state: &AppState) -> ApiResponse<DataResponse<Vec<OccupancyRecord>>> {
    match live_today(state).await {
        Ok(data) => ApiResponse::ok(DataResponse { data }),
        Err(err) => store_error(err),
    }
}

async fn build_today_avg_response(
    state: &AppState,
) -> ApiResponse<DataResponse<Vec<OccupancyRecord>>> {
    let live = match live_today(state).await {
        Ok(live) => live,
        Err(err) => return store_error(err),
    };
    let data = todays_fitted_average(state.source(), state.clock(), &live).await;
    ApiResponse::ok(DataResponse { data })
}

async fn build_metrics_response(
    state: &AppState,
    provided_key: Option<&str>,
    body: &[u8],
) -> ApiResponse<MessageResponse> {
    if !state.authorize(provided_key) {
        warn!("Rejected metrics write with missing or wrong service key");
        return error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized",
        );
    }

    let Some(count) = serde_json::from_slice::<MetricsRequest>(body)
        .ok()
        .and_then(|request| request.count)
        .as_ref()
        .and_then(integer_from_value)
        .and_then(|count| u32::try_from(count).ok())
    else {
        return invalid_body();
    };

    let key = current_key(state);
    match record_count(state.store(), key, count).await {
        Ok(WriteOutcome::Inserted) => {
            info!(day = key.day, hour = key.hour, slot = key.slot, count, "Created new marker");
            ApiResponse::Success {
                status: StatusCode::CREATED,
                body: MessageResponse {
                    message: "Created new marker".to_string(),
                },
            }
        }
        Ok(WriteOutcome::Updated) => ApiResponse::ok(MessageResponse {
            message: "Updated current marker".to_string(),
        }),
        Err(err) => store_error(err),
    }
}

/// Counter key for the current wall-clock slot.
fn current_key(state: &AppState) -> SlotKey {
    let now = state.clock().now();
    let slot = normalize_to_grid(now.minute, state.layout().grid);
    SlotKey::new(now.day_index(), now.hour as u8, slot as u8)
}

/// Today's stored counters as a display curve.
async fn live_today(state: &AppState) -> Result<Vec<OccupancyRecord>, StoreError> {
    let day = state.clock().now().day_index();
    let rows = day_rows(state.store(), day).await?;
    Ok(rows
        .into_iter()
        .map(|row| OccupancyRecord::new(format_slot(row.hour.into(), row.slot.into()), row.count))
        .collect())
}

/// Non-negative integer from a JSON number or numeric string.
fn integer_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_start_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn invalid_body<T>() -> ApiResponse<T> {
    error_response(
        StatusCode::BAD_REQUEST,
        ErrorCode::InvalidBody,
        INVALID_BODY_MESSAGE,
    )
}

fn store_error<T>(err: StoreError) -> ApiResponse<T> {
    error!(error = %err, "Counter store operation failed");
    let (code, message) = match err {
        StoreError::Fetch(_) => (ErrorCode::FetchFailed, "Failed to fetch record"),
        StoreError::Insert(_) => (ErrorCode::InsertFailed, "Failed to insert record"),
        StoreError::Update(_) => (ErrorCode::UpdateFailed, "Failed to update record"),
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, code, message)
}

fn error_response<T>(status: StatusCode, error_code: ErrorCode, message: &str) -> ApiResponse<T> {
    ApiResponse::Error {
        status,
        body: ErrorResponse {
            error_code,
            error_message: message.to_string(),
            timestamp: timestamp_now(),
        },
    }
}

fn timestamp_now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format response timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, WallClock};
    use crate::estimation::SeriesLayout;
    use crate::sheets::MockSheets;
    use crate::store::{CounterRow, CounterStore, MemoryStore};
    use time::Weekday;
    use time::macros::date;

    const KEY: &str = "test-key";

    fn monday_morning() -> FixedClock {
        FixedClock::new(WallClock {
            weekday: Weekday::Monday,
            hour: 6,
            minute: 22,
        })
    }

    fn sheets() -> MockSheets {
        MockSheets::new()
            .with_sheet("Monday", vec![vec!["10", "20"], vec!["30", "x"]])
            .with_sheet(
                "Average",
                vec![vec!["6:00 AM", "10"], vec!["6:15 AM", "20"], vec!["6:30 AM", "30"]],
            )
    }

    fn state_with(store: Arc<MemoryStore>) -> AppState {
        AppState::new(
            Arc::new(sheets()),
            store,
            Arc::new(monday_morning()),
            SeriesLayout::fifteen_minute(),
        )
        .with_service_key(KEY)
    }

    fn state() -> AppState {
        state_with(Arc::new(MemoryStore::new()))
    }

    fn error_code<T>(response: &ApiResponse<T>) -> Option<ErrorCode> {
        match response {
            ApiResponse::Error { body, .. } => Some(body.error_code),
            ApiResponse::Success { .. } => None,
        }
    }

    #[tokio::test]
    async fn daily_history_defaults_to_anchor() {
        let response = build_daily_history_response(&state(), br#"{"day": 0}"#).await;

        match response {
            ApiResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.data.len(), 2);
                assert_eq!(body.data[0].date, date!(2022 - 01 - 31));
                assert_eq!(body.data[1].records[1].count, None);
            }
            ApiResponse::Error { status, .. } => panic!("expected success, got {status}"),
        }
    }

    #[tokio::test]
    async fn daily_history_accepts_numeric_string_and_start() {
        let response =
            build_daily_history_response(&state(), br#"{"day": "0", "start": "2022-02-07"}"#)
                .await;

        match response {
            ApiResponse::Success { body, .. } => {
                assert_eq!(body.data.len(), 1);
                assert_eq!(body.data[0].date, date!(2022 - 02 - 07));
                assert_eq!(body.data[0].records[0].count, Some(30));
            }
            ApiResponse::Error { status, .. } => panic!("expected success, got {status}"),
        }
    }

    #[tokio::test]
    async fn daily_history_rejects_bad_day() {
        let bodies: [&[u8]; 4] = [br#"{}"#, br#"{"day": 7}"#, br#"{"day": "monday"}"#, b"not json"];
        for body in bodies {
            let response = build_daily_history_response(&state(), body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(error_code(&response), Some(ErrorCode::InvalidBody));
        }
    }

    #[tokio::test]
    async fn daily_history_rejects_start_on_other_weekday() {
        // 2022-02-08 is a Tuesday.
        for start in ["2022-02-08", "02/07/2022"] {
            let body = format!(r#"{{"day": 0, "start": "{start}"}}"#);
            let response = build_daily_history_response(&state(), body.as_bytes()).await;
            assert_eq!(error_code(&response), Some(ErrorCode::InvalidStartDate));
        }
    }

    #[tokio::test]
    async fn weekly_history_lists_all_weekdays() {
        let response = build_weekly_history_response(&state()).await;

        let ApiResponse::Success { body, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(body.data.len(), 7);
        assert_eq!(body.data[0].average, Some(20.0));
    }

    #[tokio::test]
    async fn now_is_zero_without_row_and_reads_current_slot() {
        let store = Arc::new(MemoryStore::new());
        let state = state_with(Arc::clone(&store));

        let ApiResponse::Success { body, .. } = build_now_response(&state).await else {
            panic!("expected success");
        };
        assert_eq!(body.count, 0);

        store
            .insert_count(CounterRow::new(SlotKey::new(1, 6, 15), 9))
            .await
            .expect("insert");
        let ApiResponse::Success { body, .. } = build_now_response(&state).await else {
            panic!("expected success");
        };
        assert_eq!(body.count, 9);
    }

    #[tokio::test]
    async fn metrics_requires_service_key() {
        let state = state();

        let missing = build_metrics_response(&state, None, br#"{"count": 3}"#).await;
        let wrong = build_metrics_response(&state, Some("nope"), br#"{"count": 3}"#).await;

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&wrong), Some(ErrorCode::Unauthorized));
    }

    #[tokio::test]
    async fn metrics_rejects_invalid_count() {
        let state = state();
        let bodies: [&[u8]; 4] = [
            br#"{}"#,
            br#"{"count": -1}"#,
            br#"{"count": "many"}"#,
            br#"{"count": 1.5}"#,
        ];
        for body in bodies {
            let response = build_metrics_response(&state, Some(KEY), body).await;
            assert_eq!(error_code(&response), Some(ErrorCode::InvalidBody));
        }
    }

    #[tokio::test]
    async fn metrics_creates_then_updates_current_slot() {
        let store = Arc::new(MemoryStore::new());
        let state = state_with(Arc::clone(&store));

        let first = build_metrics_response(&state, Some(KEY), br#"{"count": 12}"#).await;
        let second = build_metrics_response(&state, Some(KEY), br#"{"count": "14"}"#).await;

        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(store.len().await, 1);
        let row = store
            .select_count(SlotKey::new(1, 6, 15))
            .await
            .expect("select");
        assert_eq!(row.map(|r| r.count), Some(14));
    }

    #[tokio::test]
    async fn today_lists_rows_in_slot_order() {
        let store = Arc::new(MemoryStore::new());
        for (hour, slot, count) in [(13, 0, 7), (6, 15, 3), (6, 0, 1)] {
            store
                .insert_count(CounterRow::new(SlotKey::new(1, hour, slot), count))
                .await
                .expect("insert");
        }
        store
            .insert_count(CounterRow::new(SlotKey::new(2, 6, 0), 100))
            .await
            .expect("insert");
        let state = state_with(store);

        let ApiResponse::Success { body, .. } = build_today_response(&state).await else {
            panic!("expected success");
        };

        assert_eq!(
            body.data,
            vec![
                OccupancyRecord::new("6:00 AM", 1),
                OccupancyRecord::new("6:15 AM", 3),
                OccupancyRecord::new("1:00 PM", 7),
            ]
        );
    }

    #[tokio::test]
    async fn today_avg_fits_average_to_live_rows() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_count(CounterRow::new(SlotKey::new(1, 6, 0), 5))
            .await
            .expect("insert");
        store
            .insert_count(CounterRow::new(SlotKey::new(1, 6, 15), 10))
            .await
            .expect("insert");
        let state = state_with(store);

        let ApiResponse::Success { body, .. } = build_today_avg_response(&state).await else {
            panic!("expected success");
        };

        assert_eq!(
            body.data,
            vec![
                OccupancyRecord::new("6:00 AM", 5),
                OccupancyRecord::new("6:15 AM", 10),
                OccupancyRecord::new("6:30 AM", 15),
            ]
        );
    }
}

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/rec/history/daily", post(handlers::post_daily_history))
        .route("/rec/history/weekly", post(handlers::post_weekly_history))
        .route("/rec/now", post(handlers::post_now))
        .route("/rec/today", post(handlers::post_today))
        .route("/rec/today/avg", post(handlers::post_today_avg))
        .route("/rec/metrics", post(handlers::post_metrics))
        .fallback(handlers::not_found)
        .with_state(state)
}

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimation;
pub mod fetch;
pub mod sheets;
pub mod state;
pub mod store;

/// Install the global `fmt` subscriber. Unknown level names fall back to `info`.
pub fn init_tracing(level: &str) {
    let level = level.parse().unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

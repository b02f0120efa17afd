use crate::clock::{Clock, SystemClock};
use crate::config::{Config, StoreKind, secret_from_env};
use crate::error::AppError;
use crate::estimation::SeriesLayout;
use crate::fetch::BasicClient;
use crate::fetch::auth::{ApiKey, UrlParam};
use crate::sheets::{GoogleSheets, TabularSource, Unconfigured};
use crate::store::{CounterStore, MemoryStore, PostgrestStore};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators shared by every request. Nothing in here changes after startup.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn TabularSource>,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    layout: SeriesLayout,
    service_key: Option<String>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn TabularSource>,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        layout: SeriesLayout,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            layout,
            service_key: None,
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let layout = config.series_layout()?;
        let clock = SystemClock::new(config.timezone()?);
        let source = build_source(config)?;
        let store = build_store(config)?;

        let service_key = secret_from_env(config.service_key_env());
        if service_key.is_none() {
            warn!(
                env = config.service_key_env(),
                "Service key not set; metrics ingestion will reject every request"
            );
        }

        Ok(Self {
            source,
            store,
            clock: Arc::new(clock),
            layout,
            service_key,
        })
    }

    pub fn source(&self) -> &dyn TabularSource {
        self.source.as_ref()
    }

    pub fn store(&self) -> &dyn CounterStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn layout(&self) -> &SeriesLayout {
        &self.layout
    }

    /// Whether `provided` matches the configured service key. Always false when none is set.
    pub fn authorize(&self, provided: Option<&str>) -> bool {
        match (&self.service_key, provided) {
            (Some(expected), Some(provided)) => expected == provided,
            _ => false,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("layout", &self.layout)
            .field("has_service_key", &self.service_key.is_some())
            .finish()
    }
}

fn build_source(config: &Config) -> Result<Arc<dyn TabularSource>, AppError> {
    let spreadsheet_id = match config.spreadsheet_id() {
        Ok(id) => id,
        Err(err) => {
            warn!(error = %err, "Spreadsheet not configured; history endpoints will be empty");
            return Ok(Arc::new(Unconfigured));
        }
    };
    let token = secret_from_env(config.sheets_token_env()).unwrap_or_else(|| {
        warn!(env = config.sheets_token_env(), "Sheets token not set");
        String::new()
    });
    let client = UrlParam::new(
        BasicClient::with_timeout(config.sheets_timeout())?,
        "key",
        token,
    );
    info!(base_url = config.sheets_base_url(), "Using Google Sheets source");
    Ok(Arc::new(GoogleSheets::new(
        client,
        config.sheets_base_url(),
        spreadsheet_id,
    )))
}

fn build_store(config: &Config) -> Result<Arc<dyn CounterStore>, AppError> {
    match config.store_kind() {
        StoreKind::Memory => {
            info!("Using in-memory counter store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Postgrest => {
            let url = config.store_url()?;
            let key = secret_from_env(config.store_key_env()).unwrap_or_else(|| {
                warn!(env = config.store_key_env(), "Store key not set");
                String::new()
            });
            let client = ApiKey::new(BasicClient::new())
                .header("apikey", &key)
                .bearer(&key);
            info!(url, table = config.store_table(), "Using PostgREST counter store");
            Ok(Arc::new(PostgrestStore::new(
                client,
                url,
                config.store_table(),
            )))
        }
    }
}

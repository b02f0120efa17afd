//! Live occupancy counters keyed by calendar day, hour and slot.
//!
//! Writes are read-then-insert-or-update with no transaction around them; two
//! writers racing on one key resolve as last-writer-wins.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

/// Identity of a counter row: day (Sunday=0), hour (0-23), slot (minute of hour on the grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub day: u8,
    pub hour: u8,
    pub slot: u8,
}

impl SlotKey {
    pub fn new(day: u8, hour: u8, slot: u8) -> Self {
        Self { day, hour, slot }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRow {
    pub day: u8,
    pub hour: u8,
    pub slot: u8,
    pub count: u32,
}

impl CounterRow {
    pub fn new(key: SlotKey, count: u32) -> Self {
        Self {
            day: key.day,
            hour: key.hour,
            slot: key.slot,
            count,
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.hour, self.slot)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to fetch counter: {0}")]
    Fetch(String),
    #[error("failed to insert counter: {0}")]
    Insert(String),
    #[error("failed to update counter: {0}")]
    Update(String),
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn select_count(&self, key: SlotKey) -> Result<Option<CounterRow>, StoreError>;
    async fn select_day(&self, day: u8) -> Result<Vec<CounterRow>, StoreError>;
    async fn insert_count(&self, row: CounterRow) -> Result<(), StoreError>;
    async fn update_count(&self, row: CounterRow) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

/// Set the counter for `key`, creating the row on first write.
pub async fn record_count(
    store: &dyn CounterStore,
    key: SlotKey,
    count: u32,
) -> Result<WriteOutcome, StoreError> {
    let row = CounterRow::new(key, count);
    match store.select_count(key).await? {
        None => {
            store.insert_count(row).await?;
            debug!(day = key.day, hour = key.hour, slot = key.slot, count, "Inserted counter");
            Ok(WriteOutcome::Inserted)
        }
        Some(_) => {
            store.update_count(row).await?;
            debug!(day = key.day, hour = key.hour, slot = key.slot, count, "Updated counter");
            Ok(WriteOutcome::Updated)
        }
    }
}

/// Rows of one day ordered by hour, then slot.
pub async fn day_rows(store: &dyn CounterStore, day: u8) -> Result<Vec<CounterRow>, StoreError> {
    let mut rows = store.select_day(day).await?;
    rows.sort_by_key(|row| (row.hour, row.slot));
    Ok(rows)
}

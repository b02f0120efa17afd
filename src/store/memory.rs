use crate::store::{CounterRow, CounterStore, SlotKey, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local counter table. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<SlotKey, u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn select_count(&self, key: SlotKey) -> Result<Option<CounterRow>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&key).map(|&count| CounterRow::new(key, count)))
    }

    async fn select_day(&self, day: u8) -> Result<Vec<CounterRow>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|(key, _)| key.day == day)
            .map(|(&key, &count)| CounterRow::new(key, count))
            .collect())
    }

    /// A row already present means another writer got there first; this write replaces it.
    async fn insert_count(&self, row: CounterRow) -> Result<(), StoreError> {
        self.rows.write().await.insert(row.key(), row.count);
        Ok(())
    }

    async fn update_count(&self, row: CounterRow) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&row.key()) {
            Some(count) => {
                *count = row.count;
                Ok(())
            }
            None => Err(StoreError::Update(format!(
                "no row for (day={}, hour={}, slot={})",
                row.day, row.hour, row.slot
            ))),
        }
    }
}

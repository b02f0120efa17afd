use crate::fetch::HttpClient;
use crate::store::{CounterRow, CounterStore, SlotKey, StoreError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE: &str = "rec";

/// Counter table behind a PostgREST gateway (e.g. Supabase's `/rest/v1`).
///
/// The slot column is called `mins` on the wire. Credentials are layered onto
/// `client` by the caller.
pub struct PostgrestStore<C> {
    client: C,
    base_url: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    day: u8,
    hour: u8,
    mins: u8,
    #[serde(default)]
    count: Option<u32>,
}

impl From<WireRow> for CounterRow {
    fn from(row: WireRow) -> Self {
        CounterRow {
            day: row.day,
            hour: row.hour,
            slot: row.mins,
            count: row.count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertBody {
    day: u8,
    hour: u8,
    mins: u8,
    count: u32,
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    count: u32,
}

impl<C: HttpClient> PostgrestStore<C> {
    pub fn new(client: C, base_url: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            table: table.into(),
        }
    }

    fn table_url(&self, filters: &[(&str, u8)]) -> Result<Url, String> {
        let raw = format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        );
        let mut url = Url::parse(&raw).map_err(|err| format!("invalid store url: {err}"))?;
        if !filters.is_empty() {
            let mut query = url.query_pairs_mut();
            for (column, value) in filters {
                query.append_pair(column, &format!("eq.{value}"));
            }
        }
        Ok(url)
    }

    fn key_filters(key: SlotKey) -> [(&'static str, u8); 3] {
        [("day", key.day), ("hour", key.hour), ("mins", key.slot)]
    }

    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<String, String> {
        let mut req = Request::new(method, url);
        if let Some(body) = body {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            req.headers_mut().insert(
                HeaderName::from_static("prefer"),
                HeaderValue::from_static("return=minimal"),
            );
            *req.body_mut() = Some(body.into());
        }

        let response = self
            .client
            .execute(req)
            .await
            .map_err(|err| err.to_string())?;
        let status = response.status();
        let text = response.text().await.map_err(|err| err.to_string())?;
        if !status.is_success() {
            return Err(format!("http status {}: {}", status.as_u16(), text.trim()));
        }
        Ok(text)
    }

    async fn select(&self, filters: &[(&str, u8)]) -> Result<Vec<CounterRow>, StoreError> {
        let mut url = self.table_url(&[]).map_err(StoreError::Fetch)?;
        url.query_pairs_mut().append_pair("select", "*");
        for (column, value) in filters {
            url.query_pairs_mut()
                .append_pair(column, &format!("eq.{value}"));
        }
        let body = self
            .send(Method::GET, url, None)
            .await
            .map_err(StoreError::Fetch)?;
        let rows: Vec<WireRow> =
            serde_json::from_str(&body).map_err(|err| StoreError::Fetch(err.to_string()))?;
        Ok(rows.into_iter().map(CounterRow::from).collect())
    }
}

#[async_trait]
impl<C: HttpClient> CounterStore for PostgrestStore<C> {
    async fn select_count(&self, key: SlotKey) -> Result<Option<CounterRow>, StoreError> {
        let rows = self.select(&Self::key_filters(key)).await?;
        Ok(rows.into_iter().next())
    }

    async fn select_day(&self, day: u8) -> Result<Vec<CounterRow>, StoreError> {
        self.select(&[("day", day)]).await
    }

    async fn insert_count(&self, row: CounterRow) -> Result<(), StoreError> {
        let url = self.table_url(&[]).map_err(StoreError::Insert)?;
        let body = serde_json::to_vec(&InsertBody {
            day: row.day,
            hour: row.hour,
            mins: row.slot,
            count: row.count,
        })
        .map_err(|err| StoreError::Insert(err.to_string()))?;
        self.send(Method::POST, url, Some(body))
            .await
            .map_err(StoreError::Insert)?;
        Ok(())
    }

    async fn update_count(&self, row: CounterRow) -> Result<(), StoreError> {
        let url = self
            .table_url(&Self::key_filters(row.key()))
            .map_err(StoreError::Update)?;
        let body = serde_json::to_vec(&UpdateBody { count: row.count })
            .map_err(|err| StoreError::Update(err.to_string()))?;
        self.send(Method::PATCH, url, Some(body))
            .await
            .map_err(StoreError::Update)?;
        Ok(())
    }
}

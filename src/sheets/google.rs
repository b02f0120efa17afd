use crate::fetch::HttpClient;
use crate::sheets::{Grid, SheetRange, SheetsError, TabularSource};
use async_trait::async_trait;
use reqwest::{Method, Request, Url};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Read-only client for the Sheets v4 `values` endpoint.
///
/// Credentials are the wrapped client's business; in production that is a
/// [`UrlParam`](crate::fetch::auth::UrlParam) adding `key=<token>`.
pub struct GoogleSheets<C> {
    client: C,
    base_url: String,
    spreadsheet_id: String,
}

impl<C: HttpClient> GoogleSheets<C> {
    pub fn new(client: C, base_url: impl Into<String>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn values_url(&self, range: &SheetRange) -> Result<Url, SheetsError> {
        let raw = format!(
            "{}/{}/values/{}",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            range.a1()
        );
        let mut url = Url::parse(&raw).map_err(|err| SheetsError::InvalidUrl(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("majorDimension", range.major.as_query_value());
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode a `ValueRange` body. Google drops `values` entirely for an empty block.
pub fn parse_value_range(body: &str) -> Result<Grid, SheetsError> {
    let parsed: ValueRange = serde_json::from_str(body)?;
    Ok(parsed
        .values
        .into_iter()
        .map(|line| line.into_iter().map(cell_text).collect())
        .collect())
}

#[async_trait]
impl<C: HttpClient> TabularSource for GoogleSheets<C> {
    async fn fetch_range(&self, range: &SheetRange) -> Result<Grid, SheetsError> {
        let url = self.values_url(range)?;
        debug!(range = %range.a1(), "Fetching sheet range");

        let response = self.client.execute(Request::new(Method::GET, url)).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SheetsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_value_range(&body)
    }
}

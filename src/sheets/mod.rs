//! Spreadsheet-shaped data source holding the historical occupancy matrices.

use async_trait::async_trait;
use thiserror::Error;

pub mod google;
pub mod mock;

pub use google::GoogleSheets;
pub use mock::MockSheets;

/// Two-dimensional block of cell text.
pub type Grid = Vec<Vec<String>>;

/// Which axis forms the outer list of a fetched grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorDimension {
    Rows,
    Columns,
}

impl MajorDimension {
    pub fn as_query_value(self) -> &'static str {
        match self {
            MajorDimension::Rows => "ROWS",
            MajorDimension::Columns => "COLUMNS",
        }
    }
}

/// A rectangular block addressed by sheet name and A1 cell range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub cells: String,
    pub major: MajorDimension,
}

impl SheetRange {
    pub fn new(sheet: impl Into<String>, cells: impl Into<String>, major: MajorDimension) -> Self {
        Self {
            sheet: sheet.into(),
            cells: cells.into(),
            major,
        }
    }

    /// `Sheet!A1:B2` notation.
    pub fn a1(&self) -> String {
        format!("{}!{}", self.sheet, self.cells)
    }
}

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("invalid source url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("source returned http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TabularSource: Send + Sync {
    async fn fetch_range(&self, range: &SheetRange) -> Result<Grid, SheetsError>;
}

/// Stand-in used when no spreadsheet is configured; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl TabularSource for Unconfigured {
    async fn fetch_range(&self, _range: &SheetRange) -> Result<Grid, SheetsError> {
        Err(SheetsError::Unavailable(
            "no spreadsheet configured".to_string(),
        ))
    }
}

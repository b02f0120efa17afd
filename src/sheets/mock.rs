use crate::sheets::{Grid, SheetRange, SheetsError, TabularSource};
use async_trait::async_trait;
use std::collections::HashMap;

/// In-process source keyed by sheet name. Sheets without a grid fail like an unreachable source.
#[derive(Debug, Clone, Default)]
pub struct MockSheets {
    grids: HashMap<String, Grid>,
    fail_all: bool,
}

impl MockSheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every fetch fails.
    pub fn unavailable() -> Self {
        Self {
            grids: HashMap::new(),
            fail_all: true,
        }
    }

    pub fn with_sheet<R, C>(mut self, sheet: &str, grid: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: ToString,
    {
        let grid = grid
            .into_iter()
            .map(|line| line.into_iter().map(|cell| cell.to_string()).collect())
            .collect();
        self.grids.insert(sheet.to_string(), grid);
        self
    }
}

#[async_trait]
impl TabularSource for MockSheets {
    async fn fetch_range(&self, range: &SheetRange) -> Result<Grid, SheetsError> {
        if self.fail_all {
            return Err(SheetsError::Unavailable("mock source offline".to_string()));
        }
        self.grids
            .get(&range.sheet)
            .cloned()
            .ok_or_else(|| SheetsError::Unavailable(format!("no sheet named {}", range.sheet)))
    }
}

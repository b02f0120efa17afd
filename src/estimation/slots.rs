use serde::Deserialize;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

/// Width of one occupancy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum GridWidth {
    Five,
    Fifteen,
}

impl GridWidth {
    pub fn minutes(self) -> u32 {
        match self {
            GridWidth::Five => 5,
            GridWidth::Fifteen => 15,
        }
    }
}

impl TryFrom<u32> for GridWidth {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            5 => Ok(GridWidth::Five),
            15 => Ok(GridWidth::Fifteen),
            other => Err(format!("unsupported grid width: {other} (expected 5 or 15)")),
        }
    }
}

/// Snap a minute-of-hour down onto the grid.
pub fn normalize_to_grid(minutes: u32, grid: GridWidth) -> u32 {
    let width = grid.minutes();
    (minutes / width) * width
}

/// Render a 24-hour `hour` and minute as 12-hour display text, e.g. `"1:05 PM"`.
///
/// This string is the join key between live samples and average curves, so every
/// producer of `time` labels goes through here.
pub fn format_slot(hour: u32, minute: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display_hour}:{minute:02} {suffix}")
}

/// Where the first historical reading of a day sits and how far apart readings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesLayout {
    pub grid: GridWidth,
    pub start_hour: u32,
    pub start_minute: u32,
}

impl SeriesLayout {
    /// 5-minute sensor feed, first reading at 06:15.
    pub fn five_minute() -> Self {
        Self {
            grid: GridWidth::Five,
            start_hour: 6,
            start_minute: 15,
        }
    }

    /// 15-minute manual counts, first reading at 06:00.
    pub fn fifteen_minute() -> Self {
        Self {
            grid: GridWidth::Fifteen,
            start_hour: 6,
            start_minute: 0,
        }
    }

    pub fn for_grid(grid: GridWidth) -> Self {
        match grid {
            GridWidth::Five => Self::five_minute(),
            GridWidth::Fifteen => Self::fifteen_minute(),
        }
    }

    /// Display label of the `index`-th reading of a day. Wraps past midnight.
    pub fn slot_label(&self, index: usize) -> String {
        let start = self.start_hour * MINUTES_PER_HOUR + self.start_minute;
        let offset = (index as u64 * self.grid.minutes() as u64) % MINUTES_PER_DAY as u64;
        let total = (start + offset as u32) % MINUTES_PER_DAY;
        format_slot(total / MINUTES_PER_HOUR, total % MINUTES_PER_HOUR)
    }
}

impl Default for SeriesLayout {
    fn default() -> Self {
        Self::fifteen_minute()
    }
}

//! Wall-clock source. The only time-dependent input of the estimation code.

use chrono::{Datelike, Timelike, Utc};
use chrono_tz::Tz;
use time::Weekday;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Local weekday and time of day in the deployment's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl WallClock {
    /// Calendar day index used by the live counter rows (Sunday=0..Saturday=6).
    pub fn day_index(&self) -> u8 {
        self.weekday.number_days_from_sunday()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> WallClock;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> WallClock {
        let local = Utc::now().with_timezone(&self.tz);
        let days_from_monday = local.weekday().num_days_from_monday() as u8;
        WallClock {
            weekday: Weekday::Monday.nth_next(days_from_monday),
            hour: local.hour(),
            minute: local.minute(),
        }
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub WallClock);

impl FixedClock {
    pub fn new(now: WallClock) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> WallClock {
        self.0
    }
}

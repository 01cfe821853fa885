use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Wire and display format of a date-time (`datetime-local` style).
pub const TIME_POINT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A local date-time with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(NaiveDateTime);

impl TimePoint {
    /// Seconds and sub-seconds are dropped.
    pub fn new(dt: NaiveDateTime) -> Self {
        let truncated = dt
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        Self(truncated)
    }

    pub fn now(clock: &dyn Clock) -> Self {
        Self::new(clock.now())
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_POINT_FORMAT))
    }
}

impl FromStr for TimePoint {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, TIME_POINT_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
            .map(Self::new)
            .map_err(|_| {
                SearchError::validation(format!(
                    "Invalid date/time '{s}'. Use YYYY-MM-DDTHH:MM."
                ))
            })
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of "now". Endpoint selection and the year window read it at call time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Inclusive range of calendar years a search may target, relative to the
/// current year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub years_back: u32,
    pub years_ahead: u32,
}

impl Default for YearWindow {
    fn default() -> Self {
        Self { years_back: 40, years_ahead: 5 }
    }
}

impl YearWindow {
    pub fn bounds(&self, current_year: i32) -> (i32, i32) {
        let back = i32::try_from(self.years_back).unwrap_or(i32::MAX);
        let ahead = i32::try_from(self.years_ahead).unwrap_or(i32::MAX);
        (current_year.saturating_sub(back), current_year.saturating_add(ahead))
    }

    pub fn check(&self, when: TimePoint, now: NaiveDateTime) -> Result<(), SearchError> {
        let (min, max) = self.bounds(now.year());
        if (min..=max).contains(&when.year()) {
            Ok(())
        } else {
            Err(SearchError::validation(format!(
                "Date must be between {min}-01-01T00:00 and {max}-12-31T23:59."
            )))
        }
    }
}

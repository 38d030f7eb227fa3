//! Visible week window.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Direction for week navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Previous,
    Current,
    Next,
}

/// A Monday-based week, showing either the five working days or all seven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    start: NaiveDate,
    include_weekends: bool,
}

impl WeekRange {
    /// The week that contains `date`.
    #[must_use]
    pub fn containing(date: NaiveDate, include_weekends: bool) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        Self {
            start: date - Duration::days(offset),
            include_weekends,
        }
    }

    /// Monday of the week.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last visible day (Friday or Sunday).
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(self.day_count()) - 1)
    }

    #[must_use]
    pub const fn day_count(&self) -> u8 {
        if self.include_weekends { 7 } else { 5 }
    }

    #[must_use]
    pub const fn include_weekends(&self) -> bool {
        self.include_weekends
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }

    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(usize::from(self.day_count())).collect()
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::weeks(1),
            include_weekends: self.include_weekends,
        }
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::weeks(1),
            include_weekends: self.include_weekends,
        }
    }

    /// Week reached from `self` in `direction`; `Current` means the week of `today`.
    #[must_use]
    pub fn navigate(&self, direction: Navigate, today: NaiveDate) -> Self {
        match direction {
            Navigate::Previous => self.previous(),
            Navigate::Next => self.next(),
            Navigate::Current => Self::containing(today, self.include_weekends),
        }
    }
}

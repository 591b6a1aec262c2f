//! Date and window utilities.
//!
//! Every date the engine handles is a [`NaiveDate`]: a calendar day with no
//! time component, which is exactly a "midnight-normalized" date. The only
//! point where a time of day exists is the injected `now`, which is reduced
//! to its local calendar day by [`today`].
//!
//! Nothing here reads the system clock.

use chrono::{DateTime, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};

/// Default lookback for history questionnaires.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;

/// The calendar day of `now` in its own timezone (local midnight).
pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    now.date_naive()
}

/// Signed number of days from `origin` to `date`.
pub fn day_offset(date: NaiveDate, origin: NaiveDate) -> i64 {
    date.signed_duration_since(origin).num_days()
}

/// A closed span of calendar days over which coverage is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Window {
    lower_bound: NaiveDate,
    upper_bound: NaiveDate,
}

impl Window {
    /// Build a window from explicit bounds (both inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::InvalidWindow`] if `lower_bound > upper_bound`.
    pub fn new(lower_bound: NaiveDate, upper_bound: NaiveDate) -> Result<Self> {
        if lower_bound > upper_bound {
            return Err(CoverageError::invalid_window(format!(
                "lower bound {} is after upper bound {}",
                lower_bound, upper_bound
            )));
        }
        Ok(Self {
            lower_bound,
            upper_bound,
        })
    }

    /// The trailing `years` ending on `upper_bound`.
    ///
    /// The lower bound is the same calendar day `years` earlier; a Feb 29
    /// upper bound maps to Feb 28 in a non-leap year.
    pub fn ending_on(upper_bound: NaiveDate, years: u32) -> Result<Self> {
        let lower_bound = years
            .checked_mul(12)
            .and_then(|months| upper_bound.checked_sub_months(Months::new(months)))
            .ok_or_else(|| {
                CoverageError::invalid_window(format!(
                    "{} years before {} is out of range",
                    years, upper_bound
                ))
            })?;
        Self::new(lower_bound, upper_bound)
    }

    /// The trailing `years` ending today, where "today" is the local day of `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, TimeZone, Utc};
    /// use timeline_coverage::Window;
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 1, 1, 15, 30, 0).unwrap();
    /// let window = Window::trailing_years(&now, 5).unwrap();
    /// assert_eq!(window.lower_bound(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    /// assert_eq!(window.upper_bound(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    /// ```
    pub fn trailing_years<Tz: TimeZone>(now: &DateTime<Tz>, years: u32) -> Result<Self> {
        Self::ending_on(today(now), years)
    }

    pub fn lower_bound(&self) -> NaiveDate {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> NaiveDate {
        self.upper_bound
    }

    /// Number of days in the window, both bounds included.
    pub fn total_days(&self) -> usize {
        // lower <= upper is enforced at construction.
        day_offset(self.upper_bound, self.lower_bound) as usize + 1
    }

    /// Offset of `date` from the lower bound; negative before the window.
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        day_offset(date, self.lower_bound)
    }

    /// The calendar date `offset` days into the window.
    pub fn date_at(&self, offset: usize) -> NaiveDate {
        self.lower_bound
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(self.upper_bound)
            .min(self.upper_bound)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower_bound <= date && date <= self.upper_bound
    }
}

/// How the caller describes the evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    /// The trailing `years` ending on the local day of `now`.
    Lookback { years: u32 },
    /// Fixed inclusive bounds.
    Explicit { lower: NaiveDate, upper: NaiveDate },
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec::Lookback {
            years: DEFAULT_LOOKBACK_YEARS,
        }
    }
}

impl WindowSpec {
    /// Resolve into a concrete [`Window`] against the injected `now`.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Window> {
        match *self {
            WindowSpec::Lookback { years } => Window::trailing_years(now, years),
            WindowSpec::Explicit { lower, upper } => Window::new(lower, upper),
        }
    }
}

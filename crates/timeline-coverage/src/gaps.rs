//! Gap detection over a day-indexed coverage set.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::coverage::CoverageSet;

/// Divisor behind every "approximate months" figure the engine reports.
pub const DAYS_PER_MONTH: usize = 30;

/// `days / 30`, rounded up.
pub fn approximate_months(days: usize) -> usize {
    days.div_ceil(DAYS_PER_MONTH)
}

/// A maximal run of uncovered days, as inclusive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Gap {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length_days: usize,
}

impl Gap {
    fn from_offsets(origin: NaiveDate, first: usize, last: usize) -> Self {
        Self {
            start: date_after(origin, first),
            end: date_after(origin, last),
            length_days: last - first + 1,
        }
    }

    pub fn approximate_months(&self) -> usize {
        approximate_months(self.length_days)
    }
}

fn date_after(origin: NaiveDate, offset: usize) -> NaiveDate {
    origin
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Scan `set` left to right and emit each run of uncovered days.
///
/// Index `i` of the set is the day `lower_bound + i`. Gaps come out oldest
/// first, each at least one day long, and never touching one another.
pub fn detect_gaps(set: &CoverageSet, lower_bound: NaiveDate) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let mut open: Option<usize> = None;

    for (offset, covered) in set.iter().enumerate() {
        match (covered, open) {
            (false, None) => open = Some(offset),
            (true, Some(first)) => {
                gaps.push(Gap::from_offsets(lower_bound, first, offset - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(first) = open {
        gaps.push(Gap::from_offsets(lower_bound, first, set.len() - 1));
    }
    gaps
}

//! Strict-chain validation for address history.
//!
//! Address periods are listed most recent first. Each one must end exactly
//! on the day the next more recent one starts, and the most recent must end
//! on the anchor date (the day the applicant moved to the current address).
//! The form propagates those end dates automatically, so any mismatch is a
//! usage error reported back for correction rather than a gap to measure.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoverageError, Result};
use crate::gaps::approximate_months;
use crate::interval::{Span, TimeInterval};
use crate::window::{day_offset, Window};

/// Whether a chain reaches back to the window's lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainCompletionStatus {
    pub is_complete: bool,
    /// Months still missing, only when incomplete and at least one period exists.
    pub approximate_remaining_months: Option<usize>,
}

impl ChainCompletionStatus {
    /// No periods entered yet. Distinct from "entered but too short".
    pub fn is_unstarted(&self) -> bool {
        !self.is_complete && self.approximate_remaining_months.is_none()
    }
}

/// Validate an address chain ordered most recent first.
///
/// # Errors
///
/// - [`CoverageError::OutOfOrder`] if a period starts after the one listed
///   before it. Ordering is checked for the whole list before adjacency.
/// - [`CoverageError::BrokenChain`] if period 0 does not end on `anchor`, or a
///   later period does not end on its predecessor's start.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use timeline_coverage::{validate_chain, TimeInterval, Window};
///
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let window = Window::new(d(2020, 1, 1), d(2025, 1, 1)).unwrap();
/// let periods = [
///     TimeInterval::new(d(2021, 5, 1), d(2023, 2, 1)).unwrap(),
///     TimeInterval::new(d(2019, 8, 1), d(2021, 5, 1)).unwrap(),
/// ];
/// let status = validate_chain(&periods, &window, d(2023, 2, 1)).unwrap();
/// assert!(status.is_complete);
/// ```
pub fn validate_chain<S: Span>(
    periods: &[S],
    window: &Window,
    anchor: NaiveDate,
) -> Result<ChainCompletionStatus> {
    let intervals: Vec<TimeInterval> = periods.iter().map(Span::interval).collect();

    for (index, pair) in intervals.windows(2).enumerate() {
        if pair[1].start() > pair[0].start() {
            debug!(index = index + 1, "address chain out of order");
            return Err(CoverageError::OutOfOrder { index: index + 1 });
        }
    }

    let mut expected = anchor;
    for (index, interval) in intervals.iter().enumerate() {
        if interval.end() != expected {
            debug!(index, %expected, found = %interval.end(), "address chain broken");
            return Err(CoverageError::BrokenChain {
                index,
                expected,
                found: interval.end(),
            });
        }
        expected = interval.start();
    }

    let status = match intervals.last() {
        None => ChainCompletionStatus {
            is_complete: false,
            approximate_remaining_months: None,
        },
        Some(oldest) if oldest.start() <= window.lower_bound() => ChainCompletionStatus {
            is_complete: true,
            approximate_remaining_months: None,
        },
        Some(oldest) => {
            let missing = day_offset(oldest.start(), window.lower_bound()) as usize;
            ChainCompletionStatus {
                is_complete: false,
                approximate_remaining_months: Some(approximate_months(missing)),
            }
        }
    };
    debug!(
        periods = intervals.len(),
        %anchor,
        complete = status.is_complete,
        remaining_months = ?status.approximate_remaining_months,
        "validated address chain"
    );
    Ok(status)
}

/// The interval set a chain stands for: every period plus the current
/// residence, from `anchor` through `today`.
///
/// Feeding this to [`compute_coverage`](crate::compute_coverage) over a window
/// ending `today` gives the same verdict as [`validate_chain`] on a valid chain.
pub fn chain_intervals<S: Span>(
    periods: &[S],
    anchor: NaiveDate,
    today: NaiveDate,
) -> Vec<TimeInterval> {
    let mut intervals: Vec<TimeInterval> = periods.iter().map(Span::interval).collect();
    intervals.push(TimeInterval::single_day(anchor).extended_to(today));
    intervals
}

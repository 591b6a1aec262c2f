//! Overlap-tolerant coverage of a window by a set of intervals.
//!
//! Coverage is a boolean per day of the window. Each interval marks its days
//! after clipping to the window; marking is idempotent, so concurrent
//! intervals (part-time jobs held at the same time) simply OR together.
//!
//! Windows here are a few thousand days and entry counts are in the tens, so
//! a flat per-day set beats any interval index.

use serde::Serialize;
use tracing::debug;

use crate::gaps::{detect_gaps, Gap};
use crate::interval::{Span, TimeInterval};
use crate::window::Window;

/// One flag per day of a window, index 0 being the lower bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSet {
    days: Vec<bool>,
}

impl CoverageSet {
    pub fn new(len: usize) -> Self {
        Self {
            days: vec![false; len],
        }
    }

    /// Build the coverage set of `spans` over `window`.
    pub fn build<S: Span>(window: &Window, spans: &[S]) -> Self {
        let mut set = Self::new(window.total_days());
        for span in spans {
            if let Some((first, last)) = clip_to_window(window, &span.interval()) {
                set.mark(first, last);
            }
        }
        set
    }

    /// Mark days `first..=last` covered. Out-of-range indices are ignored.
    pub fn mark(&mut self, first: usize, last: usize) {
        let last = last.min(self.days.len().saturating_sub(1));
        if first > last || self.days.is_empty() {
            return;
        }
        self.days[first..=last].fill(true);
    }

    pub fn is_covered(&self, offset: usize) -> bool {
        self.days.get(offset).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn covered_days(&self) -> usize {
        self.days.iter().filter(|&&covered| covered).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.days.iter().copied()
    }
}

/// Day offsets of `interval` clipped into `window`, or `None` if the
/// interval lies entirely outside it.
pub(crate) fn clip_to_window(
    window: &Window,
    interval: &TimeInterval,
) -> Option<(usize, usize)> {
    let last_day = window.total_days() as i64 - 1;
    let first = window.day_offset(interval.start());
    let last = window.day_offset(interval.end());
    if last < 0 || first > last_day {
        return None;
    }
    Some((first.max(0) as usize, last.min(last_day) as usize))
}

/// How much of a window is covered, and where it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageResult {
    pub covered_days: usize,
    pub total_days: usize,
    /// Uncovered runs, oldest first.
    pub gaps: Vec<Gap>,
}

impl CoverageResult {
    pub fn gap_days(&self) -> usize {
        self.gaps.iter().map(|g| g.length_days).sum()
    }

    pub fn is_fully_covered(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Covered share of the window, `0.0..=100.0`.
    pub fn coverage_percent(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        self.covered_days as f64 * 100.0 / self.total_days as f64
    }
}

/// Compute day-level coverage of `window` by `spans`.
///
/// Overlapping and duplicate spans are harmless. Spans reaching outside the
/// window are clipped; spans entirely outside it are ignored. With no spans
/// the whole window is a single gap.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use timeline_coverage::{compute_coverage, TimeInterval, Window};
///
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let window = Window::new(d(2023, 1, 1), d(2023, 12, 31)).unwrap();
/// let jobs = [
///     TimeInterval::new(d(2023, 1, 1), d(2023, 6, 1)).unwrap(),
///     TimeInterval::new(d(2023, 3, 1), d(2023, 9, 1)).unwrap(),
/// ];
/// let result = compute_coverage(&window, &jobs);
/// assert_eq!(result.gaps.len(), 1);
/// assert_eq!(result.gaps[0].start, d(2023, 9, 2));
/// ```
pub fn compute_coverage<S: Span>(window: &Window, spans: &[S]) -> CoverageResult {
    let set = CoverageSet::build(window, spans);
    let result = CoverageResult {
        covered_days: set.covered_days(),
        total_days: set.len(),
        gaps: detect_gaps(&set, window.lower_bound()),
    };
    debug!(
        lower = %window.lower_bound(),
        upper = %window.upper_bound(),
        spans = spans.len(),
        covered = result.covered_days,
        total = result.total_days,
        gaps = result.gaps.len(),
        "computed coverage"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn interval(start: NaiveDate, end: NaiveDate) -> TimeInterval {
        TimeInterval::new(start, end).unwrap()
    }

    fn year_2023() -> Window {
        Window::new(date(2023, 1, 1), date(2023, 12, 31)).unwrap()
    }

    // ── CoverageSet ─────────────────────────────────────────────────────

    #[test]
    fn test_mark_is_idempotent() {
        let mut set = CoverageSet::new(10);
        set.mark(2, 5);
        set.mark(2, 5);
        set.mark(4, 6);
        assert_eq!(set.covered_days(), 5);
        assert!(set.is_covered(6));
        assert!(!set.is_covered(7));
    }

    #[test]
    fn test_mark_clamps_past_end() {
        let mut set = CoverageSet::new(3);
        set.mark(1, 99);
        assert_eq!(set.covered_days(), 2);
        assert!(!set.is_covered(99));
    }

    // ── clip_to_window ──────────────────────────────────────────────────

    #[test]
    fn test_clip_partial_overlap() {
        let w = year_2023();
        let clipped = clip_to_window(&w, &interval(date(2022, 6, 1), date(2023, 1, 10)));
        assert_eq!(clipped, Some((0, 9)));
        let clipped = clip_to_window(&w, &interval(date(2023, 12, 30), date(2030, 1, 1)));
        assert_eq!(clipped, Some((363, 364)));
    }

    #[test]
    fn test_clip_drops_intervals_outside_window() {
        let w = year_2023();
        assert_eq!(clip_to_window(&w, &interval(date(1990, 1, 1), date(2022, 12, 31))), None);
        assert_eq!(clip_to_window(&w, &interval(date(2024, 1, 1), date(2099, 1, 1))), None);
    }

    // ── compute_coverage ────────────────────────────────────────────────

    #[test]
    fn test_empty_input_is_one_full_gap() {
        let w = year_2023();
        let result = compute_coverage::<TimeInterval>(&w, &[]);
        assert_eq!(result.covered_days, 0);
        assert_eq!(result.total_days, 365);
        assert_eq!(
            result.gaps,
            vec![Gap {
                start: date(2023, 1, 1),
                end: date(2023, 12, 31),
                length_days: 365
            }]
        );
    }

    #[test]
    fn test_full_coverage() {
        let w = year_2023();
        let result = compute_coverage(&w, &[interval(date(2020, 1, 1), date(2025, 1, 1))]);
        assert_eq!(result.covered_days, 365);
        assert!(result.is_fully_covered());
        assert_eq!(result.coverage_percent(), 100.0);
    }

    #[test]
    fn test_overlap_counts_days_once() {
        let w = year_2023();
        let result = compute_coverage(
            &w,
            &[
                interval(date(2023, 1, 1), date(2023, 1, 31)),
                interval(date(2023, 1, 15), date(2023, 2, 14)),
            ],
        );
        assert_eq!(result.covered_days, 45);
        assert_eq!(result.gap_days(), 365 - 45);
    }

    #[test]
    fn test_interval_before_window_does_not_cover_first_day() {
        let w = year_2023();
        let result = compute_coverage(&w, &[interval(date(2019, 1, 1), date(2019, 12, 31))]);
        assert_eq!(result.covered_days, 0);
        assert_eq!(result.gaps.len(), 1);
    }

    #[test]
    fn test_day_after_gap_boundaries() {
        let w = year_2023();
        let result = compute_coverage(
            &w,
            &[
                interval(date(2023, 1, 1), date(2023, 3, 31)),
                interval(date(2023, 4, 2), date(2023, 12, 31)),
            ],
        );
        assert_eq!(result.gaps.len(), 1);
        assert_eq!(result.gaps[0].start, date(2023, 4, 1));
        assert_eq!(result.gaps[0].end, date(2023, 4, 1));
        assert_eq!(result.gaps[0].length_days, 1);
    }

    #[test]
    fn test_coverage_percent_of_empty_window_is_zero() {
        let result = CoverageResult {
            covered_days: 0,
            total_days: 0,
            gaps: Vec::new(),
        };
        assert_eq!(result.coverage_percent(), 0.0);
    }
}

//! Display segments for a coverage bar.
//!
//! Merges spans into contiguous covered runs positioned as percentages of the
//! window, plus the complementary gap runs. This is for rendering only, but
//! it must report the same gaps as [`compute_coverage`](crate::compute_coverage)
//! for the same input, so the sweep runs on the same clipped day offsets and
//! only converts to percentages on output.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::coverage::clip_to_window;
use crate::interval::Span;
use crate::window::Window;

/// Joins the labels of spans merged into one segment.
pub const LABEL_SEPARATOR: &str = " / ";

/// Label carried by every gap segment.
pub const GAP_LABEL: &str = "gap";

/// One run on the coverage bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySegment {
    pub start_percent: f64,
    pub end_percent: f64,
    pub label: String,
    /// First and last calendar day of the run, inclusive.
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DisplaySegment {
    pub fn width_percent(&self) -> f64 {
        self.end_percent - self.start_percent
    }
}

/// Covered runs and gaps across a window, both in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineBar {
    pub segments: Vec<DisplaySegment>,
    pub gaps: Vec<DisplaySegment>,
}

impl TimelineBar {
    pub fn covered_percent(&self) -> f64 {
        self.segments.iter().map(DisplaySegment::width_percent).sum()
    }
}

/// A run of day offsets `[first, end)` with the labels merged into it.
struct Run {
    first: usize,
    end: usize,
    labels: Vec<String>,
}

impl Run {
    fn add_label(&mut self, label: Option<&str>) {
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            if !self.labels.iter().any(|l| l == label) {
                self.labels.push(label.to_string());
            }
        }
    }
}

/// Merge `spans` into display segments over `window`.
///
/// Spans are clipped to the window and sorted by start; a span joins the
/// open segment when it starts no later than that segment ends (touching
/// spans merge). Gaps are whatever the segments leave uncovered.
pub fn merge_for_display<S: Span>(window: &Window, spans: &[S]) -> TimelineBar {
    let total = window.total_days();

    let mut clipped: Vec<(usize, usize, Option<&str>)> = spans
        .iter()
        .filter_map(|span| {
            clip_to_window(window, &span.interval())
                .map(|(first, last)| (first, last + 1, span.label()))
        })
        .collect();
    clipped.sort_by_key(|&(first, end, _)| (first, end));

    let mut runs: Vec<Run> = Vec::new();
    for (first, end, label) in clipped {
        match runs.last_mut() {
            Some(open) if first <= open.end => {
                open.end = open.end.max(end);
                open.add_label(label);
            }
            _ => {
                let mut run = Run {
                    first,
                    end,
                    labels: Vec::new(),
                };
                run.add_label(label);
                runs.push(run);
            }
        }
    }

    let segment = |first: usize, end: usize, label: String| DisplaySegment {
        start_percent: percent(first, total),
        end_percent: percent(end, total),
        label,
        start: window.date_at(first),
        end: window.date_at(end - 1),
    };

    let mut bar = TimelineBar::default();
    let mut cursor = 0;
    for run in runs {
        if run.first > cursor {
            bar.gaps.push(segment(cursor, run.first, GAP_LABEL.to_string()));
        }
        cursor = run.end;
        bar.segments
            .push(segment(run.first, run.end, run.labels.join(LABEL_SEPARATOR)));
    }
    if cursor < total {
        bar.gaps.push(segment(cursor, total, GAP_LABEL.to_string()));
    }

    debug!(
        spans = spans.len(),
        segments = bar.segments.len(),
        gaps = bar.gaps.len(),
        "merged timeline for display"
    );
    bar
}

fn percent(offset: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    offset as f64 * 100.0 / total as f64
}

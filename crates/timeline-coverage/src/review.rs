//! One-call review of a history list under a caller-chosen mode.
//!
//! The caller decides the policy (window and mode); this module normalizes
//! the raw rows, runs the matching engine path and bundles everything a
//! screen needs: the verdict, a coverage bar, and the rows it could not use.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::{validate_chain, ChainCompletionStatus};
use crate::coverage::{compute_coverage, CoverageResult};
use crate::error::{CoverageError, Result};
use crate::interval::{AddressPeriod, TimeInterval};
use crate::normalize::{normalize_entries, RawEntry, RejectedEntry};
use crate::segments::{merge_for_display, TimelineBar};
use crate::window::{Window, WindowSpec};

/// Bar label for the residence that starts on the anchor date.
pub const CURRENT_ADDRESS_LABEL: &str = "current address";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewMode {
    /// Employment and activity history; concurrent entries are fine.
    #[default]
    OverlapTolerant,
    /// Address history, most recent first, chained back from `anchor`.
    StrictChain { anchor: NaiveDate },
}

/// What the form hands over on each recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub mode: ReviewMode,
    #[serde(default)]
    pub window: WindowSpec,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Coverage(CoverageResult),
    Chain(ChainCompletionStatus),
    /// The chain could not be evaluated; the form should prompt a fix.
    ChainInvalid { error: CoverageError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub window: Window,
    pub outcome: ReviewOutcome,
    pub timeline: TimelineBar,
    pub rejected: Vec<RejectedEntry>,
}

impl Review {
    /// True until the history accounts for the whole window.
    pub fn needs_more_history(&self) -> bool {
        match &self.outcome {
            ReviewOutcome::Coverage(result) => !result.is_fully_covered(),
            ReviewOutcome::Chain(status) => !status.is_complete,
            ReviewOutcome::ChainInvalid { .. } => true,
        }
    }

    /// Whether the history-entry subsection stays visible: more history is
    /// needed, or some rows must be corrected.
    pub fn show_entry_form(&self) -> bool {
        self.needs_more_history() || !self.rejected.is_empty()
    }
}

/// Review `request` as of `now`.
///
/// Rows that fail normalization are listed in [`Review::rejected`] and left
/// out of the computation. In strict-chain mode a chain violation becomes
/// [`ReviewOutcome::ChainInvalid`] rather than an error.
///
/// # Errors
///
/// Returns [`CoverageError::InvalidWindow`] if the window cannot be resolved.
pub fn review<Tz: TimeZone>(request: &ReviewRequest, now: &DateTime<Tz>) -> Result<Review> {
    let window = request.window.resolve(now)?;
    let normalized = normalize_entries(&request.entries, now);

    let (outcome, timeline) = match request.mode {
        ReviewMode::OverlapTolerant => {
            let result = compute_coverage(&window, &normalized.entries);
            let timeline = merge_for_display(&window, &normalized.entries);
            (ReviewOutcome::Coverage(result), timeline)
        }
        ReviewMode::StrictChain { anchor } => {
            let periods: Vec<AddressPeriod> = normalized
                .entries
                .iter()
                .cloned()
                .map(AddressPeriod::from)
                .collect();
            let outcome = match validate_chain(&periods, &window, anchor) {
                Ok(status) => ReviewOutcome::Chain(status),
                Err(error) => ReviewOutcome::ChainInvalid {
                    error: normalized.locate_error(error),
                },
            };
            let mut spans = periods;
            spans.push(AddressPeriod::new(
                TimeInterval::single_day(anchor).extended_to(window.upper_bound()),
                CURRENT_ADDRESS_LABEL,
            ));
            (outcome, merge_for_display(&window, &spans))
        }
    };

    let review = Review {
        window,
        outcome,
        timeline,
        rejected: normalized.rejected,
    };
    debug!(
        entries = request.entries.len(),
        rejected = review.rejected.len(),
        needs_more_history = review.needs_more_history(),
        "reviewed history"
    );
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()
    }

    // ── overlap-tolerant ────────────────────────────────────────────────

    #[test]
    fn test_overlap_review_reports_gaps_and_rejections() {
        let request = ReviewRequest {
            entries: vec![
                RawEntry::ongoing("employment", "2024-06-01"),
                RawEntry::bounded("employment", "2021-01-01", "2020-01-01"),
            ],
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        let ReviewOutcome::Coverage(result) = &review.outcome else {
            panic!("expected coverage outcome");
        };
        assert_eq!(result.gaps.len(), 1);
        assert_eq!(review.timeline.gaps.len(), 1);
        assert_eq!(review.rejected.len(), 1);
        assert!(review.needs_more_history());
        assert!(review.show_entry_form());
    }

    #[test]
    fn test_overlap_review_fully_covered_hides_form() {
        let request = ReviewRequest {
            entries: vec![RawEntry::ongoing("employment", "2019-01-01")],
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        assert!(!review.needs_more_history());
        assert!(!review.show_entry_form());
    }

    // ── strict chain ────────────────────────────────────────────────────

    #[test]
    fn test_chain_review_complete() {
        let request = ReviewRequest {
            mode: ReviewMode::StrictChain {
                anchor: date(2023, 1, 1),
            },
            entries: vec![
                RawEntry::bounded("address", "2021-04-01", "2023-01-01"),
                RawEntry::bounded("address", "2019-11-01", "2021-04-01"),
            ],
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        assert_eq!(
            review.outcome,
            ReviewOutcome::Chain(ChainCompletionStatus {
                is_complete: true,
                approximate_remaining_months: None,
            })
        );
        assert!(review.timeline.gaps.is_empty());
        assert!(review
            .timeline
            .segments[0]
            .label
            .contains(CURRENT_ADDRESS_LABEL));
        assert!(!review.show_entry_form());
    }

    #[test]
    fn test_chain_review_violation_is_reported() {
        let request = ReviewRequest {
            mode: ReviewMode::StrictChain {
                anchor: date(2023, 1, 1),
            },
            entries: vec![RawEntry::bounded("address", "2019-11-01", "2022-12-01")],
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        assert!(matches!(
            review.outcome,
            ReviewOutcome::ChainInvalid {
                error: CoverageError::BrokenChain { index: 0, .. }
            }
        ));
        assert!(review.needs_more_history());
    }

    #[test]
    fn test_chain_violation_indexes_raw_rows_past_rejected_ones() {
        let request = ReviewRequest {
            mode: ReviewMode::StrictChain {
                anchor: date(2023, 1, 1),
            },
            entries: vec![
                RawEntry::bounded("address", "2021-04-01", "2023-01-01"),
                RawEntry::bounded("address", "garbage", "2021-04-01"),
                RawEntry::bounded("address", "2018-01-01", "2020-02-01"),
            ],
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        assert_eq!(review.rejected.len(), 1);
        assert_eq!(review.rejected[0].index, 1);
        assert_eq!(
            review.outcome,
            ReviewOutcome::ChainInvalid {
                error: CoverageError::BrokenChain {
                    index: 2,
                    expected: date(2021, 4, 1),
                    found: date(2020, 2, 1),
                }
            }
        );
    }

    #[test]
    fn test_chain_review_without_entries_is_unstarted() {
        let request = ReviewRequest {
            mode: ReviewMode::StrictChain {
                anchor: date(2023, 1, 1),
            },
            ..ReviewRequest::default()
        };
        let review = review(&request, &now()).unwrap();
        let ReviewOutcome::Chain(status) = review.outcome else {
            panic!("expected chain outcome");
        };
        assert!(status.is_unstarted());
    }

    // ── wire shape ──────────────────────────────────────────────────────

    #[test]
    fn test_request_deserializes_from_form_json() {
        let request: ReviewRequest = serde_json::from_value(json!({
            "mode": {"kind": "strict_chain", "anchor": "2023-01-01"},
            "window": {"kind": "lookback", "years": 5},
            "entries": [
                {"type": "address", "startDate": "2021-04-01", "endDate": "2023-01-01",
                 "isOngoing": false, "location": "44 Elm Rd"}
            ]
        }))
        .unwrap();
        assert_eq!(request.window, WindowSpec::Lookback { years: 5 });
        assert_eq!(request.entries.len(), 1);

        let review = review(&request, &now()).unwrap();
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["outcome"]["mode"], "chain");
        assert_eq!(value["outcome"]["is_complete"], false);
        assert_eq!(value["timeline"]["segments"][0]["label"], "44 Elm Rd / current address");
    }

    #[test]
    fn test_invalid_window_is_an_error() {
        let request = ReviewRequest {
            window: WindowSpec::Explicit {
                lower: date(2025, 1, 1),
                upper: date(2024, 1, 1),
            },
            ..ReviewRequest::default()
        };
        assert!(matches!(
            review(&request, &now()),
            Err(CoverageError::InvalidWindow { .. })
        ));
    }
}

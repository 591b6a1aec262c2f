//! # timeline-coverage
//!
//! Deterministic coverage analysis for history questionnaires.
//!
//! Immigration-style forms ask for every job and every address over the last
//! few years and must show that the applicant's timeline is accounted for.
//! This crate answers that question: given the rows a person has entered, how
//! much of the lookback window do they cover, and exactly which days are
//! missing.
//!
//! Every entry point is a pure function. The evaluation instant is always an
//! argument; nothing here reads the system clock or keeps state between calls.
//!
//! ## Modules
//!
//! - [`window`] — Midnight-normalized dates, day offsets, lookback windows
//! - [`interval`] — `TimeInterval`, the ongoing/bounded end type, history rows
//! - [`normalize`] — Raw form rows → canonical intervals
//! - [`coverage`] — Overlap-tolerant day-level coverage
//! - [`gaps`] — Maximal uncovered runs
//! - [`chain`] — Strict end-to-start address chains
//! - [`segments`] — Percentage segments for a coverage bar
//! - [`review`] — Mode-selecting façade used by form screens
//! - [`error`] — Error types

pub mod chain;
pub mod coverage;
pub mod error;
pub mod gaps;
pub mod interval;
pub mod normalize;
pub mod review;
pub mod segments;
pub mod window;

pub use chain::{chain_intervals, validate_chain, ChainCompletionStatus};
pub use coverage::{compute_coverage, CoverageResult, CoverageSet};
pub use error::CoverageError;
pub use gaps::{approximate_months, detect_gaps, Gap, DAYS_PER_MONTH};
pub use interval::{AddressPeriod, EntryEnd, HistoryEntry, Span, TimeInterval};
pub use normalize::{
    normalize, normalize_entries, normalize_entry, parse_date, NormalizedEntries, RawEntry,
    RejectedEntry,
};
pub use review::{review, Review, ReviewMode, ReviewOutcome, ReviewRequest};
pub use segments::{merge_for_display, DisplaySegment, TimelineBar};
pub use window::{day_offset, today, Window, WindowSpec, DEFAULT_LOOKBACK_YEARS};

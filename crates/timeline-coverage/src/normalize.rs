//! Interval normalization: raw form rows into canonical [`TimeInterval`]s.
//!
//! Raw entries arrive in the questionnaire's wire shape, with ISO-8601 date
//! strings and an `isOngoing` flag. Normalization parses the dates, resolves
//! the end into an [`EntryEnd`], and collapses `Ongoing` to the local day of
//! the injected `now`. Past this module every interval has two concrete dates.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CoverageError, Result};
use crate::interval::{EntryEnd, HistoryEntry, TimeInterval};
use crate::window::today;

/// One history row as the form stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_ongoing: bool,
    /// Fields the engine does not interpret (employer, address lines, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEntry {
    pub fn bounded(entry_type: &str, start_date: &str, end_date: &str) -> Self {
        Self {
            entry_type: entry_type.to_string(),
            start_date: start_date.to_string(),
            end_date: Some(end_date.to_string()),
            ..Self::default()
        }
    }

    pub fn ongoing(entry_type: &str, start_date: &str) -> Self {
        Self {
            entry_type: entry_type.to_string(),
            start_date: start_date.to_string(),
            is_ongoing: true,
            ..Self::default()
        }
    }

    /// Resolve how this entry ends.
    ///
    /// An entry flagged ongoing is `Ongoing` whatever its end field holds; an
    /// absent or blank end is also `Ongoing`.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::InvalidInterval`] if a non-ongoing end date
    /// cannot be parsed.
    pub fn end(&self) -> Result<EntryEnd> {
        if self.is_ongoing {
            return Ok(EntryEnd::Ongoing);
        }
        match self.end_date.as_deref().map(str::trim) {
            None | Some("") => Ok(EntryEnd::Ongoing),
            Some(s) => parse_date(s).map(EntryEnd::Bounded),
        }
    }
}

/// Parse a form date: `YYYY-MM-DD`, or an RFC 3339 datetime reduced to the
/// calendar day in its own offset.
///
/// # Errors
///
/// Returns [`CoverageError::InvalidInterval`] if neither form parses.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CoverageError::invalid_interval("missing date"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|e| CoverageError::invalid_interval(format!("'{}': {}", s, e)))
}

/// Normalize a raw entry into a [`TimeInterval`].
///
/// An ongoing entry ends on the local day of `now`. If it starts after that
/// day it becomes the single day of its start, so it can never be rejected.
///
/// # Errors
///
/// Returns [`CoverageError::InvalidInterval`] if the start is unparsable, a
/// bounded end is unparsable, or a bounded end falls before the start.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use timeline_coverage::{normalize, RawEntry};
///
/// let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
/// let interval = normalize(&RawEntry::ongoing("employment", "2024-06-01"), &now).unwrap();
/// assert_eq!(interval.end(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
/// ```
pub fn normalize<Tz: TimeZone>(raw: &RawEntry, now: &DateTime<Tz>) -> Result<TimeInterval> {
    let start = parse_date(&raw.start_date)?;
    match raw.end()? {
        EntryEnd::Ongoing => Ok(TimeInterval::single_day(start).extended_to(today(now))),
        EntryEnd::Bounded(end) => TimeInterval::new(start, end),
    }
}

/// Normalize a raw entry, keeping its category and caller fields.
pub fn normalize_entry<Tz: TimeZone>(raw: &RawEntry, now: &DateTime<Tz>) -> Result<HistoryEntry> {
    let interval = normalize(raw, now)?;
    Ok(HistoryEntry {
        category: raw.entry_type.clone(),
        interval,
        ongoing: raw.end()?.is_ongoing(),
        metadata: raw.extra.clone(),
    })
}

/// A raw entry that failed normalization, by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub error: CoverageError,
}

/// Result of normalizing a whole form list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedEntries {
    pub entries: Vec<HistoryEntry>,
    pub rejected: Vec<RejectedEntry>,
    /// Input position of each accepted entry, parallel to `entries`.
    #[serde(skip)]
    pub input_indices: Vec<usize>,
}

impl NormalizedEntries {
    pub fn intervals(&self) -> Vec<TimeInterval> {
        self.entries.iter().map(|e| e.interval).collect()
    }

    /// Position in the raw input of accepted entry `accepted`.
    pub fn input_index(&self, accepted: usize) -> usize {
        self.input_indices.get(accepted).copied().unwrap_or(accepted)
    }

    /// Point a chain error computed over `entries` at the raw input row, so
    /// it shares an index space with [`RejectedEntry::index`].
    pub fn locate_error(&self, error: CoverageError) -> CoverageError {
        error.map_chain_index(|accepted| self.input_index(accepted))
    }
}

/// Normalize every entry, collecting failures instead of stopping at the
/// first one. Accepted entries keep their input order.
pub fn normalize_entries<Tz: TimeZone>(
    raws: &[RawEntry],
    now: &DateTime<Tz>,
) -> NormalizedEntries {
    let mut out = NormalizedEntries::default();
    for (index, raw) in raws.iter().enumerate() {
        match normalize_entry(raw, now) {
            Ok(entry) => {
                out.entries.push(entry);
                out.input_indices.push(index);
            }
            Err(error) => {
                debug!(index, %error, "rejected history entry");
                out.rejected.push(RejectedEntry { index, error });
            }
        }
    }
    out
}

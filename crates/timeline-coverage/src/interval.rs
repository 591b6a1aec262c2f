//! Canonical interval types shared by every engine component.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoverageError, Result};
use crate::window::day_offset;

/// An inclusive span of calendar days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimeInterval {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeInterval {
    /// # Errors
    ///
    /// Returns [`CoverageError::InvalidInterval`] if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CoverageError::invalid_interval(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Push the end out to `date` if it is later; never shortens.
    pub fn extended_to(self, date: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: self.end.max(date),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days spanned, both ends included.
    pub fn length_days(&self) -> usize {
        day_offset(self.end, self.start) as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the two intervals share at least one day.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// How a raw entry ends: on a concrete date, or still running.
///
/// The normalizer resolves `Ongoing` against the injected "now"; no component
/// downstream of it ever sees this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum EntryEnd {
    Bounded(NaiveDate),
    Ongoing,
}

impl EntryEnd {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, EntryEnd::Ongoing)
    }
}

/// Anything the engine can measure as a span of days.
///
/// Coverage, chain and display functions are generic over this so callers
/// can pass bare intervals or their own tagged records.
pub trait Span {
    fn interval(&self) -> TimeInterval;

    /// Text shown on a timeline bar for this span.
    fn label(&self) -> Option<&str> {
        None
    }
}

impl Span for TimeInterval {
    fn interval(&self) -> TimeInterval {
        *self
    }
}

impl<T: Span + ?Sized> Span for &T {
    fn interval(&self) -> TimeInterval {
        (**self).interval()
    }

    fn label(&self) -> Option<&str> {
        (**self).label()
    }
}

/// A normalized history row: an interval plus what the form knows about it.
///
/// Only `interval` takes part in coverage math.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub category: String,
    pub interval: TimeInterval,
    /// Whether the raw entry was still running when normalized.
    pub ongoing: bool,
    /// Opaque caller fields, carried through for display.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Span for HistoryEntry {
    fn interval(&self) -> TimeInterval {
        self.interval
    }

    fn label(&self) -> Option<&str> {
        Some(&self.category)
    }
}

/// One residence in an address history chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPeriod {
    pub interval: TimeInterval,
    pub location: String,
}

impl AddressPeriod {
    pub fn new(interval: TimeInterval, location: impl Into<String>) -> Self {
        Self {
            interval,
            location: location.into(),
        }
    }
}

impl Span for AddressPeriod {
    fn interval(&self) -> TimeInterval {
        self.interval
    }

    fn label(&self) -> Option<&str> {
        Some(&self.location)
    }
}

impl From<HistoryEntry> for AddressPeriod {
    fn from(entry: HistoryEntry) -> Self {
        let location = entry
            .metadata
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(entry.category);
        Self {
            interval: entry.interval,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_interval_rejects_inverted_range() {
        let err = TimeInterval::new(date(2023, 6, 1), date(2023, 5, 31)).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidInterval { .. }));
    }

    #[test]
    fn test_interval_length_is_inclusive() {
        let interval = TimeInterval::new(date(2023, 1, 1), date(2023, 1, 31)).unwrap();
        assert_eq!(interval.length_days(), 31);
        assert_eq!(TimeInterval::single_day(date(2023, 1, 1)).length_days(), 1);
    }

    #[test]
    fn test_extended_to_never_shortens() {
        let day = TimeInterval::single_day(date(2023, 3, 1));
        assert_eq!(day.extended_to(date(2023, 3, 5)).end(), date(2023, 3, 5));
        assert_eq!(day.extended_to(date(2023, 2, 1)), day);
    }

    #[test]
    fn test_touching_intervals_overlap_on_shared_day() {
        let a = TimeInterval::new(date(2022, 1, 1), date(2022, 6, 1)).unwrap();
        let b = TimeInterval::new(date(2022, 6, 1), date(2022, 12, 1)).unwrap();
        let c = TimeInterval::new(date(2022, 6, 2), date(2022, 12, 1)).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_entry_end_serde_shape() {
        let bounded = serde_json::to_value(EntryEnd::Bounded(date(2024, 1, 1))).unwrap();
        assert_eq!(bounded, json!({"kind": "bounded", "date": "2024-01-01"}));
        let ongoing = serde_json::to_value(EntryEnd::Ongoing).unwrap();
        assert_eq!(ongoing, json!({"kind": "ongoing"}));
    }

    #[test]
    fn test_address_period_takes_location_from_metadata() {
        let mut metadata = Map::new();
        metadata.insert("location".into(), json!("12 Harbour Rd, Wellington"));
        let entry = HistoryEntry {
            category: "address".into(),
            interval: TimeInterval::single_day(date(2024, 1, 1)),
            ongoing: false,
            metadata,
        };
        let period = AddressPeriod::from(entry);
        assert_eq!(period.location, "12 Harbour Rd, Wellington");
        assert_eq!(period.label(), Some("12 Harbour Rd, Wellington"));
    }

    #[test]
    fn test_address_period_falls_back_to_category() {
        let entry = HistoryEntry {
            category: "address".into(),
            interval: TimeInterval::single_day(date(2024, 1, 1)),
            ongoing: false,
            metadata: Map::new(),
        };
        assert_eq!(AddressPeriod::from(entry).location, "address");
    }
}

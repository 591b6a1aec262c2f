//! Error types for timeline coverage operations.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Validation failures reported by the engine.
///
/// None of these abort a computation: form input is usually incomplete, so
/// callers surface them to the user and recompute after the next edit.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageError {
    #[error("Invalid interval: {reason}")]
    InvalidInterval { reason: String },

    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },

    #[error("Chain period {index} starts after the period before it")]
    OutOfOrder { index: usize },

    #[error("Chain period {index} ends on {found}, expected {expected}")]
    BrokenChain {
        index: usize,
        expected: NaiveDate,
        found: NaiveDate,
    },
}

impl CoverageError {
    pub(crate) fn invalid_interval(reason: impl Into<String>) -> Self {
        CoverageError::InvalidInterval {
            reason: reason.into(),
        }
    }

    /// Rewrite the period index of a chain error through `locate`; other
    /// variants are returned unchanged.
    pub fn map_chain_index(self, locate: impl FnOnce(usize) -> usize) -> Self {
        match self {
            CoverageError::OutOfOrder { index } => CoverageError::OutOfOrder {
                index: locate(index),
            },
            CoverageError::BrokenChain {
                index,
                expected,
                found,
            } => CoverageError::BrokenChain {
                index: locate(index),
                expected,
                found,
            },
            other => other,
        }
    }

    pub(crate) fn invalid_window(reason: impl Into<String>) -> Self {
        CoverageError::InvalidWindow {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoverageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_chain_index_rewrites_chain_variants_only() {
        let out_of_order = CoverageError::OutOfOrder { index: 1 }.map_chain_index(|i| i + 2);
        assert_eq!(out_of_order, CoverageError::OutOfOrder { index: 3 });

        let invalid = CoverageError::invalid_interval("bad").map_chain_index(|i| i + 2);
        assert_eq!(invalid, CoverageError::invalid_interval("bad"));
    }
}

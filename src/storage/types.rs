//! Series keys and read-side snapshot types.

use std::collections::BTreeSet;

/// Label tuple identifying one series inside a family.
///
/// `label` is the second label of the family: `status`, `event` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub domain: String,
    pub label: String,
}

impl SeriesKey {
    pub fn new(domain: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            label: label.into(),
        }
    }
}

/// One series value at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub domain: String,
    pub label: String,
    pub value: f64,
}

/// Point-in-time copy of every live series, sorted by domain then label.
///
/// Each family is read under its own lock; two families may reflect
/// different rounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub statuses: Vec<Sample>,
    pub events: Vec<Sample>,
    pub errors: Vec<Sample>,
}

impl StoreSnapshot {
    /// Total number of series across the three families.
    pub fn series_count(&self) -> usize {
        self.statuses.len() + self.events.len() + self.errors.len()
    }

    /// Distinct domains that own at least one series.
    pub fn domains(&self) -> BTreeSet<&str> {
        self.statuses
            .iter()
            .chain(&self.events)
            .chain(&self.errors)
            .map(|s| s.domain.as_str())
            .collect()
    }
}

//! Value ranges and index ranges.

use serde::{Deserialize, Serialize};

/// A coordinate range along one spatial axis (longitude or latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialRange {
    pub start: f64,
    pub end: f64,
}

impl SpatialRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// A degenerate range at a single coordinate.
    pub fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }
}

/// A numeric value range, used for altitude / vertical levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub start: f64,
    pub end: f64,
}

impl NumericRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Parse a vertical parameter: a single level ("850") or an
    /// interval ("1000/500").
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once('/') {
            Some((a, b)) => Some(Self::new(a.trim().parse().ok()?, b.trim().parse().ok()?)),
            None => s.trim().parse().ok().map(Self::point),
        }
    }
}

/// Inclusive `[start, end]` bounds into a coordinate array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(index: usize) -> Self {
        Self::new(index, index)
    }

    /// True when the range selects exactly one index.
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Number of indices covered (inclusive bounds).
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.start, self.end)
    }
}

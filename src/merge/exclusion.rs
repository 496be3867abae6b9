use serde::Serialize;

use crate::core::types::Locus;

/// A labeled span of loci, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionRange {
    pub label: String,
    pub start: Locus,
    pub end: Locus,
}

impl ExclusionRange {
    pub fn new(label: impl Into<String>, start: Locus, end: Locus) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn contains(&self, locus: Locus) -> bool {
        self.start <= locus && locus <= self.end
    }
}

/// Read-only set of exclusion ranges with unique labels.
///
/// Ranges are kept sorted by label so that overlapping ranges always resolve
/// to the same (alphabetically first) label.
#[derive(Debug, Clone, Default)]
pub struct ExclusionIndex {
    ranges: Vec<ExclusionRange>,
}

impl ExclusionIndex {
    /// Create an empty index (no locus is excluded)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range. Returns `false` and leaves the index unchanged if the label
    /// is already present.
    pub fn insert(&mut self, range: ExclusionRange) -> bool {
        match self
            .ranges
            .binary_search_by(|r| r.label.as_str().cmp(range.label.as_str()))
        {
            Ok(_) => false,
            Err(pos) => {
                self.ranges.insert(pos, range);
                true
            }
        }
    }

    /// Label of the first range (by label order) containing `locus`
    #[must_use]
    pub fn lookup(&self, locus: Locus) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| r.contains(locus))
            .map(|r| r.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionRange> {
        self.ranges.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

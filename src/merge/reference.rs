use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::types::{Base, Locus};
use crate::core::variant::{Provenance, ReferenceEntry};

/// Two observations disagree on the reference base at a locus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Reference base mismatch at locus {locus}: {found_source} has ref={found}, \
     but ref base at this locus was already recorded as {recorded} from {recorded_source}"
)]
pub struct ReferenceConflict {
    pub locus: Locus,
    pub recorded: Base,
    pub recorded_source: Provenance,
    pub found: Base,
    pub found_source: Provenance,
}

/// Result of recording an observation that did not conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First observation of this locus
    Inserted,
    /// Locus already known with the same base
    Confirmed,
}

/// Reference base per locus, merged across every input file.
///
/// The first observation of a locus wins; later observations are compared
/// against it and never overwrite it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMergeTable {
    entries: BTreeMap<Locus, ReferenceEntry>,
}

impl ReferenceMergeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reference base observed at `locus`
    ///
    /// # Errors
    ///
    /// Returns `ReferenceConflict` naming both provenances if the locus was
    /// already recorded with a different base.
    pub fn record(
        &mut self,
        locus: Locus,
        base: Base,
        source: Provenance,
    ) -> Result<RecordOutcome, ReferenceConflict> {
        match self.entries.get(&locus) {
            Some(existing) if existing.base != base => Err(ReferenceConflict {
                locus,
                recorded: existing.base,
                recorded_source: existing.source.clone(),
                found: base,
                found_source: source,
            }),
            Some(_) => Ok(RecordOutcome::Confirmed),
            None => {
                self.entries.insert(
                    locus,
                    ReferenceEntry {
                        locus,
                        base,
                        source,
                    },
                );
                Ok(RecordOutcome::Inserted)
            }
        }
    }

    #[must_use]
    pub fn get(&self, locus: Locus) -> Option<&ReferenceEntry> {
        self.entries.get(&locus)
    }

    /// `(locus, base)` pairs in ascending locus order
    pub fn sorted_bases(&self) -> impl Iterator<Item = (Locus, Base)> + '_ {
        self.entries.values().map(|e| (e.locus, e.base))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_wins() {
        let mut table = ReferenceMergeTable::new();
        assert_eq!(
            table.record(101, Base::T, Provenance::new("a.k28.out", 3)),
            Ok(RecordOutcome::Inserted)
        );
        assert_eq!(
            table.record(101, Base::T, Provenance::new("b.vcf", 12)),
            Ok(RecordOutcome::Confirmed)
        );

        let entry = table.get(101).unwrap();
        assert_eq!(entry.base, Base::T);
        assert_eq!(&*entry.source.file, "a.k28.out");
        assert_eq!(entry.source.line, 3);
    }

    #[test]
    fn test_conflict_reports_both_provenances() {
        let mut table = ReferenceMergeTable::new();
        table
            .record(50, Base::A, Provenance::new("s1.vcf", 7))
            .unwrap();
        let conflict = table
            .record(50, Base::G, Provenance::new("s2.snps", 9))
            .unwrap_err();

        assert_eq!(conflict.recorded, Base::A);
        assert_eq!(conflict.found, Base::G);
        let message = conflict.to_string();
        assert!(message.contains("s1.vcf line 7"));
        assert!(message.contains("s2.snps line 9"));

        // Conflicting observation never overwrites
        assert_eq!(table.get(50).unwrap().base, Base::A);
    }

    #[test]
    fn test_sorted_by_numeric_locus() {
        let mut table = ReferenceMergeTable::new();
        for (locus, base) in [(1000, Base::C), (9, Base::A), (100, Base::G)] {
            table
                .record(locus, base, Provenance::new("x", 1))
                .unwrap();
        }
        let loci: Vec<Locus> = table.sorted_bases().map(|(l, _)| l).collect();
        assert_eq!(loci, vec![9, 100, 1000]);
    }
}

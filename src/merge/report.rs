//! Per-strain statistics and the final run report.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::types::IndelKind;

/// Counters kept for one strain across the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrainCounters {
    pub snps: u64,
    pub insertions: u64,
    pub deletions: u64,
    pub exclusions: u64,
}

impl StrainCounters {
    #[must_use]
    pub fn total_indels(&self) -> u64 {
        self.insertions + self.deletions
    }

    /// Number of data lines that were classified for this strain
    #[must_use]
    pub fn classified(&self) -> u64 {
        self.snps + self.total_indels() + self.exclusions
    }
}

/// How the final report is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    /// One block of `Name: value` lines per strain
    Narrative,
    /// One tab-delimited row per strain, followed by exclusion summaries
    Tabular,
}

/// Accumulates strain counters and the exclusion breakdown.
///
/// Strains are reported in identifier order.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    counters: BTreeMap<String, StrainCounters>,
    exclusions: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Serialize)]
struct StrainReport<'a> {
    strain_id: &'a str,
    snps: u64,
    insertions: u64,
    deletions: u64,
    total_indels: u64,
    loci_excluded: u64,
    exclusion_breakdown: &'a BTreeMap<String, u64>,
}

impl ReportAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a strain has an entry, even if it never yields a record
    pub fn register_strain(&mut self, strain_id: &str) {
        self.entry(strain_id);
    }

    pub fn record_snp(&mut self, strain_id: &str) {
        self.entry(strain_id).snps += 1;
    }

    pub fn record_indel(&mut self, strain_id: &str, kind: IndelKind) {
        let counters = self.entry(strain_id);
        match kind {
            IndelKind::Insertion => counters.insertions += 1,
            IndelKind::Deletion => counters.deletions += 1,
        }
    }

    pub fn record_exclusion(&mut self, strain_id: &str, label: &str) {
        self.entry(strain_id).exclusions += 1;
        *self
            .exclusions
            .entry(strain_id.to_string())
            .or_default()
            .entry(label.to_string())
            .or_default() += 1;
    }

    fn entry(&mut self, strain_id: &str) -> &mut StrainCounters {
        self.counters.entry(strain_id.to_string()).or_default()
    }

    #[must_use]
    pub fn counters(&self, strain_id: &str) -> Option<&StrainCounters> {
        self.counters.get(strain_id)
    }

    /// Loci excluded per label for one strain
    #[must_use]
    pub fn exclusion_breakdown(&self, strain_id: &str) -> Option<&BTreeMap<String, u64>> {
        self.exclusions.get(strain_id)
    }

    pub fn strains(&self) -> impl Iterator<Item = (&str, &StrainCounters)> {
        self.counters.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// Sum of classified data lines over all strains
    #[must_use]
    pub fn total_classified(&self) -> u64 {
        self.counters.values().map(StrainCounters::classified).sum()
    }

    /// Render the report as text
    #[must_use]
    pub fn render(&self, style: ReportStyle) -> String {
        self.display(style).to_string()
    }

    /// Borrowing view that formats the report in `style`
    #[must_use]
    pub fn display(&self, style: ReportStyle) -> ReportDisplay<'_> {
        ReportDisplay {
            report: self,
            style,
        }
    }

    fn fmt_narrative(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (strain_id, c) in &self.counters {
            writeln!(f, "Strain: {strain_id}")?;
            writeln!(f, "SNPs: {}", c.snps)?;
            writeln!(f, "Insertions: {}", c.insertions)?;
            writeln!(f, "Deletions: {}", c.deletions)?;
            writeln!(f, "Total indels: {}", c.total_indels())?;
            writeln!(f, "Loci excluded: {}", c.exclusions)?;
            self.fmt_breakdown(f, strain_id)?;
            writeln!(f)?;
        }
        Ok(())
    }

    fn fmt_tabular(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strain ID\tSNPs\tInserts\tDeletes\tTotal Indels\tLoci Excluded")?;
        for (strain_id, c) in &self.counters {
            writeln!(
                f,
                "{strain_id}\t{}\t{}\t{}\t{}\t{}",
                c.snps,
                c.insertions,
                c.deletions,
                c.total_indels(),
                c.exclusions
            )?;
        }

        for strain_id in self.exclusions.keys() {
            writeln!(f, "\nLoci exclusion summary for {strain_id}:")?;
            self.fmt_breakdown(f, strain_id)?;
        }
        Ok(())
    }

    fn fmt_breakdown(&self, f: &mut fmt::Formatter<'_>, strain_id: &str) -> fmt::Result {
        if let Some(labels) = self.exclusions.get(strain_id) {
            for (label, count) in labels {
                writeln!(f, "* Loci excluded from {label}: {count}")?;
            }
        }
        Ok(())
    }

    /// Machine-readable form of the per-strain report
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let empty = BTreeMap::new();
        let strains: Vec<StrainReport<'_>> = self
            .counters
            .iter()
            .map(|(strain_id, c)| StrainReport {
                strain_id,
                snps: c.snps,
                insertions: c.insertions,
                deletions: c.deletions,
                total_indels: c.total_indels(),
                loci_excluded: c.exclusions,
                exclusion_breakdown: self.exclusions.get(strain_id).unwrap_or(&empty),
            })
            .collect();
        serde_json::json!({ "strains": strains })
    }
}

/// A report paired with the layout it is printed in
#[derive(Debug, Clone, Copy)]
pub struct ReportDisplay<'a> {
    report: &'a ReportAggregator,
    style: ReportStyle,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            ReportStyle::Narrative => self.report.fmt_narrative(f),
            ReportStyle::Tabular => self.report.fmt_tabular(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ReportAggregator {
        let mut report = ReportAggregator::new();
        report.register_strain("S2");
        report.record_snp("S1");
        report.record_snp("S1");
        report.record_indel("S1", IndelKind::Insertion);
        report.record_indel("S1", IndelKind::Deletion);
        report.record_indel("S1", IndelKind::Deletion);
        report.record_exclusion("S1", "phage");
        report.record_exclusion("S1", "phage");
        report.record_exclusion("S1", "operon");
        report
    }

    #[test]
    fn test_counters() {
        let report = sample_report();
        let s1 = report.counters("S1").unwrap();
        assert_eq!(s1.snps, 2);
        assert_eq!(s1.insertions, 1);
        assert_eq!(s1.deletions, 2);
        assert_eq!(s1.total_indels(), 3);
        assert_eq!(s1.exclusions, 3);

        assert_eq!(report.counters("S2"), Some(&StrainCounters::default()));
        assert_eq!(report.total_classified(), 8);

        let breakdown = report.exclusion_breakdown("S1").unwrap();
        assert_eq!(breakdown.get("phage"), Some(&2));
        assert_eq!(breakdown.get("operon"), Some(&1));
        assert!(report.exclusion_breakdown("S2").is_none());
    }

    #[test]
    fn test_render_narrative() {
        let text = sample_report().render(ReportStyle::Narrative);
        let expected = "Strain: S1\nSNPs: 2\nInsertions: 1\nDeletions: 2\nTotal indels: 3\n\
                        Loci excluded: 3\n* Loci excluded from operon: 1\n\
                        * Loci excluded from phage: 2\n\n\
                        Strain: S2\nSNPs: 0\nInsertions: 0\nDeletions: 0\nTotal indels: 0\n\
                        Loci excluded: 0\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_tabular() {
        let text = sample_report().render(ReportStyle::Tabular);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Strain ID\tSNPs\tInserts\tDeletes\tTotal Indels\tLoci Excluded"
        );
        assert_eq!(lines[1], "S1\t2\t1\t2\t3\t3");
        assert_eq!(lines[2], "S2\t0\t0\t0\t0\t0");
        assert!(text.contains("Loci exclusion summary for S1:"));
        assert!(!text.contains("Loci exclusion summary for S2:"));
    }

    #[test]
    fn test_display_matches_render() {
        let report = sample_report();
        assert_eq!(
            format!("{}", report.display(ReportStyle::Tabular)),
            report.render(ReportStyle::Tabular)
        );
    }

    #[test]
    fn test_json() {
        let json = sample_report().to_json();
        let strains = json["strains"].as_array().unwrap();
        assert_eq!(strains.len(), 2);
        assert_eq!(strains[0]["strain_id"], "S1");
        assert_eq!(strains[0]["total_indels"], 3);
        assert_eq!(strains[0]["exclusion_breakdown"]["phage"], 2);
        assert_eq!(strains[1]["loci_excluded"], 0);
    }
}

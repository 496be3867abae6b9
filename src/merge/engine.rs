use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::types::FileFormat;
use crate::core::variant::{IndelRecord, LineOutcome, Provenance, SnpObservation};
use crate::merge::exclusion::ExclusionIndex;
use crate::merge::reference::{RecordOutcome, ReferenceMergeTable};
use crate::merge::report::ReportAggregator;
use crate::merge::sinks::OutputSinks;
use crate::merge::MergeError;
use crate::parsing::detect::{detect_format, FormatError};
use crate::parsing::{open_input, parser_for, short_name, ParseError, ParserOptions};

/// Switches that change what a merge run writes
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Keep VCF records whose FILTER is not `PASS`
    pub ignore_quality: bool,
    /// Write `strain\t-1\t-` for a file that contributed no SNP
    pub placeholder_rows: bool,
    /// Append the `INS`/`DEL` column to indel rows
    pub indel_type_column: bool,
}

/// What one input file contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub source: String,
    pub format: FileFormat,
    pub strain_id: String,
    pub data_lines: u64,
    pub snps: u64,
    pub indels: u64,
    pub exclusions: u64,
}

/// Result of offering one path to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Processed(FileSummary),
    /// The file had no content and was left out of the run
    Skipped,
}

/// Totals of a completed run
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub reference_loci: usize,
    pub snp_rows: u64,
    pub report: ReportAggregator,
}

impl MergeSummary {
    /// Report plus run totals as one JSON document
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = self.report.to_json();
        if let Some(object) = value.as_object_mut() {
            object.insert("files_processed".into(), self.files_processed.into());
            object.insert("files_skipped".into(), self.files_skipped.into());
            object.insert("reference_loci".into(), self.reference_loci.into());
            object.insert("snp_rows".into(), self.snp_rows.into());
        }
        value
    }
}

/// Drives every input file through its parser and into the shared tables.
///
/// The engine owns the reference table, the report and the output sinks for
/// the whole run. Files are handled one at a time in the order they are
/// offered. A fatal error leaves everything already written in the sinks;
/// call [`MergeEngine::flush`] before giving up so partial output reaches disk.
pub struct MergeEngine<'a, W: Write> {
    options: MergeOptions,
    exclusions: &'a ExclusionIndex,
    reference: ReferenceMergeTable,
    report: ReportAggregator,
    sinks: OutputSinks<W>,
    files_processed: usize,
    files_skipped: usize,
}

impl<'a, W: Write> MergeEngine<'a, W> {
    pub fn new(options: MergeOptions, exclusions: &'a ExclusionIndex, sinks: OutputSinks<W>) -> Self {
        Self {
            options,
            exclusions,
            reference: ReferenceMergeTable::new(),
            report: ReportAggregator::new(),
            sinks,
            files_processed: 0,
            files_skipped: 0,
        }
    }

    /// Detect the grammar of `path`. Returns `None` (and counts the file as
    /// skipped) when the file is empty.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Format` for an unknown grammar or an unreadable file.
    pub fn sniff(&mut self, path: &Path) -> Result<Option<FileFormat>, MergeError> {
        match detect_format(path) {
            Ok(format) => Ok(Some(format)),
            Err(FormatError::Empty(name)) => {
                info!("Skipping empty input file {name}");
                self.files_skipped += 1;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sniff and process one file
    ///
    /// # Errors
    ///
    /// Returns the first fatal condition met in the file.
    pub fn process_path(&mut self, path: &Path) -> Result<FileOutcome, MergeError> {
        match self.sniff(path)? {
            Some(format) => self.process_file(path, format).map(FileOutcome::Processed),
            None => Ok(FileOutcome::Skipped),
        }
    }

    /// Process a file whose grammar is already known
    ///
    /// # Errors
    ///
    /// Returns the first fatal condition met in the file.
    pub fn process_file(&mut self, path: &Path, format: FileFormat) -> Result<FileSummary, MergeError> {
        let reader = open_input(path)?;
        self.process_lines(format, &short_name(path), reader)
    }

    /// Run one input through the parser for `format`. `source` names the
    /// input in diagnostics and provenance.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Parse` for grammar violations,
    /// `MergeError::Conflict` for a reference base mismatch, or
    /// `MergeError::Io` when reading input or writing output fails.
    pub fn process_lines<R: BufRead>(
        &mut self,
        format: FileFormat,
        source: &str,
        reader: R,
    ) -> Result<FileSummary, MergeError> {
        let options = ParserOptions {
            ignore_quality: self.options.ignore_quality,
        };
        let mut parser = parser_for(format, source, options);
        let file: Arc<str> = Arc::from(source);

        if let Some(strain) = parser.strain_id() {
            self.report.register_strain(strain);
        }

        let mut summary = FileSummary {
            source: source.to_string(),
            format,
            strain_id: String::new(),
            data_lines: 0,
            snps: 0,
            indels: 0,
            exclusions: 0,
        };
        let mut line_number = 0;

        for line in reader.lines() {
            line_number += 1;
            let line = line.map_err(|e| ParseError::from_read(e, source, line_number))?;

            let outcome = parser.classify(&line, line_number)?;
            if matches!(outcome, LineOutcome::Ignore) {
                continue;
            }
            if let LineOutcome::StrainHeader(strain) = &outcome {
                debug!("{source}: strain {strain}");
                self.report.register_strain(strain);
                continue;
            }

            let strain = parser
                .strain_id()
                .ok_or_else(|| ParseError::MissingStrainHeader {
                    file: source.to_string(),
                    line: line_number,
                })?
                .to_string();
            summary.data_lines += 1;

            match outcome {
                LineOutcome::Indel(call) => {
                    self.sinks.indel.write(&IndelRecord {
                        strain_id: strain.clone(),
                        format,
                        kind: call.kind,
                        raw_line: line.trim_end_matches('\r').to_string(),
                    })?;
                    self.report.record_indel(&strain, call.kind);
                    summary.indels += 1;
                }
                LineOutcome::Snp(call) => {
                    if let Some(label) = self.exclusions.lookup(call.locus) {
                        debug!("{source} line {line_number}: locus {} excluded by {label}", call.locus);
                        self.report.record_exclusion(&strain, label);
                        summary.exclusions += 1;
                        continue;
                    }

                    let recorded = self.reference.record(
                        call.locus,
                        call.reference_base,
                        Provenance::new(Arc::clone(&file), line_number),
                    )?;
                    if recorded == RecordOutcome::Confirmed {
                        debug!(
                            "{source} line {line_number}: reference base {} at locus {} already recorded",
                            call.reference_base, call.locus
                        );
                    }
                    self.sinks.snp.write(&SnpObservation {
                        strain_id: strain.clone(),
                        locus: call.locus,
                        sample_base: call.sample_base,
                    })?;
                    self.report.record_snp(&strain);
                    summary.snps += 1;
                }
                LineOutcome::StrainHeader(_) | LineOutcome::Ignore => {}
            }
        }

        let strain = parser
            .strain_id()
            .ok_or_else(|| ParseError::MissingStrainHeader {
                file: source.to_string(),
                line: line_number + 1,
            })?
            .to_string();

        if self.options.placeholder_rows && summary.snps == 0 {
            self.sinks.snp.write_placeholder(&strain)?;
        }

        info!(
            "{source}: {} SNPs, {} indels, {} excluded",
            summary.snps, summary.indels, summary.exclusions
        );
        summary.strain_id = strain;
        self.files_processed += 1;
        Ok(summary)
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceMergeTable {
        &self.reference
    }

    #[must_use]
    pub fn report(&self) -> &ReportAggregator {
        &self.report
    }

    /// Push everything written so far down to the underlying writers
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the first sink that fails to flush.
    pub fn flush(&mut self) -> Result<(), MergeError> {
        self.sinks.flush()?;
        Ok(())
    }

    /// Write the reference table, flush every sink and hand back the totals
    /// together with the sinks.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Io` if the reference table cannot be written.
    pub fn finish(mut self) -> Result<(MergeSummary, OutputSinks<W>), MergeError> {
        let reference_loci = self.sinks.reference.write_table(&self.reference)?;
        self.sinks.flush()?;

        let summary = MergeSummary {
            files_processed: self.files_processed,
            files_skipped: self.files_skipped,
            reference_loci,
            snp_rows: self.sinks.snp.rows(),
            report: self.report,
        };
        Ok((summary, self.sinks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Base, IndelKind};
    use crate::merge::exclusion::ExclusionRange;
    use std::io::Cursor;

    fn sinks() -> OutputSinks<Vec<u8>> {
        OutputSinks::new(Vec::new(), Vec::new(), Vec::new(), false)
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_vaal_snp_with_offset() {
        let exclusions = ExclusionIndex::new();
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        let input = "#S1/ref.fa\n0 100 left=AC sample=G ref=T right=GG\n";

        let summary = engine
            .process_lines(FileFormat::Vaal, "s1.k28.out", Cursor::new(input))
            .unwrap();
        assert_eq!(summary.strain_id, "S1");
        assert_eq!(summary.snps, 1);
        assert_eq!(engine.reference().get(101).unwrap().base, Base::T);

        let (merge, sinks) = engine.finish().unwrap();
        assert_eq!(merge.files_processed, 1);
        assert_eq!(merge.reference_loci, 1);
        assert_eq!(text(sinks.snp.into_inner()), "S1\t101\tG\n");
        assert_eq!(text(sinks.reference.into_inner()), "101\tT\n");
    }

    #[test]
    fn test_excluded_locus_never_reaches_outputs() {
        let mut exclusions = ExclusionIndex::new();
        exclusions.insert(ExclusionRange::new("phage", 40, 60));
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        let input = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                     chr1\t50\trs1\tA\tT\t99\tPASS\tINFO\n";

        engine
            .process_lines(FileFormat::Vcf, "s1.vcf", Cursor::new(input))
            .unwrap();
        assert!(engine.reference().is_empty());
        let counters = engine.report().counters("s1.vcf").unwrap();
        assert_eq!(counters.exclusions, 1);
        assert_eq!(counters.snps, 0);
        assert_eq!(
            engine.report().exclusion_breakdown("s1.vcf").unwrap().get("phage"),
            Some(&1)
        );

        let (_, sinks) = engine.finish().unwrap();
        assert!(sinks.snp.into_inner().is_empty());
        assert!(sinks.reference.into_inner().is_empty());
    }

    #[test]
    fn test_nucmer_indel_goes_to_indel_sink() {
        let exclusions = ExclusionIndex::new();
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        let input = "/data/ref.fa /data/S2.fa\nNUCMER\n\n[P1]\t[SUB]\t[SUB]\t[P2]\n200\t\tA\t10\n";

        let summary = engine
            .process_lines(FileFormat::Nucmer, "s2.snps", Cursor::new(input))
            .unwrap();
        assert_eq!(summary.indels, 1);
        let counters = engine.report().counters("S2.fa").unwrap();
        assert_eq!(counters.insertions, 1);
        assert_eq!(counters.total_indels(), 1);

        let (_, sinks) = engine.finish().unwrap();
        assert_eq!(text(sinks.indel.into_inner()), "S2.fa\tnuc\t200\t\tA\t10\n");
    }

    #[test]
    fn test_conflict_stops_before_snp_write() {
        let exclusions = ExclusionIndex::new();
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        engine
            .process_lines(
                FileFormat::Vaal,
                "a.k28.out",
                Cursor::new("#A/ref.fa\n0 99 left=A sample=G ref=T right=C\n"),
            )
            .unwrap();

        let err = engine
            .process_lines(
                FileFormat::Vaal,
                "b.k28.out",
                Cursor::new("#B/ref.fa\n0 99 left=A sample=G ref=C right=C\n"),
            )
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, MergeError::Conflict(_)));
        assert!(message.contains("a.k28.out line 2"));
        assert!(message.contains("b.k28.out line 2"));
        assert_eq!(engine.report().counters("B").unwrap().snps, 0);
    }

    #[test]
    fn test_placeholder_row_for_file_without_snps() {
        let exclusions = ExclusionIndex::new();
        let options = MergeOptions {
            placeholder_rows: true,
            ..MergeOptions::default()
        };
        let mut engine = MergeEngine::new(options, &exclusions, sinks());
        engine
            .process_lines(
                FileFormat::Vaal,
                "s3.k28.out",
                Cursor::new("#S3/ref.fa\n0 10 left=A sample= ref=T right=C\n"),
            )
            .unwrap();

        let counters = engine.report().counters("S3").unwrap();
        assert_eq!(counters.total_indels(), 1);
        let (merge, sinks) = engine.finish().unwrap();
        assert_eq!(merge.snp_rows, 0);
        assert_eq!(text(sinks.snp.into_inner()), "S3\t-1\t-\n");
    }

    #[test]
    fn test_invalid_utf8_names_file_and_line() {
        let exclusions = ExclusionIndex::new();
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        let input: &[u8] = b"#S1/ref.fa\n0 100 left=AC sample=G ref=T right=GG\n\xff\xfe\n";

        let err = engine
            .process_lines(FileFormat::Vaal, "bad.k28.out", Cursor::new(input))
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::Parse(ParseError::InvalidEncoding { line: 3, .. })
        ));
        let message = err.to_string();
        assert!(message.contains("bad.k28.out"), "{message}");
        assert!(message.contains("line 3"), "{message}");
    }

    #[test]
    fn test_missing_strain_header_at_end_of_file() {
        let exclusions = ExclusionIndex::new();
        let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks());
        let err = engine
            .process_lines(FileFormat::Nucmer, "bare.snps", Cursor::new("NUCMER\n"))
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::Parse(ParseError::MissingStrainHeader { .. })
        ));
    }

    #[test]
    fn test_counters_accumulate_across_files() {
        let exclusions = ExclusionIndex::new();
        let options = MergeOptions {
            indel_type_column: true,
            ..MergeOptions::default()
        };
        let sinks = OutputSinks::new(Vec::new(), Vec::new(), Vec::new(), options.indel_type_column);
        let mut engine = MergeEngine::new(options, &exclusions, sinks);
        for (name, line) in [
            ("s1a.k28.out", "0 10 left=A sample=G ref=T right=C"),
            ("s1b.k28.out", "0 20 left=A sample=GG ref=T right=C"),
        ] {
            engine
                .process_lines(
                    FileFormat::Vaal,
                    name,
                    Cursor::new(format!("#S1/ref.fa\n{line}\n")),
                )
                .unwrap();
        }

        let counters = engine.report().counters("S1").unwrap();
        assert_eq!(counters.snps, 1);
        assert_eq!(counters.insertions, 1);
        assert_eq!(engine.report().total_classified(), 2);

        let (merge, sinks) = engine.finish().unwrap();
        assert_eq!(merge.files_processed, 2);
        let indels = text(sinks.indel.into_inner());
        assert!(indels.ends_with(&format!("\t{}\n", IndelKind::Insertion.tag())));

        let json = merge.to_json();
        assert_eq!(json["files_processed"], 2);
        assert_eq!(json["reference_loci"], 1);
        assert_eq!(json["strains"][0]["strain_id"], "S1");
    }
}

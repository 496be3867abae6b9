//! Append-only writers for the merged outputs.
//!
//! | File | Columns |
//! |------|---------|
//! | `<batch>.snp` | strain, locus, base |
//! | `<batch>.ref` | locus, base (ascending locus) |
//! | `<batch>.indel` | strain, format tag, raw line, [INS/DEL] |

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::variant::{IndelRecord, SnpObservation};
use crate::merge::reference::ReferenceMergeTable;

/// Every file a merge run writes, derived from the output directory and batch id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub snp: PathBuf,
    pub reference: PathBuf,
    pub indel: PathBuf,
    pub log: PathBuf,
    pub debug_log: PathBuf,
    pub phenolink: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, batch_id: &str) -> Self {
        let file = |suffix: &str| dir.join(format!("{batch_id}.{suffix}"));
        Self {
            snp: file("snp"),
            reference: file("ref"),
            indel: file("indel"),
            log: file("log"),
            debug_log: file("debug.log"),
            phenolink: file("phenolink.txt"),
        }
    }
}

/// Writer for accepted SNP rows
pub struct SnpSink<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> SnpSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    pub fn write(&mut self, observation: &SnpObservation) -> io::Result<()> {
        writeln!(
            self.out,
            "{}\t{}\t{}",
            observation.strain_id, observation.locus, observation.sample_base
        )?;
        self.rows += 1;
        Ok(())
    }

    /// Marker row for a strain whose file contributed no SNP
    pub fn write_placeholder(&mut self, strain_id: &str) -> io::Result<()> {
        writeln!(self.out, "{strain_id}\t-1\t-")
    }

    /// Number of SNP rows written (placeholders excluded)
    #[must_use]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writer for indel rows, copied verbatim from the input
pub struct IndelSink<W: Write> {
    out: W,
    include_kind: bool,
}

impl<W: Write> IndelSink<W> {
    pub fn new(out: W, include_kind: bool) -> Self {
        Self { out, include_kind }
    }

    pub fn write(&mut self, record: &IndelRecord) -> io::Result<()> {
        write!(
            self.out,
            "{}\t{}\t{}",
            record.strain_id,
            record.format.tag(),
            record.raw_line
        )?;
        if self.include_kind {
            write!(self.out, "\t{}", record.kind.tag())?;
        }
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writer for the merged reference base table
pub struct RefSink<W: Write> {
    out: W,
}

impl<W: Write> RefSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write every locus of the table in ascending order. Returns the row count.
    pub fn write_table(&mut self, table: &ReferenceMergeTable) -> io::Result<usize> {
        let mut rows = 0;
        for (locus, base) in table.sorted_bases() {
            writeln!(self.out, "{locus}\t{base}")?;
            rows += 1;
        }
        Ok(rows)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// The three data sinks of a merge run, opened once for the whole run
pub struct OutputSinks<W: Write> {
    pub snp: SnpSink<W>,
    pub indel: IndelSink<W>,
    pub reference: RefSink<W>,
}

impl<W: Write> OutputSinks<W> {
    pub fn new(snp: W, indel: W, reference: W, indel_kind_column: bool) -> Self {
        Self {
            snp: SnpSink::new(snp),
            indel: IndelSink::new(indel, indel_kind_column),
            reference: RefSink::new(reference),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.snp.flush()?;
        self.indel.flush()?;
        self.reference.flush()
    }
}

impl OutputSinks<BufWriter<File>> {
    /// Create (truncating) the SNP, indel and reference files
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any of the files cannot be created.
    pub fn create(paths: &OutputPaths, indel_kind_column: bool) -> io::Result<Self> {
        let open = |path: &Path| File::create(path).map(BufWriter::new);
        Ok(Self::new(
            open(&paths.snp)?,
            open(&paths.indel)?,
            open(&paths.reference)?,
            indel_kind_column,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Base, FileFormat, IndelKind};
    use crate::core::variant::Provenance;

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::new(Path::new("/out"), "run7");
        assert_eq!(paths.snp, PathBuf::from("/out/run7.snp"));
        assert_eq!(paths.reference, PathBuf::from("/out/run7.ref"));
        assert_eq!(paths.indel, PathBuf::from("/out/run7.indel"));
        assert_eq!(paths.log, PathBuf::from("/out/run7.log"));
        assert_eq!(paths.debug_log, PathBuf::from("/out/run7.debug.log"));
        assert_eq!(paths.phenolink, PathBuf::from("/out/run7.phenolink.txt"));
    }

    #[test]
    fn test_snp_sink() {
        let mut sink = SnpSink::new(Vec::new());
        sink.write(&SnpObservation {
            strain_id: "S1".to_string(),
            locus: 101,
            sample_base: Base::G,
        })
        .unwrap();
        sink.write_placeholder("S2").unwrap();
        assert_eq!(sink.rows(), 1);
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "S1\t101\tG\nS2\t-1\t-\n"
        );
    }

    #[test]
    fn test_indel_sink_with_and_without_kind() {
        let record = IndelRecord {
            strain_id: "S2.fa".to_string(),
            format: FileFormat::Nucmer,
            kind: IndelKind::Insertion,
            raw_line: "200\t\tA\t10".to_string(),
        };

        let mut plain = IndelSink::new(Vec::new(), false);
        plain.write(&record).unwrap();
        assert_eq!(
            String::from_utf8(plain.into_inner()).unwrap(),
            "S2.fa\tnuc\t200\t\tA\t10\n"
        );

        let mut typed = IndelSink::new(Vec::new(), true);
        typed.write(&record).unwrap();
        assert_eq!(
            String::from_utf8(typed.into_inner()).unwrap(),
            "S2.fa\tnuc\t200\t\tA\t10\tINS\n"
        );
    }

    #[test]
    fn test_ref_sink_sorted() {
        let mut table = ReferenceMergeTable::new();
        table.record(300, Base::C, Provenance::new("a", 1)).unwrap();
        table.record(20, Base::A, Provenance::new("a", 2)).unwrap();

        let mut sink = RefSink::new(Vec::new());
        assert_eq!(sink.write_table(&table).unwrap(), 2);
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "20\tA\n300\tC\n"
        );
    }
}

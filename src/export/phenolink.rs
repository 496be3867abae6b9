//! Built-in PhenoLink presence matrix export.
//!
//! Each SNP becomes a column named `<refbase>_<locus>_<snpbase>`; each strain
//! becomes a row with `1` where it carries that SNP and `0` otherwise.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::export::{ExportError, Exporter};
use crate::parsing::is_unsigned;

/// Strain by SNP-name presence table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhenoLinkTable {
    columns: BTreeSet<String>,
    strains: BTreeMap<String, BTreeSet<String>>,
}

impl PhenoLinkTable {
    /// Build the table from a reference-base reader and a SNP reader
    ///
    /// # Errors
    ///
    /// Returns the I/O error if either reader fails.
    pub fn from_readers<R1: BufRead, R2: BufRead>(
        reference: R1,
        snps: R2,
    ) -> std::io::Result<Self> {
        let mut ref_bases: BTreeMap<String, String> = BTreeMap::new();
        for (i, line) in reference.lines().enumerate() {
            let line = line?;
            match parse_ref_line(&line) {
                Some((locus, base)) => {
                    ref_bases.insert(locus.to_string(), base.to_string());
                }
                None => warn!("Unrecognized reference line {}: {line}", i + 1),
            }
        }
        debug!("Read {} reference bases", ref_bases.len());

        let mut table = Self::default();
        for (i, line) in snps.lines().enumerate() {
            let line = line?;
            let line_num = i + 1;

            if let Some(strain) = parse_placeholder_line(&line) {
                table.strains.entry(strain.to_string()).or_default();
                continue;
            }
            let Some((strain, locus, base)) = parse_snp_line(&line) else {
                warn!("Unrecognized SNP line {line_num}: {line}");
                continue;
            };
            let Some(ref_base) = ref_bases.get(locus) else {
                warn!("SNP line {line_num} names locus {locus} missing from the reference file");
                continue;
            };

            let name = format!("{ref_base}_{locus}_{base}");
            table.columns.insert(name.clone());
            table
                .strains
                .entry(strain.to_string())
                .or_default()
                .insert(name);
        }
        Ok(table)
    }

    /// Column names in output order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Strain identifiers in output order
    pub fn strains(&self) -> impl Iterator<Item = &str> {
        self.strains.keys().map(String::as_str)
    }

    /// Write the matrix as tab-delimited text
    ///
    /// # Errors
    ///
    /// Returns the I/O error if writing fails.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "StrainID")?;
        for column in &self.columns {
            write!(out, "\t{column}")?;
        }
        writeln!(out)?;

        for (strain, present) in &self.strains {
            write!(out, "{strain}")?;
            for column in &self.columns {
                let flag = u8::from(present.contains(column));
                write!(out, "\t{flag}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }
}

fn parse_ref_line(line: &str) -> Option<(&str, &str)> {
    let (locus, base) = line.trim_end_matches('\r').split_once('\t')?;
    (is_unsigned(locus) && base.chars().count() == 1).then_some((locus, base))
}

fn parse_snp_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.trim_end_matches('\r').rsplitn(3, '\t');
    let base = fields.next()?;
    let locus = fields.next()?;
    let strain = fields.next()?;
    let valid = !strain.is_empty() && is_unsigned(locus) && base.chars().count() == 1;
    valid.then_some((strain, locus, base))
}

fn parse_placeholder_line(line: &str) -> Option<&str> {
    line.trim_end_matches('\r')
        .strip_suffix("\t-1\t-")
        .filter(|strain| !strain.is_empty())
}

/// Exporter writing the PhenoLink matrix without leaving the process
#[derive(Debug, Clone, Copy, Default)]
pub struct PhenoLinkExporter;

impl Exporter for PhenoLinkExporter {
    fn name(&self) -> &str {
        "PhenoLink"
    }

    fn export(&self, reference: &Path, snps: &Path, out: &Path) -> Result<(), ExportError> {
        let table = PhenoLinkTable::from_readers(
            BufReader::new(File::open(reference)?),
            BufReader::new(File::open(snps)?),
        )?;
        table.write_to(BufWriter::new(File::create(out)?))?;
        Ok(())
    }
}

//! Parser for VCF variant records.
//!
//! VCF carries no strain line of its own, so the strain identifier is the
//! input file name. Meta lines (`##...`) are skipped until the `#CHROM` column
//! header; every following line must be a tab-delimited record with at least
//! the eight fixed columns:
//!
//! ```text
//! #CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO
//! ```
//!
//! `POS` is taken as the locus without offset. Unless quality filtering is
//! disabled, records whose FILTER is not `PASS` are skipped before any other
//! classification.

use crate::core::types::{Base, FileFormat, IndelRule, Locus};
use crate::core::variant::{IndelCall, LineOutcome, SnpCall};
use crate::parsing::{chomp, is_base_run, is_unsigned, ParseError, ParseState, VariantParser};

/// Column header line that opens the data region
const COLUMN_HEADER: &str = "#CHROM";

/// Characters accepted in REF/ALT (commas separate multiple ALT alleles)
const ALLELE_CHARS: &[u8] = b"ACGTN,";

/// Number of fixed columns required on a record line
const MIN_COLUMNS: usize = 8;

const POS: usize = 1;
const REF: usize = 3;
const ALT: usize = 4;
const FILTER: usize = 6;

pub struct VcfParser {
    source: String,
    state: ParseState,
    strain_id: String,
    ignore_quality: bool,
}

impl VcfParser {
    /// Create a parser for the file named `source`; the name doubles as the strain id
    pub fn new(source: impl Into<String>, ignore_quality: bool) -> Self {
        let source = source.into();
        Self {
            strain_id: source.clone(),
            source,
            // The strain is bound by the file name, so only the data marker is outstanding
            state: ParseState::AwaitingDataStart,
            ignore_quality,
        }
    }

    fn malformed(&self, line: &str, line_number: usize) -> ParseError {
        ParseError::MalformedLine {
            format: FileFormat::Vcf,
            file: self.source.clone(),
            line: line_number,
            text: line.to_string(),
        }
    }

    fn parse_record(&self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            return Err(self.malformed(line, line_number));
        }

        let (reference, alternate, filter) = (fields[REF], fields[ALT], fields[FILTER]);
        let well_formed = !fields[0].is_empty()
            && is_unsigned(fields[POS])
            && !reference.is_empty()
            && !alternate.is_empty()
            && is_base_run(reference, ALLELE_CHARS)
            && is_base_run(alternate, ALLELE_CHARS)
            && !filter.is_empty();
        if !well_formed {
            return Err(self.malformed(line, line_number));
        }

        let locus: Locus = fields[POS]
            .parse()
            .map_err(|_| self.malformed(line, line_number))?;

        if !self.ignore_quality && filter != "PASS" {
            return Ok(LineOutcome::Ignore);
        }

        if let Some(kind) = IndelRule::Standard.classify(alternate, reference) {
            return Ok(LineOutcome::Indel(IndelCall { locus, kind }));
        }

        match (Base::from_field(alternate), Base::from_field(reference)) {
            (Some(sample_base), Some(reference_base)) => Ok(LineOutcome::Snp(SnpCall {
                locus,
                sample_base,
                reference_base,
            })),
            _ => Err(self.malformed(line, line_number)),
        }
    }
}

impl VariantParser for VcfParser {
    fn format(&self) -> FileFormat {
        FileFormat::Vcf
    }

    fn strain_id(&self) -> Option<&str> {
        Some(&self.strain_id)
    }

    fn classify(&mut self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let line = chomp(line);
        if line.trim().is_empty() {
            return Ok(LineOutcome::Ignore);
        }

        match self.state {
            ParseState::InData if line.starts_with(COLUMN_HEADER) => {
                Err(ParseError::DuplicateStrainHeader {
                    file: self.source.clone(),
                    line: line_number,
                    bound: self.strain_id.clone(),
                    text: line.to_string(),
                })
            }
            ParseState::InData => self.parse_record(line, line_number),
            _ => {
                if line.starts_with(COLUMN_HEADER) {
                    self.state = ParseState::InData;
                }
                Ok(LineOutcome::Ignore)
            }
        }
    }
}

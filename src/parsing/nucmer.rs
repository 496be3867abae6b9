//! Parser for NUCMER `show-snps` reports.
//!
//! Layout:
//!
//! ```text
//! /path/to/reference.fa /path/to/query.fa
//! NUCMER
//!
//! [P1]	[SUB]	[SUB]	[P2]	[BUFF]	[DIST]	[LEN R]	[LEN Q]	[FRM]	[TAGS]
//! 200	A	G	199	...
//! ```
//!
//! The strain identifier is the file name of the query path on the header
//! line. Data starts after the `[P1]` column header. Only `[P1]` (locus) and
//! the two `[SUB]` columns (reference base, then sample base) are used; the
//! locus is taken as reported. A `.` in a `[SUB]` column marks an absent base.

use std::path::Path;

use crate::core::types::{Base, FileFormat, IndelRule, Locus};
use crate::core::variant::{IndelCall, LineOutcome, SnpCall};
use crate::parsing::{chomp, is_base_run, is_unsigned, ParseError, ParseState, VariantParser};

/// Literal line written by `show-snps` naming the alignment tool
pub const MARKER: &str = "NUCMER";

/// Column header that opens the data region
const DATA_HEADER: &str = "[P1]";

const SUB_BASES: &[u8] = b"ACGT";

/// True for the literal `NUCMER` marker line
#[must_use]
pub fn is_marker_line(line: &str) -> bool {
    line.trim() == MARKER
}

/// Extract the strain identifier from a `<reference_path> <query_path>` header line
#[must_use]
pub fn strain_from_header(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    let (Some(reference), Some(query), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return None;
    };
    if reference.starts_with('[') || query.starts_with('[') {
        return None;
    }
    Path::new(query)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
}

pub struct NucmerParser {
    source: String,
    state: ParseState,
    strain_id: Option<String>,
}

impl NucmerParser {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: ParseState::AwaitingHeader,
            strain_id: None,
        }
    }

    fn malformed(&self, line: &str, line_number: usize) -> ParseError {
        ParseError::MalformedLine {
            format: FileFormat::Nucmer,
            file: self.source.clone(),
            line: line_number,
            text: line.to_string(),
        }
    }

    fn parse_data(&self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 || !is_unsigned(fields[0]) || !is_unsigned(fields[3]) {
            return Err(self.malformed(line, line_number));
        }

        let reference = absent_marker_to_empty(fields[1]);
        let sample = absent_marker_to_empty(fields[2]);
        if !is_base_run(reference, SUB_BASES) || !is_base_run(sample, SUB_BASES) {
            return Err(self.malformed(line, line_number));
        }

        let locus: Locus = fields[0]
            .parse()
            .map_err(|_| self.malformed(line, line_number))?;

        if let Some(kind) = IndelRule::Standard.classify(sample, reference) {
            return Ok(LineOutcome::Indel(IndelCall { locus, kind }));
        }

        match (Base::from_field(sample), Base::from_field(reference)) {
            (Some(sample_base), Some(reference_base)) => Ok(LineOutcome::Snp(SnpCall {
                locus,
                sample_base,
                reference_base,
            })),
            _ => Err(self.malformed(line, line_number)),
        }
    }
}

fn absent_marker_to_empty(field: &str) -> &str {
    if field == "." {
        ""
    } else {
        field
    }
}

impl VariantParser for NucmerParser {
    fn format(&self) -> FileFormat {
        FileFormat::Nucmer
    }

    fn strain_id(&self) -> Option<&str> {
        self.strain_id.as_deref()
    }

    fn classify(&mut self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let line = chomp(line);
        if line.trim().is_empty() {
            return Ok(LineOutcome::Ignore);
        }

        match self.state {
            ParseState::InData => self.parse_data(line, line_number),
            _ if is_marker_line(line) => Ok(LineOutcome::Ignore),
            ParseState::AwaitingHeader => {
                if line.starts_with(DATA_HEADER) {
                    return Err(ParseError::MissingStrainHeader {
                        file: self.source.clone(),
                        line: line_number,
                    });
                }
                match strain_from_header(line) {
                    Some(strain) => {
                        self.strain_id = Some(strain.clone());
                        self.state = ParseState::AwaitingDataStart;
                        Ok(LineOutcome::StrainHeader(strain))
                    }
                    None => Ok(LineOutcome::Ignore),
                }
            }
            ParseState::AwaitingDataStart => {
                if line.starts_with(DATA_HEADER) {
                    self.state = ParseState::InData;
                    return Ok(LineOutcome::Ignore);
                }
                if strain_from_header(line).is_some() {
                    return Err(ParseError::DuplicateStrainHeader {
                        file: self.source.clone(),
                        line: line_number,
                        bound: self.strain_id.clone().unwrap_or_default(),
                        text: line.to_string(),
                    });
                }
                Ok(LineOutcome::Ignore)
            }
        }
    }
}

//! Parsers for the upstream variant reports and the exclusion range file.
//!
//! This module provides:
//!
//! - **Format sniffing**: [`detect::sniff`] classifies an input by its leading lines
//! - **VAAL k28 reports**: [`vaal::VaalParser`]
//! - **NUCMER `show-snps` reports**: [`nucmer::NucmerParser`]
//! - **VCF files**: [`vcf::VcfParser`]
//! - **Exclusion range files**: [`exclusion::parse_exclusion_file`]
//!
//! Each variant parser is a line-level state machine moving through
//! [`ParseState::AwaitingHeader`], [`ParseState::AwaitingDataStart`] and
//! [`ParseState::InData`]. Parsers never touch the merge tables; they only turn
//! a line into a [`LineOutcome`] and leave the bookkeeping to the caller.
//!
//! ## Example
//!
//! ```rust
//! use prephix::core::types::FileFormat;
//! use prephix::core::variant::LineOutcome;
//! use prephix::parsing::{parser_for, ParserOptions};
//!
//! let mut parser = parser_for(FileFormat::Vaal, "s1.k28.out", ParserOptions::default());
//! parser.classify("#S1/ref.fa", 1).unwrap();
//! let outcome = parser.classify("0 100 left=AC sample=G ref=T right=GG", 2).unwrap();
//! assert!(matches!(outcome, LineOutcome::Snp(call) if call.locus == 101));
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::core::types::FileFormat;
use crate::core::variant::LineOutcome;

pub mod detect;
pub mod exclusion;
pub mod nucmer;
pub mod vaal;
pub mod vcf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized {format} line in {file} at line {line}: {text}")]
    MalformedLine {
        format: FileFormat,
        file: String,
        line: usize,
        text: String,
    },

    #[error("Second strain header in {file} at line {line} (strain already bound to '{bound}'): {text}")]
    DuplicateStrainHeader {
        file: String,
        line: usize,
        bound: String,
        text: String,
    },

    #[error("No strain header found in {file} before line {line}")]
    MissingStrainHeader { file: String, line: usize },

    #[error("Invalid UTF-8 in {file} at line {line}")]
    InvalidEncoding { file: String, line: usize },
}

impl ParseError {
    /// Attach `file` and `line` to an error raised while reading that line.
    /// Decoding failures become `InvalidEncoding`; anything else stays `Io`.
    #[must_use]
    pub fn from_read(err: std::io::Error, file: &str, line: usize) -> Self {
        if err.kind() == std::io::ErrorKind::InvalidData {
            Self::InvalidEncoding {
                file: file.to_string(),
                line,
            }
        } else {
            Self::Io(err)
        }
    }
}

/// Position of a parser within its input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// No strain identifier has been bound yet
    AwaitingHeader,
    /// Strain is known, waiting for the marker that opens the data region
    AwaitingDataStart,
    /// Every remaining non-blank line must be a data line
    InData,
}

/// Options that change how records are classified
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Keep VCF records whose FILTER column is not `PASS`
    pub ignore_quality: bool,
}

/// A line-level state machine over one report grammar
pub trait VariantParser {
    /// Grammar handled by this parser
    fn format(&self) -> FileFormat;

    /// Strain bound so far, if any
    fn strain_id(&self) -> Option<&str>;

    /// Classify one line. `line_number` is 1-based and only used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MalformedLine` for a data line that does not fit the
    /// grammar, `ParseError::DuplicateStrainHeader` when a second strain header
    /// appears, or `ParseError::MissingStrainHeader` when data precedes the header.
    fn classify(&mut self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError>;
}

/// Build the parser for a sniffed format. `source` is the short file name used
/// in diagnostics (and as the strain identifier for VCF input).
#[must_use]
pub fn parser_for(
    format: FileFormat,
    source: &str,
    options: ParserOptions,
) -> Box<dyn VariantParser> {
    match format {
        FileFormat::Vaal => Box::new(vaal::VaalParser::new(source)),
        FileFormat::Nucmer => Box::new(nucmer::NucmerParser::new(source)),
        FileFormat::Vcf => Box::new(vcf::VcfParser::new(source, options.ignore_quality)),
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open an input file for line reading, decompressing gzip/bgzip transparently
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened.
pub fn open_input(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Short name of an input path, used in diagnostics and provenance
#[must_use]
pub fn short_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

/// True if every character is one of `allowed` (an empty run is accepted)
pub(crate) fn is_base_run(field: &str, allowed: &[u8]) -> bool {
    field.bytes().all(|b| allowed.contains(&b))
}

/// True for a non-empty run of ASCII digits
pub(crate) fn is_unsigned(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// Strip a trailing line terminator (`\n` or `\r\n`)
pub(crate) fn chomp(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

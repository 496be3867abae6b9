//! Content-based detection of the input report grammar.

use std::io::BufRead;
use std::path::Path;

use crate::core::types::FileFormat;
use crate::parsing::{nucmer, open_input, short_name, vaal, ParseError};

/// Errors that can occur during format detection
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Unknown input file type: {0} is not a VAAL k28, NUCMER or VCF report")]
    UnknownFormat(String),
    #[error("Input file {0} is empty")]
    Empty(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Read(#[from] ParseError),
}

/// Marker line that opens every VCF file
const VCF_MARKER: &str = "##fileformat=VCF";

/// Result of scanning an input's leading lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    Format(FileFormat),
    Unknown,
    Empty,
}

/// Scan lines from the start until one identifies a grammar. `source` names
/// the input in diagnostics.
///
/// Only the read cursor is affected.
///
/// # Errors
///
/// Returns `ParseError::InvalidEncoding` for a line that is not UTF-8, or
/// `ParseError::Io` if a line cannot be read.
pub fn sniff<R: BufRead>(reader: R, source: &str) -> Result<Sniffed, ParseError> {
    let mut saw_content = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ParseError::from_read(e, source, i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        saw_content = true;

        if let Some(format) = recognize(&line) {
            return Ok(Sniffed::Format(format));
        }
    }

    Ok(if saw_content {
        Sniffed::Unknown
    } else {
        Sniffed::Empty
    })
}

/// Classify a single line against the three recognition patterns
fn recognize(line: &str) -> Option<FileFormat> {
    // VCF meta lines can contain '/', so test VCF before the k28 header form
    if line.starts_with(VCF_MARKER) {
        Some(FileFormat::Vcf)
    } else if nucmer::is_marker_line(line) {
        Some(FileFormat::Nucmer)
    } else if vaal::strain_from_header(line).is_some() {
        Some(FileFormat::Vaal)
    } else {
        None
    }
}

/// Detect the grammar of the file at `path`.
///
/// # Errors
///
/// Returns `FormatError::Empty` for a file with no non-blank line,
/// `FormatError::UnknownFormat` when no line matches a known grammar,
/// `FormatError::Read` naming the line that could not be read, or
/// `FormatError::Io` if the file cannot be opened.
pub fn detect_format(path: &Path) -> Result<FileFormat, FormatError> {
    let reader = open_input(path)?;
    match sniff(reader, &short_name(path))? {
        Sniffed::Format(format) => Ok(format),
        Sniffed::Unknown => Err(FormatError::UnknownFormat(path.display().to_string())),
        Sniffed::Empty => Err(FormatError::Empty(path.display().to_string())),
    }
}

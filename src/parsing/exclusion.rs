//! Parser for exclusion range files.
//!
//! One range per line, `label,start,end`, bounds inclusive:
//!
//! ```text
//! phage_1,1200,5400
//! rRNA_operon,88000,93500
//! ```
//!
//! Blank lines are skipped. Any other line that does not fit the pattern, a
//! reused label, or a start after its end is a load error.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::core::types::Locus;
use crate::merge::exclusion::{ExclusionIndex, ExclusionRange};
use crate::parsing::is_unsigned;

#[derive(Error, Debug)]
pub enum ExclusionError {
    #[error("Failed to read exclusion file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Badly formatted exclusion line {line}: {text}")]
    Malformed { line: usize, text: String },

    #[error("Duplicate exclusion label '{label}' on line {line}")]
    DuplicateLabel { label: String, line: usize },

    #[error("Exclusion '{label}' on line {line} starts after it ends ({start} > {end})")]
    InvertedRange {
        label: String,
        line: usize,
        start: Locus,
        end: Locus,
    },
}

/// Load an exclusion range file
///
/// # Errors
///
/// Returns `ExclusionError::Io` if the file cannot be read, or any error
/// reported by [`parse_exclusion_text`].
pub fn parse_exclusion_file(path: &Path) -> Result<ExclusionIndex, ExclusionError> {
    let content = std::fs::read_to_string(path)?;
    parse_exclusion_text(&content)
}

/// Parse exclusion ranges from text
///
/// # Errors
///
/// Returns `ExclusionError::Malformed` for a line that is not `label,start,end`,
/// `ExclusionError::DuplicateLabel` for a reused label, or
/// `ExclusionError::InvertedRange` when start exceeds end.
pub fn parse_exclusion_text(text: &str) -> Result<ExclusionIndex, ExclusionError> {
    let mut index = ExclusionIndex::new();

    for (i, line) in text.lines().enumerate() {
        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let range = parse_range(line).ok_or_else(|| ExclusionError::Malformed {
            line: line_num,
            text: line.to_string(),
        })?;

        if range.start > range.end {
            return Err(ExclusionError::InvertedRange {
                label: range.label,
                line: line_num,
                start: range.start,
                end: range.end,
            });
        }

        debug!(
            "Adding exclusion: {},{},{}",
            range.label, range.start, range.end
        );
        let label = range.label.clone();
        if !index.insert(range) {
            return Err(ExclusionError::DuplicateLabel {
                label,
                line: line_num,
            });
        }
    }

    Ok(index)
}

fn parse_range(line: &str) -> Option<ExclusionRange> {
    let fields: Vec<&str> = line.split(',').collect();
    let &[label, start, end] = fields.as_slice() else {
        return None;
    };
    if label.is_empty() || !is_unsigned(start) || !is_unsigned(end) {
        return None;
    }
    Some(ExclusionRange::new(label, start.parse().ok()?, end.parse().ok()?))
}

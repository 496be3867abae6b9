use std::sync::Arc;

use serde::Serialize;

use crate::core::types::{Base, FileFormat, IndelKind, Locus};

/// A single-base difference read from one data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnpCall {
    pub locus: Locus,
    pub sample_base: Base,
    pub reference_base: Base,
}

/// An insertion or deletion read from one data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndelCall {
    pub locus: Locus,
    pub kind: IndelKind,
}

/// What a parser made of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line bound the strain identifier for this file
    StrainHeader(String),
    /// A data line describing a SNP
    Snp(SnpCall),
    /// A data line describing an indel
    Indel(IndelCall),
    /// Anything that carries no variant: comments, headers, filtered records
    Ignore,
}

/// Where a value was first read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub file: Arc<str>,
    pub line: usize,
}

impl Provenance {
    pub fn new(file: impl Into<Arc<str>>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}", self.file, self.line)
    }
}

/// The reference base recorded for a locus, with the line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub locus: Locus,
    pub base: Base,
    pub source: Provenance,
}

/// One row of the merged SNP loci table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnpObservation {
    pub strain_id: String,
    pub locus: Locus,
    pub sample_base: Base,
}

/// One row of the indel table. The raw line is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndelRecord {
    pub strain_id: String,
    pub format: FileFormat,
    pub kind: IndelKind,
    pub raw_line: String,
}

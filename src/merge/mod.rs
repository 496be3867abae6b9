//! The merge engine and the tables it fills.
//!
//! For every data line a parser classifies, the engine decides where it goes:
//!
//! 1. **Indel**: copied verbatim to the indel sink and tallied for the strain
//! 2. **Excluded SNP**: tallied against the exclusion label, then dropped
//! 3. **SNP**: reference base checked against [`reference::ReferenceMergeTable`],
//!    then written to the SNP sink and tallied
//!
//! A reference base mismatch at a shared locus aborts the run.

pub mod engine;
pub mod exclusion;
pub mod reference;
pub mod report;
pub mod sinks;

use thiserror::Error;

use crate::parsing::detect::FormatError;
use crate::parsing::ParseError;
use reference::ReferenceConflict;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Conflict(#[from] ReferenceConflict),
}

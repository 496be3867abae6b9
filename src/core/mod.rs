//! Core data types shared by the parsers and the merge engine.
//!
//! - [`Base`], [`Locus`]: the values stored in the SNP and reference tables
//! - [`FileFormat`]: the three supported report grammars and their indel-file tags
//! - [`IndelKind`], [`IndelRule`]: insertion/deletion labeling
//! - [`LineOutcome`]: what a parser produced for a single input line
//! - [`SnpObservation`], [`IndelRecord`], [`ReferenceEntry`]: rows of the outputs
//!
//! ## Locus offsets
//!
//! | Format | Locus written |
//! |--------|---------------|
//! | VAAL k28 | reported locus + 1 |
//! | NUCMER | `[P1]` as reported |
//! | VCF | `POS` as reported |
//!
//! [`Base`]: types::Base
//! [`Locus`]: types::Locus
//! [`FileFormat`]: types::FileFormat
//! [`IndelKind`]: types::IndelKind
//! [`IndelRule`]: types::IndelRule
//! [`LineOutcome`]: variant::LineOutcome
//! [`SnpObservation`]: variant::SnpObservation
//! [`IndelRecord`]: variant::IndelRecord
//! [`ReferenceEntry`]: variant::ReferenceEntry

pub mod types;
pub mod variant;

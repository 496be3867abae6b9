//! # prephix
//!
//! A library for merging SNP calls of several strains into one dataset.
//!
//! Comparative genomics pipelines often call each strain against a shared
//! reference with a different tool. The reports differ in grammar, in locus
//! offsets and in how they mark insertions and deletions.
//!
//! `prephix` reads VAAL k28, NUCMER `show-snps` and VCF reports and produces
//! one SNP loci table, one reference base table and one indel table.
//!
//! ## Features
//!
//! - **Format sniffing**: Inputs are recognized by content, gzip is handled transparently
//! - **Reference consistency**: A locus seen with two different reference bases aborts the run
//! - **Loci exclusion**: Labeled ranges (phages, repeats) are dropped and counted per strain
//! - **Indel routing**: Indels are copied verbatim to their own table, tagged with the source format
//! - **Per-strain report**: SNP, insertion, deletion and exclusion counts
//! - **PhenoLink export**: Strain by SNP presence matrix
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use prephix::{ExclusionIndex, FileFormat, MergeEngine, MergeOptions, OutputSinks};
//!
//! let exclusions = ExclusionIndex::new();
//! let sinks = OutputSinks::new(Vec::new(), Vec::new(), Vec::new(), false);
//! let mut engine = MergeEngine::new(MergeOptions::default(), &exclusions, sinks);
//!
//! let report = "#S1/ref.fa\n0 100 left=AC sample=G ref=T right=GG\n";
//! engine
//!     .process_lines(FileFormat::Vaal, "s1.k28.out", Cursor::new(report))
//!     .unwrap();
//!
//! let (summary, sinks) = engine.finish().unwrap();
//! assert_eq!(summary.reference_loci, 1);
//! assert_eq!(String::from_utf8(sinks.snp.into_inner()).unwrap(), "S1\t101\tG\n");
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Bases, formats, indel rules and per-line variant types
//! - [`parsing`]: Format sniffing, the three report parsers and the exclusion file parser
//! - [`merge`]: Merge engine, reference table, exclusion index, report and output sinks
//! - [`export`]: PhenoLink export, built-in or through an external tool
//! - [`cli`]: Command-line interface implementation
//! - [`utils`]: Batch id validation and the mirrored run console

pub mod cli;
pub mod core;
pub mod export;
pub mod merge;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::types::*;
pub use crate::merge::engine::{FileOutcome, FileSummary, MergeEngine, MergeOptions, MergeSummary};
pub use crate::merge::exclusion::{ExclusionIndex, ExclusionRange};
pub use crate::merge::reference::{ReferenceConflict, ReferenceMergeTable};
pub use crate::merge::report::{ReportAggregator, ReportStyle, StrainCounters};
pub use crate::merge::sinks::{OutputPaths, OutputSinks};
pub use crate::merge::MergeError;

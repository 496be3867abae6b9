//! Command-line interface for prephix.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **merge**: Merge VAAL k28, NUCMER and VCF reports into SNP, reference and indel tables
//! - **export**: Build a PhenoLink matrix from existing merge outputs
//!
//! ## Usage
//!
//! ```text
//! # Merge three strains, dropping loci in known phage regions
//! prephix merge --batch-id run7 s1.k28.out s2.snps s3.vcf --exclude phage.csv
//!
//! # Tab-delimited report, INS/DEL column in the indel file
//! prephix --format tsv merge --batch-id run7 --indel-type *.vcf.gz
//!
//! # Re-export a PhenoLink matrix
//! prephix export --ref run7.ref --snp run7.snp --out run7.phenolink.txt
//! ```

use clap::{Parser, Subcommand};

pub mod export;
pub mod merge;

#[derive(Parser)]
#[command(name = "prephix")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Merge SNP calls from VAAL k28, NUCMER and VCF reports")]
#[command(
    long_about = "prephix merges the variant reports of several strains against one reference genome.\n\nEach input is auto-detected as VAAL k28, NUCMER or VCF and produces:\n- A SNP loci table (<batch>.snp)\n- A merged reference base table (<batch>.ref), checked for conflicting bases\n- A tagged indel table (<batch>.indel)\n- A run log (<batch>.log) with per-strain statistics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge variant reports into SNP, reference and indel tables
    Merge(merge::MergeArgs),

    /// Build a PhenoLink matrix from a reference file and a SNP file
    Export(export::ExportArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

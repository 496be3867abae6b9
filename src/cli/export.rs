use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::export::{Exporter, PhenoLinkExporter};

#[derive(Args)]
pub struct ExportArgs {
    /// Reference base file written by `prephix merge` (<batch>.ref)
    #[arg(long = "ref")]
    pub reference: PathBuf,

    /// SNP loci file written by `prephix merge` (<batch>.snp)
    #[arg(long)]
    pub snp: PathBuf,

    /// PhenoLink output file
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: ExportArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        eprintln!(
            "Exporting {} + {} to {}",
            args.reference.display(),
            args.snp.display(),
            args.out.display()
        );
    }

    PhenoLinkExporter
        .export(&args.reference, &args.snp, &args.out)
        .with_context(|| format!("PhenoLink export to {} failed", args.out.display()))?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "output": args.out.display().to_string() });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("Final output file is {}", args.out.display());
        }
    }
    Ok(())
}

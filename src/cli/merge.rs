use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::export::{Exporter, ExternalExporter, PhenoLinkExporter};
use crate::merge::engine::{MergeEngine, MergeOptions, MergeSummary};
use crate::merge::exclusion::ExclusionIndex;
use crate::merge::report::ReportStyle;
use crate::merge::sinks::{OutputPaths, OutputSinks};
use crate::merge::MergeError;
use crate::parsing::exclusion::parse_exclusion_file;
use crate::parsing::short_name;
use crate::utils::console::Console;
use crate::utils::validation::validate_batch_id;

#[derive(Args)]
pub struct MergeArgs {
    /// Batch identifier; names every output file (<batch>.snp, <batch>.ref, ...)
    #[arg(long)]
    pub batch_id: String,

    /// Input reports (VAAL k28, NUCMER or VCF, optionally .gz)
    /// Files are processed in the order given
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Exclusion range file with one `label,start,end` per line
    #[arg(long)]
    pub exclude: Option<PathBuf>,

    /// Keep VCF records whose FILTER is not PASS
    #[arg(long)]
    pub ignore_quality: bool,

    /// Directory receiving all outputs
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Do not print run messages (the log file is still written)
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a debug trace to <batch>.debug.log
    #[arg(long)]
    pub debug: bool,

    /// Append an INS/DEL column to the indel file
    #[arg(long)]
    pub indel_type: bool,

    /// Write `<strain>\t-1\t-` to the SNP file for inputs without any SNP
    #[arg(long)]
    pub placeholder_rows: bool,

    /// Write a PhenoLink matrix (<batch>.phenolink.txt) after merging
    #[arg(long)]
    pub export_phenolink: bool,

    /// External program producing the PhenoLink export
    /// (called as `<tool> --ref <ref> --snp <snp> --out <out>`)
    #[arg(long, requires = "export_phenolink")]
    pub export_tool: Option<PathBuf>,
}

impl MergeArgs {
    #[must_use]
    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            ignore_quality: self.ignore_quality,
            placeholder_rows: self.placeholder_rows,
            indel_type_column: self.indel_type,
        }
    }

    /// Output paths for this run, after validating the batch id
    ///
    /// # Errors
    ///
    /// Returns an error if the batch id is not a usable file name prefix.
    pub fn output_paths(&self) -> anyhow::Result<OutputPaths> {
        let batch_id = validate_batch_id(&self.batch_id)?;
        Ok(OutputPaths::new(&self.output_dir, batch_id))
    }

    /// Path of the debug trace, if `--debug` was given
    ///
    /// # Errors
    ///
    /// Returns an error if the batch id is invalid.
    pub fn debug_log_path(&self) -> anyhow::Result<Option<PathBuf>> {
        if !self.debug {
            return Ok(None);
        }
        Ok(Some(self.output_paths()?.debug_log))
    }
}

pub fn run(args: MergeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let paths = args.output_paths()?;

    for input in &args.inputs {
        if !input.is_file() {
            bail!("File does not exist: {}", input.display());
        }
    }

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Cannot create output directory {}",
            args.output_dir.display()
        )
    })?;

    // JSON goes to stdout on its own; run messages only reach the log
    let json = matches!(format, OutputFormat::Json);
    let mut console = Console::create(&paths.log, args.quiet || json)
        .with_context(|| format!("Cannot create log file {}", paths.log.display()))?;

    announce(&args, &mut console)?;

    let summary = match merge_inputs(&args, &paths, verbose, &mut console) {
        Ok(summary) => summary,
        Err(e) => {
            console.say(&format!("*** ERROR: {e:#}"))?;
            if matches!(
                e.downcast_ref::<MergeError>(),
                Some(MergeError::Conflict(_))
            ) {
                console.say("*** Are you sure all input files are from the same reference?")?;
            }
            console.say("Failed.")?;
            console.flush()?;
            return Err(e);
        }
    };

    if args.export_phenolink {
        export_phenolink(&args, &paths, &mut console)?;
    }

    console.say(&format!("Merged SNP loci file is {}", paths.snp.display()))?;
    console.say(&format!(
        "Merged reference base file from this run is {}",
        paths.reference.display()
    ))?;
    console.say(&format!(
        "Merged indel file from this run is {}",
        paths.indel.display()
    ))?;

    match format {
        OutputFormat::Text => print_report(&summary, ReportStyle::Narrative, &mut console)?,
        OutputFormat::Tsv => print_report(&summary, ReportStyle::Tabular, &mut console)?,
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&summary.to_json())?;
            if !args.quiet {
                println!("{text}");
            }
            console.log_only(&text)?;
        }
    }

    console.say("\nDone.")?;
    console.flush()?;
    Ok(())
}

/// Echo the run settings
fn announce<W: Write>(args: &MergeArgs, console: &mut Console<W>) -> anyhow::Result<()> {
    console.say(&format!(
        "\nPrephix (Pre-Phrecon Input fiXer) v{}\n",
        env!("CARGO_PKG_VERSION")
    ))?;
    console.say(&format!("Batch id is {}", args.batch_id))?;
    if args.ignore_quality {
        console.say(
            "Will process all lines, ignoring quality value (only applicable for VCF input files).",
        )?;
    } else {
        console.say("Will process only lines passing quality value (for VCF input files).")?;
    }
    if args.export_phenolink {
        console.say("Will export a PhenoLink file.")?;
    }
    console.say(&format!("Found {} files to process.", args.inputs.len()))?;
    Ok(())
}

fn load_exclusions<W: Write>(
    args: &MergeArgs,
    console: &mut Console<W>,
) -> anyhow::Result<ExclusionIndex> {
    let Some(path) = &args.exclude else {
        return Ok(ExclusionIndex::new());
    };

    console.say(&format!("Exclusion file is {}", path.display()))?;
    let index = parse_exclusion_file(path)
        .with_context(|| format!("Cannot load exclusions from {}", path.display()))?;
    console.say(&format!("{} exclusions read.", index.len()))?;
    for range in index.iter() {
        debug!("Excluding {} from {} to {}", range.label, range.start, range.end);
    }
    Ok(index)
}

fn merge_inputs<W: Write>(
    args: &MergeArgs,
    paths: &OutputPaths,
    verbose: bool,
    console: &mut Console<W>,
) -> anyhow::Result<MergeSummary> {
    // Exclusions are loaded before any output or input file is touched
    let exclusions = load_exclusions(args, console)?;

    console.say("\n***")?;
    console.say(
        "*** REMINDER: This program assumes that all input files refer to the same reference sequence.",
    )?;
    console.say(
        "***           Ref file will be generated from consolidated snp loci information of ALL input files.",
    )?;
    console.say("***")?;

    let sinks = OutputSinks::create(paths, args.indel_type)
        .context("Cannot create output files")?;
    let mut engine = MergeEngine::new(args.options(), &exclusions, sinks);

    for input in &args.inputs {
        if let Err(e) = merge_one(&mut engine, input, verbose, console) {
            if let Err(flush_err) = engine.flush() {
                warn!("Failed to flush partial outputs: {flush_err}");
            }
            return Err(e);
        }
    }

    console.say("Merging and generating reference file from input file data....")?;
    let (summary, _) = engine.finish()?;

    console.say("")?;
    console.say(&format!("{} files were processed.", summary.files_processed))?;
    if summary.files_skipped > 0 {
        console.say(&format!(
            "WARNING --> {} files were SKIPPED (empty?).",
            summary.files_skipped
        ))?;
    }
    console.say(&format!(
        "{} reference loci written.",
        summary.reference_loci
    ))?;
    console.say("Done.")?;
    Ok(summary)
}

fn merge_one<S: Write, L: Write>(
    engine: &mut MergeEngine<'_, S>,
    path: &Path,
    verbose: bool,
    console: &mut Console<L>,
) -> anyhow::Result<()> {
    let name = short_name(path);
    let Some(format) = engine.sniff(path)? else {
        console.say(&format!("*** WARNING: Skipping empty file: {name}"))?;
        return Ok(());
    };

    console.say(&format!(
        "Processing {} file {name}...",
        format.display_name()
    ))?;
    let file = engine.process_file(path, format)?;
    debug!("{name}: {} data lines", file.data_lines);

    if verbose {
        console.say(&format!(
            "  strain {}: {} SNPs, {} indels, {} excluded",
            file.strain_id, file.snps, file.indels, file.exclusions
        ))?;
    }
    Ok(())
}

/// Run the PhenoLink export; failures are reported but never fail the run
fn export_phenolink<W: Write>(
    args: &MergeArgs,
    paths: &OutputPaths,
    console: &mut Console<W>,
) -> anyhow::Result<()> {
    console.say("Exporting PhenoLink file...")?;

    let exporter: Box<dyn Exporter> = match &args.export_tool {
        Some(tool) => Box::new(ExternalExporter::new(tool)),
        None => Box::new(PhenoLinkExporter),
    };
    debug!("Using {} exporter", exporter.name());

    match exporter.export(&paths.reference, &paths.snp, &paths.phenolink) {
        Ok(()) => console.say(&format!(
            "PhenoLink file is {}",
            paths.phenolink.display()
        ))?,
        Err(e) => {
            warn!("PhenoLink export failed: {e}");
            console.say(&format!("***\n*** ERROR: {e}\n***"))?;
            console.say("Unable to generate PhenoLink file!")?;
        }
    }
    Ok(())
}

fn print_report<W: Write>(
    summary: &MergeSummary,
    style: ReportStyle,
    console: &mut Console<W>,
) -> anyhow::Result<()> {
    console.say("\n=== Final Report ===\n")?;
    console.say(summary.report.render(style).trim_end())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: MergeArgs,
    }

    #[test]
    fn test_args_to_options_and_paths() {
        let cli = TestCli::parse_from([
            "prephix",
            "--batch-id",
            "run7",
            "--output-dir",
            "/tmp/out",
            "--indel-type",
            "--ignore-quality",
            "a.vcf",
            "b.snps",
        ]);
        let options = cli.args.options();
        assert!(options.ignore_quality);
        assert!(options.indel_type_column);
        assert!(!options.placeholder_rows);

        let paths = cli.args.output_paths().unwrap();
        assert_eq!(paths.snp, PathBuf::from("/tmp/out/run7.snp"));
        assert_eq!(cli.args.debug_log_path().unwrap(), None);
        assert_eq!(cli.args.inputs.len(), 2);
    }

    #[test]
    fn test_invalid_batch_id() {
        let cli = TestCli::parse_from(["prephix", "--batch-id", "../up", "a.vcf"]);
        assert!(cli.args.output_paths().is_err());
    }

    #[test]
    fn test_export_tool_requires_export_flag() {
        let result = TestCli::try_parse_from([
            "prephix",
            "--batch-id",
            "b",
            "--export-tool",
            "/bin/true",
            "a.vcf",
        ]);
        assert!(result.is_err());
    }
}

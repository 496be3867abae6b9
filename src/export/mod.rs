//! Export of merged outputs into third-party formats.
//!
//! An [`Exporter`] gets the paths of a finished reference-base file and SNP
//! file and writes one new file. Exporters run after the merge and their
//! failures never invalidate the merge outputs.

pub mod phenolink;

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

pub use phenolink::PhenoLinkExporter;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot find export tool {0}")]
    ToolNotFound(PathBuf),

    #[error("Export tool {0} is not executable")]
    NotExecutable(PathBuf),

    #[error("Export tool {program} failed with {status}: {stderr}")]
    ToolFailed {
        program: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Turns a reference-base file and a SNP file into an export file
pub trait Exporter {
    /// Name used in console messages
    fn name(&self) -> &str;

    /// Write the export for `reference` + `snps` into `out`
    ///
    /// # Errors
    ///
    /// Returns an `ExportError` if the inputs cannot be read or the export
    /// cannot be produced.
    fn export(&self, reference: &Path, snps: &Path, out: &Path) -> Result<(), ExportError>;
}

/// Runs an external program as `<program> --ref <ref> --snp <snp> --out <out>`
#[derive(Debug, Clone)]
pub struct ExternalExporter {
    program: PathBuf,
}

impl ExternalExporter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn check_program(&self) -> Result<(), ExportError> {
        let metadata = std::fs::metadata(&self.program)
            .map_err(|_| ExportError::ToolNotFound(self.program.clone()))?;
        if !metadata.is_file() {
            return Err(ExportError::ToolNotFound(self.program.clone()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(ExportError::NotExecutable(self.program.clone()));
            }
        }
        Ok(())
    }
}

impl Exporter for ExternalExporter {
    fn name(&self) -> &str {
        "external"
    }

    fn export(&self, reference: &Path, snps: &Path, out: &Path) -> Result<(), ExportError> {
        self.check_program()?;

        let mut command = Command::new(&self.program);
        command
            .arg("--ref")
            .arg(reference)
            .arg("--snp")
            .arg(snps)
            .arg("--out")
            .arg(out);
        debug!("Running export tool: {command:?}");

        let output = command.output()?;
        if !output.status.success() {
            return Err(ExportError::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ExternalExporter::new(dir.path().join("no-such-tool"));
        let err = exporter
            .export(Path::new("a.ref"), Path::new("a.snp"), Path::new("a.out"))
            .unwrap_err();
        assert!(matches!(err, ExportError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("export.sh");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();

        let err = ExternalExporter::new(&tool)
            .export(Path::new("a.ref"), Path::new("a.snp"), Path::new("a.out"))
            .unwrap_err();
        assert!(matches!(err, ExportError::NotExecutable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_tool_with_paths() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("export.sh");
        std::fs::write(&tool, "#!/bin/sh\necho \"$@\" > \"$6\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = dir.path().join("b.txt");
        ExternalExporter::new(&tool)
            .export(Path::new("b.ref"), Path::new("b.snp"), &out)
            .unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("--ref b.ref --snp b.snp --out"));
    }
}

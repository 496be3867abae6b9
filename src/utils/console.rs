//! User-facing run messages, mirrored to the run log.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Prints run messages to stdout and copies every one of them to a log.
///
/// Quiet mode only silences stdout; the log always receives the message.
pub struct Console<W: Write> {
    log: W,
    quiet: bool,
}

impl<W: Write> Console<W> {
    pub fn new(log: W, quiet: bool) -> Self {
        Self { log, quiet }
    }

    /// Print one message (which may span lines)
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the log cannot be written.
    pub fn say(&mut self, message: &str) -> io::Result<()> {
        if !self.quiet {
            println!("{message}");
        }
        writeln!(self.log, "{message}")
    }

    /// Write to the log only
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the log cannot be written.
    pub fn log_only(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.log, "{message}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.log.flush()
    }

    pub fn into_inner(self) -> W {
        self.log
    }
}

impl Console<BufWriter<File>> {
    /// Create (truncating) the run log and stamp it with the local time
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the log cannot be created.
    pub fn create(path: &Path, quiet: bool) -> io::Result<Self> {
        let mut console = Self::new(BufWriter::new(File::create(path)?), quiet);
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        console.log_only(&format!("Run started {stamp}"))?;
        Ok(console)
    }
}

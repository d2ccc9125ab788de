// src/runlog/writer.rs

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// How a delegated run ended, as recorded in the end marker.
///
/// The delegate's failure never changes cronwrap's own exit status; this is
/// the only place the outcome is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The delegate exited on its own with this code.
    Exited(i32),
    /// The delegate died to a signal without an exit code (unix).
    Killed,
    /// cronwrap was asked to terminate and killed the delegate.
    Interrupted,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Exited(code) => write!(f, "exit {code}"),
            RunOutcome::Killed => write!(f, "killed by signal"),
            RunOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Identifier for one wrapped run: compact timestamp plus pid.
///
/// Greppable from both markers of a run record.
pub fn new_run_id() -> String {
    format!(
        "{}-{}",
        Local::now().format("%Y%m%d%H%M%S"),
        std::process::id()
    )
}

/// Append-only handle on the run log.
///
/// Every line written through [`RunLog::write_line`] carries a
/// `[YYYY-MM-DD HH:MM:SS]` prefix. The delegate's raw output goes through
/// duplicated handles from [`RunLog::output_handle`] and is appended
/// uninterpreted between the start and end markers.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Open (creating parent directories and the file as needed) in append
    /// mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {:?}", parent))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening run log {:?}", path))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one timestamp-prefixed line.
    pub fn write_line(&mut self, message: &str) -> Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.file
            .write_all(format!("[{stamp}] {message}\n").as_bytes())
            .with_context(|| format!("appending to run log {:?}", self.path))
    }

    pub fn start_marker(&mut self, run_id: &str) -> Result<()> {
        self.write_line(&format!("===== run {run_id} started ====="))
    }

    pub fn end_marker(&mut self, run_id: &str, outcome: RunOutcome) -> Result<()> {
        self.write_line(&format!("===== run {run_id} finished ({outcome}) ====="))
    }

    /// Duplicate the underlying append-mode handle, e.g. for a child
    /// process's stdout or stderr.
    pub fn output_handle(&self) -> Result<File> {
        self.file
            .try_clone()
            .with_context(|| format!("duplicating run log handle {:?}", self.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

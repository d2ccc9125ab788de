// src/guard/mod.rs

//! Run guard: at-most-one concurrent invocation, enforced by a lock-marker
//! file.
//!
//! Acquisition is a single create-exclusive open, so two invocations racing
//! at the same instant cannot both win. The guard removes the marker when it
//! leaves scope; a process killed with an uncatchable signal leaves a stale
//! marker behind, and no staleness timeout or pid-liveness takeover is
//! attempted (the pid written into the marker is for operators only).

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Outcome of a guard acquisition attempt.
///
/// `AlreadyRunning` is a normal skip condition, not an error; only real I/O
/// failures surface as `Err`.
#[derive(Debug)]
pub enum Acquire {
    Acquired(RunGuard),
    AlreadyRunning,
}

/// Scoped ownership of the lock marker.
///
/// Dropping the guard removes the marker. The happy path should prefer
/// [`RunGuard::release`], which reports removal failures instead of
/// swallowing them.
#[derive(Debug)]
pub struct RunGuard {
    path: PathBuf,
    released: bool,
}

impl RunGuard {
    /// Try to create the lock marker at `path`.
    ///
    /// Missing parent directories are created first.
    pub fn acquire(path: &Path) -> Result<Acquire> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating lock directory {:?}", parent))?;
            }
        }

        // O_CREAT | O_EXCL: existence check and creation are one operation.
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                writeln!(file, "pid {} started {}", std::process::id(), stamp)
                    .with_context(|| format!("writing lock marker at {:?}", path))?;
                debug!(path = ?path, "lock marker created");
                Ok(Acquire::Acquired(RunGuard {
                    path: path.to_path_buf(),
                    released: false,
                }))
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(Acquire::AlreadyRunning),
            Err(err) => {
                Err(err).with_context(|| format!("creating lock marker at {:?}", path))
            }
        }
    }

    /// Remove the marker now, surfacing any I/O failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path)
            .with_context(|| format!("removing lock marker at {:?}", self.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunGuard {
    // Backstop for early returns, errors, and caught signals. Drop cannot
    // propagate, so a removal failure here is only logged.
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %err, "failed to remove lock marker");
        }
    }
}

// src/runlog/rotate.rs

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

/// Rotate the log at `path` aside if it is strictly larger than
/// `threshold_bytes`.
///
/// - No file at `path`: no-op, returns `Ok(None)`.
/// - Size at or below the threshold: no-op, the file is left byte-for-byte
///   untouched.
/// - Size strictly above the threshold: the file is renamed to
///   `<path>.<YYYYMMDDHHMMSS>` and the archive path is returned. A rename is
///   atomic on one filesystem; the content is never copied.
pub fn rotate_if_needed(path: &Path, threshold_bytes: u64) -> Result<Option<PathBuf>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("inspecting log file {:?}", path));
        }
    };

    if meta.len() <= threshold_bytes {
        return Ok(None);
    }

    let archive = archive_path(path, Local::now());
    fs::rename(path, &archive)
        .with_context(|| format!("renaming {:?} to {:?}", path, archive))?;

    info!(
        from = ?path,
        to = ?archive,
        size = meta.len(),
        threshold = threshold_bytes,
        "rotated run log"
    );

    Ok(Some(archive))
}

/// Archive name for a log rotated at `at`: the live path with a
/// `.YYYYMMDDHHMMSS` suffix appended.
fn archive_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", at.format("%Y%m%d%H%M%S")));
    PathBuf::from(name)
}

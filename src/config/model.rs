// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// root = "/home/bot/sheet-sync"
/// venv = ".venv"
/// command = "python main.py"
/// log_file = "logs/cronwrap.log"
/// lock_file = "cronwrap.lock"
/// max_log_bytes = 10485760
///
/// [env]
/// GOOGLE_APPLICATION_CREDENTIALS = "/home/bot/sheet-bot-key.json"
/// SHEET_ID = "1pwBp7c2ou5007RgMRc..."
/// TAB_NAME = "Directory"
/// ```
///
/// All fields are optional and have reasonable defaults; the file itself is
/// optional too (see `loader::load_or_default`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Working root for the delegated program. All relative paths below
    /// resolve under it. Defaults to the current working directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Virtualenv directory to activate for the delegated program.
    ///
    /// If `None`, the delegated program runs with the inherited environment.
    #[serde(default)]
    pub venv: Option<PathBuf>,

    /// The delegated command line, run through the platform shell.
    #[serde(default = "default_command")]
    pub command: String,

    /// The append-only run log the delegated program's output lands in.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// The lock-marker path guarding against overlapping runs.
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,

    /// Rotate the run log once it is strictly larger than this many bytes.
    #[serde(default = "default_max_log_bytes")]
    pub max_log_bytes: u64,

    /// Environment variables set verbatim on the delegated program.
    ///
    /// cronwrap never reads or validates these values.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_command() -> String {
    "python main.py".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/cronwrap.log")
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("cronwrap.lock")
}

/// 10 MiB.
fn default_max_log_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            root: None,
            venv: None,
            command: default_command(),
            log_file: default_log_file(),
            lock_file: default_lock_file(),
            max_log_bytes: default_max_log_bytes(),
            env: BTreeMap::new(),
        }
    }
}

/// Validated configuration with all paths resolved under the root.
///
/// Construct via `TryFrom<RawConfigFile>` (see `validate`); the raw form
/// never leaves the loader.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub venv: Option<PathBuf>,
    pub command: String,
    pub log_file: PathBuf,
    pub lock_file: PathBuf,
    pub max_log_bytes: u64,
    pub env: BTreeMap<String, String>,
}

impl Config {
    /// Internal constructor used after validation.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let root = raw
            .root
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let venv = raw.venv.map(|p| join_under(&root, p));
        let log_file = join_under(&root, raw.log_file);
        let lock_file = join_under(&root, raw.lock_file);
        Self {
            root,
            venv,
            command: raw.command,
            log_file,
            lock_file,
            max_log_bytes: raw.max_log_bytes,
            env: raw.env,
        }
    }
}

/// Resolve `path` under `root`; absolute paths are kept as-is
/// (`Path::join` already does the right thing).
fn join_under(root: &Path, path: PathBuf) -> PathBuf {
    root.join(path)
}

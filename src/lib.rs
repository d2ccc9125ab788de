// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod guard;
pub mod logging;
pub mod runlog;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{Config, loader};
use crate::guard::{Acquire, RunGuard};
use crate::runlog::{RunLog, new_run_id, rotate_if_needed};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the run guard (lock marker)
/// - log rotation
/// - the delegated program run, bracketed by start/end markers
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, explicit) = match args.config {
        Some(path) => (PathBuf::from(path), true),
        None => (loader::default_config_path(), false),
    };
    let cfg = loader::load_or_default(&config_path, explicit)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    run_once(&cfg).await
}

/// Sequence one guarded run.
///
/// Guard acquisition gates everything: when another run holds the lock this
/// appends a timestamped notice to the run log and returns Ok; an overlap
/// is a normal skip, not an error. The delegate's own exit status is
/// recorded in the end marker and does not affect the returned result.
pub async fn run_once(cfg: &Config) -> Result<()> {
    let guard = match RunGuard::acquire(&cfg.lock_file)? {
        Acquire::Acquired(guard) => guard,
        Acquire::AlreadyRunning => {
            let mut log = RunLog::open(&cfg.log_file)?;
            log.write_line("another run in progress, skipping")?;
            info!(lock = ?cfg.lock_file, "another run in progress, skipping");
            return Ok(());
        }
    };

    rotate_if_needed(&cfg.log_file, cfg.max_log_bytes)?;

    let mut log = RunLog::open(&cfg.log_file)?;
    let run_id = new_run_id();
    log.start_marker(&run_id)?;

    let outcome = exec::run_delegate(cfg, &log).await?;

    log.end_marker(&run_id, outcome)?;
    guard.release()?;

    Ok(())
}

/// Simple dry-run output: print the resolved plan without locking or
/// executing anything.
fn print_dry_run(cfg: &Config) {
    println!("cronwrap dry-run");
    println!("  root = {}", cfg.root.display());
    match cfg.venv {
        Some(ref venv) => println!("  venv = {}", venv.display()),
        None => println!("  venv = (none)"),
    }
    println!("  command = {}", cfg.command);
    println!("  log_file = {}", cfg.log_file.display());
    println!("  lock_file = {}", cfg.lock_file.display());
    println!("  max_log_bytes = {}", cfg.max_log_bytes);

    if !cfg.env.is_empty() {
        println!("  env:");
        for (name, value) in cfg.env.iter() {
            println!("    {name} = {value}");
        }
    }
}

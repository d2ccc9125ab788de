// src/exec/delegate.rs

//! Delegated program runner.
//!
//! cronwrap's one external call: run the configured command with the
//! configured root as working directory, the virtualenv activated, the
//! `[env]` table applied, and both output streams appended to the run log.
//! The output is captured, never interpreted.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::runlog::{RunLog, RunOutcome};

/// Build the delegated command from config.
///
/// The command line goes through the platform shell: `sh -c` on unix,
/// `cmd /C` on windows.
pub fn build_command(cfg: &Config) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&cfg.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&cfg.command);
        c
    };

    cmd.current_dir(&cfg.root);

    if let Some(ref venv) = cfg.venv {
        apply_venv(&mut cmd, venv);
    }

    // Passthrough is verbatim; cronwrap never looks at these values.
    for (name, value) in cfg.env.iter() {
        cmd.env(name, value);
    }

    cmd
}

/// Virtualenv activation without sourcing the shell `activate` script:
/// `VIRTUAL_ENV` set, the venv's bin directory in front of `PATH`,
/// `PYTHONHOME` cleared.
fn apply_venv(cmd: &mut Command, venv: &Path) {
    let bin = venv.join(if cfg!(windows) { "Scripts" } else { "bin" });

    let path_value = match std::env::var_os("PATH") {
        Some(existing) => {
            let mut parts = vec![bin.clone()];
            parts.extend(std::env::split_paths(&existing));
            std::env::join_paths(parts).unwrap_or_else(|_| bin.clone().into_os_string())
        }
        None => bin.clone().into_os_string(),
    };

    cmd.env("VIRTUAL_ENV", venv);
    cmd.env("PATH", path_value);
    cmd.env_remove("PYTHONHOME");
}

/// Spawn the delegated program and wait for it to finish.
///
/// stdout and stderr both append to the run log. If a termination signal
/// arrives first (ctrl-c anywhere, SIGTERM on unix), the child is killed and
/// the outcome is `Interrupted`; the caller's scope still releases the run
/// guard on that path.
pub async fn run_delegate(cfg: &Config, log: &RunLog) -> Result<RunOutcome> {
    let mut cmd = build_command(cfg);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(log.output_handle()?))
        .stderr(Stdio::from(log.output_handle()?))
        .kill_on_drop(true);

    info!(command = %cfg.command, root = ?cfg.root, "starting delegated program");

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning delegated command '{}'", cfg.command))?;

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for delegated command '{}'", cfg.command))?;

            // No exit code means the child died to a signal (unix).
            let outcome = match status.code() {
                Some(code) => RunOutcome::Exited(code),
                None => RunOutcome::Killed,
            };

            info!(outcome = %outcome, "delegated program finished");
            Ok(outcome)
        }

        _ = wait_for_termination() => {
            warn!("termination signal received; killing delegated program");
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill delegated program");
            }
            Ok(RunOutcome::Interrupted)
        }
    }
}

/// Resolves when the wrapper itself is asked to stop.
///
/// If a listener cannot be installed, the future stays pending; it must
/// never resolve without an actual signal.
async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if res.is_err() {
                            std::future::pending::<()>().await;
                        }
                    }
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

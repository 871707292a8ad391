//! External command execution and dependency installation.
//!
//! This module provides the [`CommandRunner`] abstraction the pipelines use
//! for every child process, and the npm installation steps that follow a
//! synchronization run.

use crate::error::{BinderyError, Result};
use camino::Utf8Path;
use std::process::{Command, ExitStatus, Stdio};

/// Abstraction for running external commands with inherited stdio.
///
/// Child processes stream their output straight to the controlling
/// terminal; callers only observe the exit status.
pub trait CommandRunner {
    /// Run `cmd` with `args` in `dir` and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::SpawnFailed`] if the process cannot be
    /// started.
    fn run(&self, cmd: &str, args: &[&str], dir: &Utf8Path) -> Result<ExitStatus>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, cmd: &str, args: &[&str], dir: &Utf8Path) -> Result<ExitStatus> {
        Command::new(cmd)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| BinderyError::SpawnFailed {
                command: cmd.to_owned(),
                source,
            })
    }
}

/// Install the plugin's dependencies into `dest`.
///
/// Runs a production-only install first; when an override spec is
/// configured, installs that single dependency into the same tree
/// afterwards.
///
/// # Errors
///
/// Returns [`BinderyError::InstallFailed`] if either npm invocation exits
/// non-zero, or [`BinderyError::SpawnFailed`] if npm cannot be started.
pub fn install_dependencies(
    runner: &dyn CommandRunner,
    dest: &Utf8Path,
    override_spec: Option<&str>,
) -> Result<()> {
    run_npm(runner, dest, &["install", "--production"])?;
    if let Some(spec) = override_spec {
        run_npm(runner, dest, &["install", spec])?;
    }
    Ok(())
}

/// Run one npm invocation in `dest`, surfacing a non-zero exit.
fn run_npm(runner: &dyn CommandRunner, dest: &Utf8Path, args: &[&str]) -> Result<()> {
    log::debug!("running npm {} in {dest}", args.join(" "));
    let status = runner.run("npm", args, dest)?;
    if !status.success() {
        return Err(BinderyError::InstallFailed {
            command: format!("npm {}", args.join(" ")),
            status: status.to_string(),
        });
    }
    Ok(())
}

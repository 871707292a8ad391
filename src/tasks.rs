//! Named task pipelines.
//!
//! This module composes the synchronizer, installer, stamper, packager, and
//! proxies into the named tasks the CLI exposes. Each task is an explicit
//! ordered sequence of steps returning `Result`; there is no retry state
//! and no rollback on partial failure.

use crate::archive::{self, ArchiveName, ChromiumBundling};
use crate::config::{BuildContext, INCLUDE};
use crate::error::Result;
use crate::manifest;
use crate::npm::{self, CommandRunner};
use crate::output::{archive_summary, sync_summary, write_stderr_line};
use crate::phantom::{self, PackageDownloader, PhantomOutcome};
use crate::runner::TestSuite;
use crate::sync::Synchronizer;
use crate::watch;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::io::Write;
use std::sync::atomic::AtomicBool;

/// Shared dependencies for a task run.
///
/// Bundles the resolved configuration with the injected process runner and
/// package downloader so tests can run whole pipelines without touching
/// the system.
pub struct TaskContext<'a> {
    /// Resolved per-invocation configuration.
    pub build: &'a BuildContext,
    /// Executor for every child process the pipelines spawn.
    pub runner: &'a dyn CommandRunner,
    /// Client for the PhantomJS package mirror.
    pub downloader: &'a dyn PackageDownloader,
}

/// Remove the build and target directories.
///
/// Tolerates directories that are already absent, so the task is
/// idempotent.
///
/// # Errors
///
/// Returns any filesystem error other than the directories not existing.
pub fn clean(ctx: &TaskContext<'_>, stderr: &mut dyn Write) -> Result<()> {
    for dir in [ctx.build.build_dir(), ctx.build.target_dir()] {
        remove_dir_tolerant(&dir)?;
        write_stderr_line(stderr, format!("Removed {dir}"));
    }
    Ok(())
}

/// Stamp, synchronize, and install into the internal build directory.
///
/// # Errors
///
/// Returns the first failure of the clean, stamp, synchronization, or
/// install steps.
pub fn build(ctx: &TaskContext<'_>, stderr: &mut dyn Write) -> Result<()> {
    clean(ctx, stderr)?;
    if let Some(version) = ctx.build.version() {
        manifest::apply_version(&ctx.build.manifest_path(), version)?;
        write_stderr_line(stderr, format!("Stamped kibana.version {version}"));
    }
    sync_plugin_to(ctx, &ctx.build.build_target(), stderr)
}

/// Build, then archive the build directory.
///
/// Returns the path of the written archive.
///
/// # Errors
///
/// Returns the first failure of the build or packaging steps.
pub fn package(
    ctx: &TaskContext<'_>,
    bundling: ChromiumBundling,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    build(ctx, stderr)?;
    let name = ArchiveName::new(
        ctx.build.package_name(),
        ctx.build.version().map(str::to_owned),
    );
    let archive = archive::package_build_dir(
        &ctx.build.build_dir(),
        &ctx.build.target_dir(),
        &name,
        bundling,
    )?;
    write_stderr_line(stderr, archive_summary(&archive));
    Ok(archive)
}

/// Install PhantomJS (best effort), then deploy into the Kibana plugin
/// directory.
///
/// A PhantomJS failure is logged and does not abort the deploy.
///
/// # Errors
///
/// Returns the first failure of the synchronization or install steps.
pub fn sync(ctx: &TaskContext<'_>, stderr: &mut dyn Write) -> Result<()> {
    report_phantom_outcome(
        phantom::install_phantomjs_with(&ctx.build.phantom_dir(), ctx.downloader),
        stderr,
    );
    sync_plugin_to(ctx, &ctx.build.kibana_plugin_dir(), stderr)
}

/// Deploy, then watch the sources, re-deploying and linting on change.
///
/// Long-running: the loop only ends when `stop` is set or the watcher
/// backend goes away. Failures of the re-deploy or lint are logged and the
/// loop continues.
///
/// # Errors
///
/// Returns the first failure of the initial deploy, or a watcher setup
/// error.
pub fn dev(ctx: &TaskContext<'_>, stop: &AtomicBool, stderr: &mut dyn Write) -> Result<()> {
    sync(ctx, stderr)?;
    write_stderr_line(stderr, "Watching plugin sources for changes...");
    watch::watch_sources(ctx.build.project_root(), stop, || {
        if let Err(err) = sync(ctx, stderr) {
            write_stderr_line(stderr, format!("Resync failed: {err}"));
        } else if let Err(err) = crate::lint::run_lint(ctx.runner, ctx.build.project_root()) {
            write_stderr_line(stderr, format!("Lint failed: {err}"));
        }
    })
}

/// Run the external linter over the plugin sources.
///
/// # Errors
///
/// Returns [`crate::error::BinderyError::LintFailed`] if the linter
/// reports errors.
pub fn lint(ctx: &TaskContext<'_>, stderr: &mut dyn Write) -> Result<()> {
    write_stderr_line(stderr, "Linting plugin sources...");
    crate::lint::run_lint(ctx.runner, ctx.build.project_root())
}

/// Deploy, then delegate to the external test runner.
///
/// # Errors
///
/// Returns the first failure of the deploy, or
/// [`crate::error::BinderyError::TestRunnerFailed`] if the suite fails.
pub fn test(ctx: &TaskContext<'_>, suite: TestSuite, stderr: &mut dyn Write) -> Result<()> {
    sync(ctx, stderr)?;
    crate::runner::run_suite(
        ctx.runner,
        &ctx.build.kibana_home(),
        suite,
        ctx.build.grep_filter(),
    )
}

/// Install the PhantomJS binary and report its location.
///
/// Best-effort: the task succeeds either way and only reports the outcome.
///
/// # Errors
///
/// Never fails; the signature matches the other tasks for uniform
/// dispatch.
pub fn install_phantomjs(ctx: &TaskContext<'_>, stderr: &mut dyn Write) -> Result<()> {
    report_phantom_outcome(
        phantom::install_phantomjs_with(&ctx.build.phantom_dir(), ctx.downloader),
        stderr,
    );
    Ok(())
}

/// Mirror the include set into `dest`, then install dependencies there.
fn sync_plugin_to(ctx: &TaskContext<'_>, dest: &Utf8Path, stderr: &mut dyn Write) -> Result<()> {
    write_stderr_line(stderr, format!("Synchronizing plugin to {dest}..."));
    Synchronizer::new(ctx.build.project_root(), INCLUDE).sync_to(dest)?;
    write_stderr_line(stderr, sync_summary(INCLUDE.len(), dest));
    write_stderr_line(stderr, "Installing production dependencies...");
    npm::install_dependencies(ctx.runner, dest, ctx.build.lib_install())
}

/// Log a PhantomJS install outcome without failing the caller.
fn report_phantom_outcome(outcome: PhantomOutcome, stderr: &mut dyn Write) {
    match outcome {
        PhantomOutcome::Installed { binary } => {
            write_stderr_line(stderr, format!("PhantomJS bin found at: {binary}"));
        }
        PhantomOutcome::Unavailable { reason } => {
            write_stderr_line(stderr, format!("Failed to install PhantomJS: {reason}"));
        }
    }
}

/// Remove a directory tree, tolerating its absence.
fn remove_dir_tolerant(dir: &Utf8Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

//! bindery CLI entrypoint.
//!
//! Parses the task and options, resolves the build context from the
//! project's manifest, and dispatches to the named task pipelines.

use bindery::cli::{Cli, TaskCommand};
use bindery::config::BuildContext;
use bindery::error::{BinderyError, Result};
use bindery::manifest::PluginManifest;
use bindery::npm::SystemCommandRunner;
use bindery::phantom::HttpPackageDownloader;
use bindery::runner::TestSuite;
use bindery::tasks::{self, TaskContext};
use bindery::archive::ChromiumBundling;
use bindery::output::write_stderr_line;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;
use std::sync::atomic::AtomicBool;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let project_root = resolve_project_root()?;
    let manifest = PluginManifest::load(&project_root.join("package.json"))?;
    let build = BuildContext::new(project_root, manifest.name().to_owned(), &cli.options);

    let runner = SystemCommandRunner;
    let downloader = HttpPackageDownloader;
    let ctx = TaskContext {
        build: &build,
        runner: &runner,
        downloader: &downloader,
    };

    match cli.task {
        TaskCommand::Clean => tasks::clean(&ctx, stderr),
        TaskCommand::Build => tasks::build(&ctx, stderr),
        TaskCommand::Package => {
            tasks::package(&ctx, ChromiumBundling::Include, stderr).map(|_| ())
        }
        TaskCommand::PackageNochrome => {
            tasks::package(&ctx, ChromiumBundling::Exclude, stderr).map(|_| ())
        }
        TaskCommand::Sync => tasks::sync(&ctx, stderr),
        TaskCommand::Dev => {
            // The dev loop has no natural end; it runs until the process is
            // interrupted. The stop signal exists for programmatic callers.
            let stop = AtomicBool::new(false);
            tasks::dev(&ctx, &stop, stderr)
        }
        TaskCommand::Lint => tasks::lint(&ctx, stderr),
        TaskCommand::Test => tasks::test(&ctx, TestSuite::Full, stderr),
        TaskCommand::Testserver => tasks::test(&ctx, TestSuite::Server, stderr),
        TaskCommand::Testbrowser => tasks::test(&ctx, TestSuite::Browser, stderr),
        TaskCommand::Testdev => tasks::test(&ctx, TestSuite::Dev, stderr),
        TaskCommand::Coverage => tasks::test(&ctx, TestSuite::Coverage, stderr),
        TaskCommand::InstallPhantomjs => tasks::install_phantomjs(&ctx, stderr),
    }
}

/// The current directory as the plugin project root.
fn resolve_project_root() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| BinderyError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

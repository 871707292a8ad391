//! CLI argument definitions for bindery.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration. The parsed options are converted into an explicit
//! [`crate::config::BuildContext`] before any task runs; no component reads
//! them as ambient state.

use crate::config::{DEFAULT_KIBANA_HOME, DEFAULT_PLUGIN_DIR};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Build, synchronize, and package a Kibana plugin.
#[derive(Parser, Debug)]
#[command(name = "bindery")]
#[command(about)]
#[command(long_about = concat!(
    "Build, synchronize, and package a Kibana plugin.\n\n",
    "bindery mirrors the plugin's distributable sources into either a local ",
    "Kibana checkout (for development) or an internal build directory (for ",
    "packaging), installs production dependencies into the destination, and ",
    "zips the result into a release archive.\n\n",
    "Run it from the plugin's project root; the plugin name is read from ",
    "package.json.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package a release archive with a stamped version:\n",
    "    $ bindery package --version 1.4.0\n\n",
    "  Package without the vendored Chromium tree:\n",
    "    $ bindery package_nochrome\n\n",
    "  Deploy into a sibling Kibana checkout and keep it in sync:\n",
    "    $ bindery dev --kibanahomepath ../kibana\n\n",
    "  Run the server test suite against the deployed plugin:\n",
    "    $ bindery testserver --grep reporting\n",
))]
pub struct Cli {
    /// Task to execute.
    #[command(subcommand)]
    pub task: TaskCommand,

    /// Options shared by every task.
    #[command(flatten)]
    pub options: BuildOptions,
}

/// The named tasks the orchestrator can run.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCommand {
    /// Remove the build and target directories.
    Clean,

    /// Stamp, synchronize, and install into the internal build directory.
    Build,

    /// Build, then archive the plugin including the vendored Chromium tree.
    Package,

    /// Build, then archive the plugin without the vendored Chromium tree.
    #[command(name = "package_nochrome")]
    PackageNochrome,

    /// Install PhantomJS (best effort), then deploy into the Kibana
    /// plugin directory.
    Sync,

    /// Deploy, then watch the sources and re-deploy and lint on change.
    Dev,

    /// Run the external linter over the plugin sources.
    Lint,

    /// Deploy, then run the server and browser test suites.
    Test,

    /// Deploy, then run the server test suite.
    Testserver,

    /// Deploy, then run the browser test suite.
    Testbrowser,

    /// Deploy, then run the interactive dev tests in Chrome.
    Testdev,

    /// Deploy, then run the coverage suite.
    Coverage,

    /// Install the PhantomJS binary and print its location.
    #[command(name = "installPhantomjs")]
    InstallPhantomjs,
}

/// Options shared by every task.
///
/// All options are global so they may be given before or after the task
/// name, matching the loose flag placement of the build runners this tool
/// replaces.
#[derive(Args, Debug, Clone)]
pub struct BuildOptions {
    /// Path to the Kibana checkout, resolved against the project root.
    #[arg(
        long = "kibanahomepath",
        value_name = "PATH",
        global = true,
        default_value = DEFAULT_KIBANA_HOME
    )]
    pub kibana_home: Utf8PathBuf,

    /// Name of the plugin directory inside the Kibana checkout.
    #[arg(
        long = "plugindir",
        value_name = "NAME",
        global = true,
        default_value = DEFAULT_PLUGIN_DIR
    )]
    pub plugin_dir: String,

    /// Dependency spec installed on top of the production install.
    #[arg(long = "lib-install", value_name = "SPEC", global = true)]
    pub lib_install: Option<String>,

    /// Version stamped into the manifest and the archive name.
    #[arg(long, value_name = "VERSION", global = true)]
    pub version: Option<String>,

    /// Filter passed to the test runner's --grep option
    /// [default: the plugin name].
    #[arg(long, value_name = "PATTERN", global = true)]
    pub grep: Option<String>,
}

impl Default for BuildOptions {
    /// Creates a `BuildOptions` instance with the stock defaults and no
    /// overrides, for testing or programmatic construction.
    fn default() -> Self {
        Self {
            kibana_home: Utf8PathBuf::from(DEFAULT_KIBANA_HOME),
            plugin_dir: DEFAULT_PLUGIN_DIR.to_owned(),
            lib_install: None,
            version: None,
            grep: None,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

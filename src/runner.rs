//! Proxy to the external grunt test runner.
//!
//! Test tasks delegate to grunt inside the Kibana checkout; this module
//! maps each suite to its grunt arguments and surfaces a non-zero exit as
//! an ordinary task failure.

use crate::error::{BinderyError, Result};
use crate::npm::CommandRunner;
use camino::Utf8Path;

/// The test suites the orchestrator can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSuite {
    /// Server and browser suites in one run.
    Full,
    /// The server suite.
    Server,
    /// The browser suite.
    Browser,
    /// Interactive dev tests in Chrome.
    Dev,
    /// The coverage suite.
    Coverage,
}

impl TestSuite {
    /// The grunt arguments for this suite with the given grep filter.
    ///
    /// The dev suite takes no grep filter; it always targets Chrome.
    #[must_use]
    pub fn grunt_args(self, grep: &str) -> Vec<String> {
        match self {
            Self::Full => vec![
                "test:server".to_owned(),
                "test:browser".to_owned(),
                format!("--grep={grep}"),
            ],
            Self::Server => vec!["test:server".to_owned(), format!("--grep={grep}")],
            Self::Browser => vec!["test:browser".to_owned(), format!("--grep={grep}")],
            Self::Dev => vec!["test:dev".to_owned(), "--browser=Chrome".to_owned()],
            Self::Coverage => vec!["test:coverage".to_owned(), format!("--grep={grep}")],
        }
    }
}

/// Run a test suite in the Kibana checkout with inherited stdio.
///
/// # Errors
///
/// Returns [`BinderyError::TestRunnerFailed`] if grunt exits non-zero, or
/// [`BinderyError::SpawnFailed`] if it cannot be started.
pub fn run_suite(
    runner: &dyn CommandRunner,
    kibana_home: &Utf8Path,
    suite: TestSuite,
    grep: &str,
) -> Result<()> {
    let args = suite.grunt_args(grep);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let status = runner.run("grunt", &arg_refs, kibana_home)?;
    if !status.success() {
        return Err(BinderyError::TestRunnerFailed {
            command: format!("grunt {}", args.join(" ")),
            status: status.to_string(),
        });
    }
    Ok(())
}

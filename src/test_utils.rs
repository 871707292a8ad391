//! Shared test utilities for the bindery crate.

use crate::error::{BinderyError, Result};
use crate::npm::CommandRunner;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::ExitStatus;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// A stub implementation of [`CommandRunner`] for testing.
///
/// Records every invocation (command line and working directory) and
/// returns queued exit codes, falling back to a default code once the
/// queue is drained. An optional expectation list turns unexpected
/// invocations into [`BinderyError::StubMismatch`] errors.
#[derive(Debug)]
pub struct StubRunner {
    default_code: i32,
    queued_codes: RefCell<VecDeque<i32>>,
    expected: Option<RefCell<VecDeque<String>>>,
    calls: RefCell<Vec<String>>,
    dirs: RefCell<Vec<Utf8PathBuf>>,
}

impl StubRunner {
    /// A stub whose every invocation exits 0.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::with_default_code(0)
    }

    /// A stub whose every invocation exits 1.
    #[must_use]
    pub fn failing() -> Self {
        Self::with_default_code(1)
    }

    /// A stub that exits 0 but rejects any invocation not matching the
    /// expected command lines, in order.
    #[must_use]
    pub fn expecting(commands: impl IntoIterator<Item = &'static str>) -> Self {
        let mut stub = Self::with_default_code(0);
        stub.expected = Some(RefCell::new(
            commands.into_iter().map(str::to_owned).collect(),
        ));
        stub
    }

    fn with_default_code(default_code: i32) -> Self {
        Self {
            default_code,
            queued_codes: RefCell::new(VecDeque::new()),
            expected: None,
            calls: RefCell::new(Vec::new()),
            dirs: RefCell::new(Vec::new()),
        }
    }

    /// Queue an exit code for the next invocation.
    pub fn queue_exit_code(&self, code: i32) {
        self.queued_codes.borrow_mut().push_back(code);
    }

    /// The command lines run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// The working directories of the invocations, in order.
    #[must_use]
    pub fn dirs(&self) -> Vec<Utf8PathBuf> {
        self.dirs.borrow().clone()
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, cmd: &str, args: &[&str], dir: &Utf8Path) -> Result<ExitStatus> {
        let command_line = if args.is_empty() {
            cmd.to_owned()
        } else {
            format!("{cmd} {}", args.join(" "))
        };
        self.calls.borrow_mut().push(command_line.clone());
        self.dirs.borrow_mut().push(dir.to_owned());

        if let Some(expected) = &self.expected {
            match expected.borrow_mut().pop_front() {
                Some(next) if next == command_line => {}
                Some(next) => {
                    return Err(BinderyError::StubMismatch {
                        message: format!("expected `{next}`, got `{command_line}`"),
                    });
                }
                None => {
                    return Err(BinderyError::StubMismatch {
                        message: format!("unexpected invocation `{command_line}`"),
                    });
                }
            }
        }

        let code = self
            .queued_codes
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.default_code);
        Ok(exit_status(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_codes_are_consumed_before_the_default() {
        let stub = StubRunner::succeeding();
        stub.queue_exit_code(2);
        let dir = Utf8PathBuf::from("/tmp");

        let first = stub.run("npm", &["install"], &dir).expect("stub runs");
        let second = stub.run("npm", &["install"], &dir).expect("stub runs");

        assert_eq!(first.code(), Some(2));
        assert_eq!(second.code(), Some(0));
    }

    #[test]
    fn expectations_reject_unexpected_commands() {
        let stub = StubRunner::expecting(["npm install --production"]);
        let dir = Utf8PathBuf::from("/tmp");

        stub.run("npm", &["install", "--production"], &dir)
            .expect("expected call passes");
        let err = stub
            .run("grunt", &["test:server"], &dir)
            .expect_err("unexpected call fails");
        assert!(matches!(err, BinderyError::StubMismatch { .. }));
    }
}

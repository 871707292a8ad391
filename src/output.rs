//! Progress output helpers for the bindery CLI.
//!
//! Task pipelines report progress through an injected stderr sink so tests
//! can capture the output without touching the real terminal.

use camino::Utf8Path;
use std::io::Write;

/// Write one line to the given sink, ignoring write failures.
///
/// Progress output is best-effort; a broken pipe must not fail a task that
/// otherwise succeeded.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a summary line after a synchronization run.
#[must_use]
pub fn sync_summary(count: usize, dest: &Utf8Path) -> String {
    let plural = if count == 1 { "entry" } else { "entries" };
    format!("Synchronized {count} include {plural} to {dest}")
}

/// Format a summary line after a packaging run.
#[must_use]
pub fn archive_summary(archive: &Utf8Path) -> String {
    format!("Wrote {archive}")
}

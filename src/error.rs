//! Error types for the bindery CLI.
//!
//! This module defines semantic error variants for every failure class the
//! task pipelines can hit: filesystem and transfer errors, manifest
//! parse/structure errors, and non-zero exits from the external tools the
//! pipelines delegate to.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building, synchronizing, or packaging a plugin.
#[derive(Debug, Error)]
pub enum BinderyError {
    /// The plugin manifest could not be read or parsed.
    #[error("invalid manifest at {path}: {reason}")]
    InvalidManifest {
        /// Path to the offending manifest file.
        path: Utf8PathBuf,
        /// Description of the read or parse failure.
        reason: String,
    },

    /// The manifest lacks the nested structure a stamp writes into.
    #[error("manifest at {path} has no `{field}` object to stamp")]
    ManifestShape {
        /// Path to the offending manifest file.
        path: Utf8PathBuf,
        /// Name of the missing structural field.
        field: &'static str,
    },

    /// An include entry resolved to no source path.
    #[error("include entry `{entry}` matched nothing under {root}")]
    MissingSource {
        /// The include pattern that failed to resolve.
        entry: String,
        /// The source root the pattern was resolved against.
        root: Utf8PathBuf,
    },

    /// A mirror transfer failed for reasons other than a plain I/O error.
    #[error("synchronization of `{entry}` failed: {reason}")]
    SyncFailed {
        /// The include entry whose transfer failed.
        entry: String,
        /// Description of the transfer failure.
        reason: String,
    },

    /// A dependency installation command exited non-zero.
    #[error("dependency install `{command}` failed: {status}")]
    InstallFailed {
        /// The command line that was run.
        command: String,
        /// The reported exit status.
        status: String,
    },

    /// An external process could not be started at all.
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailed {
        /// The program that could not be spawned.
        command: String,
        /// The underlying I/O error from the spawn attempt.
        #[source]
        source: std::io::Error,
    },

    /// The linter reported errors.
    #[error("eslint failed: {status}")]
    LintFailed {
        /// The reported exit status.
        status: String,
    },

    /// The external test runner exited non-zero.
    #[error("test runner `{command}` failed: {status}")]
    TestRunnerFailed {
        /// The command line that was run.
        command: String,
        /// The reported exit status.
        status: String,
    },

    /// The file watcher could not be created or attached.
    #[error("file watcher error: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },

    /// A path on disk is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// Archive creation or extraction failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`BinderyError`].
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_names_entry_and_root() {
        let err = BinderyError::MissingSource {
            entry: "postinst.js".to_owned(),
            root: Utf8PathBuf::from("/work/plugin"),
        };
        let msg = err.to_string();
        assert!(msg.contains("postinst.js"));
        assert!(msg.contains("/work/plugin"));
    }

    #[test]
    fn install_failed_includes_command_and_status() {
        let err = BinderyError::InstallFailed {
            command: "npm install --production".to_owned(),
            status: "exit status: 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("npm install --production"));
        assert!(msg.contains("exit status: 1"));
    }

    #[test]
    fn manifest_shape_names_missing_field() {
        let err = BinderyError::ManifestShape {
            path: Utf8PathBuf::from("package.json"),
            field: "kibana",
        };
        assert!(err.to_string().contains("`kibana`"));
    }

    #[test]
    fn spawn_failed_preserves_source() {
        let source = std::io::Error::other("not found");
        let err = BinderyError::SpawnFailed {
            command: "npm".to_owned(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Linter proxy over the plugin's JavaScript sources.
//!
//! Resolves the fixed lint file set and hands it to the external `eslint`
//! binary. The linter's own configuration is the plugin's business; this
//! module only decides which files are checked.

use crate::error::{BinderyError, Result};
use crate::npm::CommandRunner;
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use walkdir::WalkDir;

/// Root-level files checked when present.
const LINT_FILES: &[&str] = &["index.js", "init.js"];

/// Directories whose `.js` files are checked recursively.
const LINT_DIRS: &[&str] = &["public", "server"];

/// Directory name excluded from linting wherever it appears.
const LINT_EXCLUDE_DIR: &str = "webpackShims";

/// Resolve the fixed lint file set under `root`, in sorted order.
///
/// # Errors
///
/// Returns an error if a directory traversal fails or a path is not valid
/// UTF-8.
pub fn lint_targets(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut targets = Vec::new();

    for name in LINT_FILES {
        let path = root.join(name);
        if path.is_file() {
            targets.push(path);
        }
    }

    for dir in LINT_DIRS {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        for entry in WalkDir::new(dir_path.as_std_path()).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::try_from(entry.into_path()).map_err(|e| {
                BinderyError::NonUtf8Path {
                    path: e.into_path_buf().display().to_string(),
                }
            })?;
            if path
                .components()
                .any(|c| c.as_str() == LINT_EXCLUDE_DIR)
            {
                continue;
            }
            if path.extension() == Some("js") {
                targets.push(path);
            }
        }
    }

    Ok(targets)
}

/// Run eslint over the resolved file set, relative to `root`.
///
/// A run with no resolvable targets succeeds trivially.
///
/// # Errors
///
/// Returns [`BinderyError::LintFailed`] if eslint exits non-zero, or
/// [`BinderyError::SpawnFailed`] if it cannot be started.
pub fn run_lint(runner: &dyn CommandRunner, root: &Utf8Path) -> Result<()> {
    let targets = lint_targets(root)?;
    if targets.is_empty() {
        return Ok(());
    }

    let relative: Vec<String> = targets
        .iter()
        .map(|path| path.strip_prefix(root).unwrap_or(path).to_string())
        .collect();
    let args: Vec<&str> = relative.iter().map(String::as_str).collect();

    let status = runner.run("eslint", &args, root)?;
    if !status.success() {
        return Err(BinderyError::LintFailed {
            status: status.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubRunner;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        fs::write(root.join("index.js"), "export {};").expect("write");
        fs::create_dir_all(root.join("public/webpackShims")).expect("mkdir");
        fs::write(root.join("public/app.js"), "export {};").expect("write");
        fs::write(root.join("public/style.css"), "").expect("write");
        fs::write(root.join("public/webpackShims/shim.js"), "export {};").expect("write");
        fs::create_dir_all(root.join("server/routes")).expect("mkdir");
        fs::write(root.join("server/routes/api.js"), "export {};").expect("write");
        (dir, root)
    }

    #[test]
    fn targets_cover_entry_files_and_source_trees() {
        let (_dir, root) = fixture();
        let targets = lint_targets(&root).expect("resolution succeeds");

        assert!(targets.contains(&root.join("index.js")));
        assert!(targets.contains(&root.join("public/app.js")));
        assert!(targets.contains(&root.join("server/routes/api.js")));
    }

    #[test]
    fn targets_skip_shims_and_non_js_files() {
        let (_dir, root) = fixture();
        let targets = lint_targets(&root).expect("resolution succeeds");

        assert!(!targets.contains(&root.join("public/webpackShims/shim.js")));
        assert!(!targets.contains(&root.join("public/style.css")));
    }

    #[test]
    fn missing_entry_files_are_tolerated() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");

        let targets = lint_targets(&root).expect("resolution succeeds");
        assert!(targets.is_empty());
    }

    #[test]
    fn eslint_runs_over_relative_paths() {
        let (_dir, root) = fixture();
        let runner = StubRunner::succeeding();

        run_lint(&runner, &root).expect("lint succeeds");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("eslint "));
        assert!(calls[0].contains("index.js"));
        assert!(calls[0].contains("public/app.js"));
        assert!(!calls[0].contains("webpackShims"));
    }

    #[test]
    fn non_zero_exit_surfaces_as_lint_failed() {
        let (_dir, root) = fixture();
        let runner = StubRunner::failing();

        let err = run_lint(&runner, &root).expect_err("lint fails");
        assert!(matches!(err, BinderyError::LintFailed { .. }));
    }

    #[test]
    fn an_empty_target_set_spawns_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let runner = StubRunner::failing();

        run_lint(&runner, &root).expect("trivially succeeds");
        assert!(runner.calls().is_empty());
    }
}

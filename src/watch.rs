//! Cancellable watch-and-resync loop for development.
//!
//! Watches the plugin's distributable sources and invokes a callback on
//! every relevant change batch. The loop never terminates on its own; it
//! stops when the caller's stop signal is set or the watcher backend goes
//! away.

use crate::error::{BinderyError, Result};
use camino::Utf8Path;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

/// Directories watched recursively for source changes.
const WATCH_DIRS: &[&str] = &["public", "server"];

/// How often the loop re-checks the stop signal while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Watch the plugin sources under `root`, invoking `on_change` for every
/// batch of relevant filesystem events.
///
/// Watched set: `index.js`, `init.js`, and `*.json` at the project root,
/// plus the `public/` and `server/` trees. Events are drained in batches so
/// one save triggers one callback. The loop runs until `stop` is set.
///
/// # Errors
///
/// Returns [`BinderyError::Watch`] if the watcher cannot be created or
/// attached to the project root.
pub fn watch_sources(
    root: &Utf8Path,
    stop: &AtomicBool,
    mut on_change: impl FnMut(),
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<PathBuf>();

    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    for path in event.paths {
                        if tx.send(path).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(err) => {
                log::warn!("file watcher error: {err}");
            }
        })
        .map_err(watch_error)?;

    watcher
        .watch(root.as_std_path(), RecursiveMode::NonRecursive)
        .map_err(watch_error)?;
    for dir in WATCH_DIRS {
        let path = root.join(dir);
        if path.is_dir() {
            watcher
                .watch(path.as_std_path(), RecursiveMode::Recursive)
                .map_err(watch_error)?;
        }
    }

    while !stop.load(Ordering::Relaxed) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(first) => {
                let mut relevant = is_watched(root, &first);
                while let Ok(path) = rx.try_recv() {
                    relevant = relevant || is_watched(root, &path);
                }
                if relevant {
                    on_change();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

/// Whether an event path belongs to the watched source set.
fn is_watched(root: &Utf8Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root.as_std_path()) else {
        return false;
    };
    let mut components = rel.components();
    let Some(first) = components.next() else {
        return false;
    };
    let first = first.as_os_str().to_string_lossy();

    if WATCH_DIRS.contains(&first.as_ref()) {
        return true;
    }
    if components.next().is_some() {
        return false;
    }
    first == "index.js" || first == "init.js" || first.ends_with(".json")
}

fn watch_error(err: notify::Error) -> BinderyError {
    BinderyError::Watch {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    #[rstest]
    #[case::entry_file("index.js", true)]
    #[case::init_file("init.js", true)]
    #[case::root_manifest("package.json", true)]
    #[case::public_tree("public/app/panel.js", true)]
    #[case::server_tree("server/routes/api.js", true)]
    #[case::build_output("build/bindery/kibana/foo/index.js", false)]
    #[case::root_stray("notes.txt", false)]
    #[case::nested_json("lib/config.json", false)]
    fn is_watched_covers_the_source_set(#[case] rel: &str, #[case] expected: bool) {
        let root = Utf8PathBuf::from("/work/plugin");
        let path = root.as_std_path().join(rel);
        assert_eq!(is_watched(&root, &path), expected);
    }

    #[test]
    fn a_path_outside_the_root_is_ignored() {
        let root = Utf8PathBuf::from("/work/plugin");
        assert!(!is_watched(&root, Path::new("/elsewhere/index.js")));
    }

    #[test]
    fn the_stop_signal_ends_the_loop_without_events() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let stop = AtomicBool::new(true);
        let invocations = AtomicUsize::new(0);

        watch_sources(&root, &stop, || {
            invocations.fetch_add(1, Ordering::Relaxed);
        })
        .expect("watch exits cleanly");

        assert_eq!(invocations.load(Ordering::Relaxed), 0);
    }
}

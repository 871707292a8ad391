//! Mirror synchronization of the include set.
//!
//! Copies each include entry from the project root into a destination
//! directory with mirror semantics: destination content is overwritten or
//! deleted until it exactly matches the source, so no destination-only
//! files survive outside the include set. Entries transfer concurrently;
//! any single failure fails the whole run.

use crate::error::{BinderyError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fs;
use walkdir::WalkDir;

/// Mirrors the include set from a source root into destination directories.
pub struct Synchronizer<'a> {
    source_root: &'a Utf8Path,
    include: &'a [&'a str],
}

impl<'a> Synchronizer<'a> {
    /// Create a synchronizer for the given source root and include set.
    #[must_use]
    pub fn new(source_root: &'a Utf8Path, include: &'a [&'a str]) -> Self {
        Self {
            source_root,
            include,
        }
    }

    /// Mirror every include entry into `dest`.
    ///
    /// Creates `dest` recursively before any transfer starts, prunes
    /// destination entries that belong to no include entry, then mirrors
    /// each entry on its own scoped thread. The call returns once every
    /// transfer has finished; the first failure is surfaced and in-flight
    /// siblings are left to run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::MissingSource`] if an entry resolves to
    /// nothing, or the causing error of the first failed transfer.
    pub fn sync_to(&self, dest: &Utf8Path) -> Result<()> {
        fs::create_dir_all(dest)?;

        // Resolve every entry up front so a missing source aborts before
        // any destination entry is touched.
        let resolved: Vec<(&str, Vec<Utf8PathBuf>)> = self
            .include
            .iter()
            .map(|entry| Ok((*entry, resolve_entry(self.source_root, entry)?)))
            .collect::<Result<_>>()?;

        prune_unclaimed_roots(dest, &resolved)?;

        let mut results: Vec<Result<()>> = Vec::with_capacity(resolved.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = resolved
                .iter()
                .map(|(entry, sources)| {
                    (*entry, scope.spawn(move || mirror_sources(sources, dest)))
                })
                .collect();
            for (entry, handle) in handles {
                results.push(match handle.join() {
                    Ok(outcome) => outcome,
                    Err(_) => Err(BinderyError::SyncFailed {
                        entry: entry.to_owned(),
                        reason: "transfer worker panicked".to_owned(),
                    }),
                });
            }
        });
        results.into_iter().collect()
    }
}

/// Resolve an include entry to the source paths it names.
///
/// Literal entries resolve to themselves; entries containing a single `*`
/// wildcard match root-level names. An entry that resolves to nothing is a
/// [`BinderyError::MissingSource`] error.
fn resolve_entry(root: &Utf8Path, entry: &str) -> Result<Vec<Utf8PathBuf>> {
    let mut sources = Vec::new();
    if entry.contains('*') {
        for dir_entry in fs::read_dir(root)? {
            let name = dir_entry?
                .file_name()
                .into_string()
                .map_err(|name| BinderyError::NonUtf8Path {
                    path: name.to_string_lossy().into_owned(),
                })?;
            if glob_matches(entry, &name) {
                sources.push(root.join(name));
            }
        }
        sources.sort();
    } else {
        let path = root.join(entry);
        if path.exists() {
            sources.push(path);
        }
    }

    if sources.is_empty() {
        return Err(BinderyError::MissingSource {
            entry: entry.to_owned(),
            root: root.to_owned(),
        });
    }
    Ok(sources)
}

/// Match a root-level name against a pattern with at most one `*`.
fn glob_matches(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => pattern == name,
    }
}

/// Remove top-level destination entries that belong to no include entry.
fn prune_unclaimed_roots(dest: &Utf8Path, resolved: &[(&str, Vec<Utf8PathBuf>)]) -> Result<()> {
    let claimed: HashSet<&str> = resolved
        .iter()
        .flat_map(|(_, sources)| sources.iter())
        .filter_map(|p| p.file_name())
        .collect();

    for dir_entry in fs::read_dir(dest)? {
        let dir_entry = dir_entry?;
        let name =
            dir_entry
                .file_name()
                .into_string()
                .map_err(|name| BinderyError::NonUtf8Path {
                    path: name.to_string_lossy().into_owned(),
                })?;
        if claimed.contains(name.as_str()) {
            continue;
        }
        log::debug!("pruning destination-only entry {name}");
        let path = dir_entry.path();
        if dir_entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Mirror each resolved source path into the destination directory.
fn mirror_sources(sources: &[Utf8PathBuf], dest: &Utf8Path) -> Result<()> {
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = dest.join(name);
        if source.is_dir() {
            mirror_dir(source, &target)?;
        } else {
            fs::copy(source, &target)?;
        }
        log::debug!("mirrored {source} -> {target}");
    }
    Ok(())
}

/// Mirror a directory tree: copy everything under `source` into `target`,
/// then delete target entries with no source counterpart.
fn mirror_dir(source: &Utf8Path, target: &Utf8Path) -> Result<()> {
    let mut keep: HashSet<Utf8PathBuf> = HashSet::new();

    for entry in WalkDir::new(source.as_std_path()) {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_dir = entry.file_type().is_dir();
        let path = utf8_path(entry.into_path())?;
        let Ok(rel) = path.strip_prefix(source) else {
            continue;
        };
        if rel.as_str().is_empty() {
            fs::create_dir_all(target)?;
            continue;
        }
        let dest_path = target.join(rel);
        if is_dir {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&path, &dest_path)?;
        }
        keep.insert(rel.to_owned());
    }

    prune_extraneous(target, &keep)
}

/// Delete entries under `target` that are not in the keep set.
fn prune_extraneous(target: &Utf8Path, keep: &HashSet<Utf8PathBuf>) -> Result<()> {
    // contents_first yields children before their parent directory, so
    // extraneous files vanish before the directory holding them.
    for entry in WalkDir::new(target.as_std_path()).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            // A sibling pass may already have removed this entry.
            Err(err) if err.io_error().is_some_and(is_not_found) => continue,
            Err(err) => return Err(std::io::Error::from(err).into()),
        };
        let is_dir = entry.file_type().is_dir();
        let path = utf8_path(entry.into_path())?;
        let Ok(rel) = path.strip_prefix(target) else {
            continue;
        };
        if rel.as_str().is_empty() || keep.contains(rel) {
            continue;
        }
        log::debug!("deleting extraneous {path}");
        if is_dir {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn is_not_found(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound
}

fn utf8_path(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path).map_err(|e| BinderyError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

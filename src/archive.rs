//! Distributable archive naming and creation.
//!
//! Collects the files under the internal build directory and compresses
//! them into a single zip archive named after the plugin and the optional
//! version override.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// The fixed file extension for distributable archives.
const ARCHIVE_EXTENSION: &str = ".zip";

/// The vendored Chromium directory, hidden by default traversal rules.
const CHROMIUM_DIR: &str = ".local-chromium";

/// A fully-qualified archive name.
///
/// Produces `<name>.zip` without a version override and
/// `<name>-v<version>.zip` with one.
///
/// # Examples
///
/// ```
/// use bindery::archive::ArchiveName;
///
/// assert_eq!(ArchiveName::new("foo", None).to_string(), "foo.zip");
/// assert_eq!(
///     ArchiveName::new("foo", Some("2.3.4".to_owned())).to_string(),
///     "foo-v2.3.4.zip"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    package: String,
    version: Option<String>,
}

impl ArchiveName {
    /// Create an archive name from the plugin name and optional version.
    #[must_use]
    pub fn new(package: impl Into<String>, version: Option<String>) -> Self {
        Self {
            package: package.into(),
            version,
        }
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}-v{version}{ARCHIVE_EXTENSION}", self.package),
            None => write!(f, "{}{ARCHIVE_EXTENSION}", self.package),
        }
    }
}

/// Whether the vendored Chromium tree is bundled into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromiumBundling {
    /// Admit the `.local-chromium` subtree despite being hidden.
    Include,
    /// Leave the `.local-chromium` subtree out.
    Exclude,
}

/// Collect the files to archive under `build_dir`, in sorted order.
///
/// Hidden entries (any path component starting with `.`) are excluded; the
/// [`ChromiumBundling::Include`] variant re-admits the `.local-chromium`
/// subtree. Each result pairs the absolute source path with the
/// forward-slash entry name inside the archive.
///
/// # Errors
///
/// Returns an error if the traversal fails or a path is not valid UTF-8.
pub fn collect_files(
    build_dir: &Utf8Path,
    bundling: ChromiumBundling,
) -> Result<Vec<(Utf8PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(build_dir.as_std_path()).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.into_path()).map_err(|e| {
            crate::error::BinderyError::NonUtf8Path {
                path: e.into_path_buf().display().to_string(),
            }
        })?;
        let Ok(rel) = path.strip_prefix(build_dir) else {
            continue;
        };
        if !admits(rel, bundling) {
            continue;
        }
        let name = rel
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/");
        files.push((path, name));
    }
    log::debug!("collected {} file(s) under {build_dir}", files.len());
    Ok(files)
}

/// Whether a relative path is admitted under the hidden-entry rules.
fn admits(rel: &Utf8Path, bundling: ChromiumBundling) -> bool {
    rel.components().all(|component| {
        let name = component.as_str();
        !name.starts_with('.')
            || (name == CHROMIUM_DIR && bundling == ChromiumBundling::Include)
    })
}

/// Write the collected files into a zip archive at `output_path`.
///
/// Entries are deflate-compressed; Unix permission bits are carried over
/// from the source files.
///
/// # Errors
///
/// Returns an error if any source file cannot be read or the archive
/// cannot be written.
pub fn write_archive(files: &[(Utf8PathBuf, String)], output_path: &Utf8Path) -> Result<()> {
    let file = fs::File::create(output_path)?;
    let mut writer = ZipWriter::new(file);

    for (source, name) in files {
        let mut options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options = options.unix_permissions(fs::metadata(source)?.permissions().mode());
        }
        writer.start_file(name.as_str(), options)?;
        let mut reader = fs::File::open(source)?;
        io::copy(&mut reader, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

/// Archive the build directory into the target directory.
///
/// Creates the target directory if absent and returns the path of the
/// written archive.
///
/// # Errors
///
/// Returns an error if collection or the archive write fails.
pub fn package_build_dir(
    build_dir: &Utf8Path,
    target_dir: &Utf8Path,
    name: &ArchiveName,
    bundling: ChromiumBundling,
) -> Result<Utf8PathBuf> {
    fs::create_dir_all(target_dir)?;
    let files = collect_files(build_dir, bundling)?;
    let output_path = target_dir.join(name.filename());
    write_archive(&files, &output_path)?;
    Ok(output_path)
}

//! Best-effort PhantomJS installation.
//!
//! The plugin bundles a PhantomJS binary for report rendering. Before a
//! deploy, the installer makes sure the vendored `phantomjs/` directory
//! holds an extracted, checksum-verified binary for the host platform,
//! downloading the platform package from the mirror when it is not already
//! vendored.
//!
//! Failures here are never fatal to a dependent task: the outcome is a
//! [`PhantomOutcome`] value, deliberately not a `Result`, and callers log
//! the reason and carry on.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Component, Path};
use std::sync::OnceLock;
use std::time::Duration;

/// The PhantomJS release the plugin bundles.
pub const PHANTOM_VERSION: &str = "2.1.1";

/// Download mirror serving the platform packages.
const MIRROR_BASE: &str = "https://npmmirror.com/mirrors/phantomjs";

/// Network timeout for package downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Archive container format of a platform package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A gzip-compressed tarball.
    TarGz,
    /// A zip archive.
    Zip,
}

/// A platform-specific PhantomJS package description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhantomPackage {
    /// Archive filename on the mirror and in the vendored directory.
    pub archive: &'static str,
    /// Expected SHA-256 digest of the archive, lowercase hex.
    pub sha256: &'static str,
    /// Path of the executable inside the extracted archive.
    pub binary_path: &'static str,
    /// Container format of the archive.
    pub format: ArchiveFormat,
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const HOST_PACKAGE: Option<&PhantomPackage> = Some(&PhantomPackage {
    archive: "phantomjs-2.1.1-linux-x86_64.tar.gz",
    sha256: "4ea7aa79e45fbc487a63ef4788a18ef7e0d40c8f97077a89c0c2c290c78632a4",
    binary_path: "phantomjs-2.1.1-linux-x86_64/bin/phantomjs",
    format: ArchiveFormat::TarGz,
});

#[cfg(target_os = "macos")]
const HOST_PACKAGE: Option<&PhantomPackage> = Some(&PhantomPackage {
    archive: "phantomjs-2.1.1-macosx.zip",
    sha256: "538cf488219ab27e309eafc629e2bcee9976990fe90b1ec334f541779150f8c1",
    binary_path: "phantomjs-2.1.1-macosx/bin/phantomjs",
    format: ArchiveFormat::Zip,
});

#[cfg(target_os = "windows")]
const HOST_PACKAGE: Option<&PhantomPackage> = Some(&PhantomPackage {
    archive: "phantomjs-2.1.1-windows.zip",
    sha256: "d9fb05623d6b26d3654d008eab3adafd1f6350433dfd16138c46161f42c7dcc8",
    binary_path: "phantomjs-2.1.1-windows/bin/phantomjs.exe",
    format: ArchiveFormat::Zip,
});

#[cfg(not(any(
    all(target_os = "linux", target_arch = "x86_64"),
    target_os = "macos",
    target_os = "windows"
)))]
const HOST_PACKAGE: Option<&PhantomPackage> = None;

/// The PhantomJS package for the host platform, when one exists.
#[must_use]
pub fn host_package() -> Option<&'static PhantomPackage> {
    HOST_PACKAGE
}

/// Mirror URL of a platform package.
#[must_use]
pub fn package_url(package: &PhantomPackage) -> String {
    format!("{MIRROR_BASE}/{}", package.archive)
}

/// The outcome of a best-effort install attempt.
///
/// This is deliberately not a `Result` — PhantomJS failures are never
/// fatal. Callers pattern-match, log the reason, and proceed.
#[derive(Debug)]
pub enum PhantomOutcome {
    /// The binary is extracted, verified, and executable.
    Installed {
        /// Path to the PhantomJS executable.
        binary: Utf8PathBuf,
    },
    /// The install attempt failed; the dependent task proceeds without it.
    Unavailable {
        /// A human-readable explanation of the failure.
        reason: String,
    },
}

/// Errors arising from the PhantomJS install pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PhantomError {
    /// Downloading the package from the mirror failed.
    #[error("download failed for {url}: {reason}")]
    Download {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The downloaded archive does not match the pinned digest.
    #[error("checksum mismatch for {archive}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The archive filename that failed verification.
        archive: String,
        /// The pinned digest.
        expected: String,
        /// The digest computed from the file on disk.
        actual: String,
    },

    /// An archive entry attempts to escape the extraction directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive extracted without yielding the expected binary.
    #[error("extracted archive has no binary at {path}")]
    MissingBinary {
        /// Where the binary was expected.
        path: Utf8PathBuf,
    },

    /// Reading a zip package failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for fetching a package archive from the mirror.
///
/// Abstracting the HTTP client lets tests exercise the install pipeline
/// without network access.
#[cfg_attr(test, mockall::automock)]
pub trait PackageDownloader {
    /// Download `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`PhantomError::Download`] if the request fails, or
    /// [`PhantomError::Io`] if the file cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), PhantomError>;
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpPackageDownloader;

impl PackageDownloader for HttpPackageDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), PhantomError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| PhantomError::Download {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        let mut file = fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(PhantomError::Io)?;
        Ok(())
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Install PhantomJS into the vendored directory, best effort.
///
/// Returns [`PhantomOutcome::Installed`] with the binary path, or
/// [`PhantomOutcome::Unavailable`] with a reason on any failure.
#[must_use]
pub fn install_phantomjs(vendor_dir: &Utf8Path) -> PhantomOutcome {
    install_phantomjs_with(vendor_dir, &HttpPackageDownloader)
}

/// Testable entry point with an injected downloader.
///
/// The production entry point [`install_phantomjs`] delegates here with the
/// real HTTP client; tests inject mocks.
#[must_use]
pub fn install_phantomjs_with(
    vendor_dir: &Utf8Path,
    downloader: &dyn PackageDownloader,
) -> PhantomOutcome {
    let Some(package) = host_package() else {
        return PhantomOutcome::Unavailable {
            reason: format!("no PhantomJS {PHANTOM_VERSION} package for this platform"),
        };
    };
    match install_package(vendor_dir, package, downloader) {
        Ok(binary) => PhantomOutcome::Installed { binary },
        Err(e) => PhantomOutcome::Unavailable {
            reason: e.to_string(),
        },
    }
}

/// The core pipeline: vendored-or-downloaded archive → verify → extract.
///
/// This function is public to allow integration tests to inject package
/// descriptions and downloader implementations.
///
/// # Errors
///
/// Returns the first failure of the download, verification, or extraction
/// steps.
pub fn install_package(
    vendor_dir: &Utf8Path,
    package: &PhantomPackage,
    downloader: &dyn PackageDownloader,
) -> Result<Utf8PathBuf, PhantomError> {
    fs::create_dir_all(vendor_dir)?;
    let archive_path = vendor_dir.join(package.archive);

    let vendored_is_valid =
        archive_path.is_file() && compute_sha256(&archive_path)? == package.sha256;
    if !vendored_is_valid {
        let url = package_url(package);
        log::debug!("fetching {url}");
        downloader.fetch(&url, archive_path.as_std_path())?;
        let actual = compute_sha256(&archive_path)?;
        if actual != package.sha256 {
            return Err(PhantomError::ChecksumMismatch {
                archive: package.archive.to_owned(),
                expected: package.sha256.to_owned(),
                actual,
            });
        }
    }

    match package.format {
        ArchiveFormat::Zip => extract_zip(&archive_path, vendor_dir)?,
        ArchiveFormat::TarGz => extract_tar_gz(&archive_path, vendor_dir)?,
    }

    let binary = vendor_dir.join(package.binary_path);
    if !binary.is_file() {
        return Err(PhantomError::MissingBinary { path: binary });
    }
    #[cfg(unix)]
    mark_executable(&binary)?;
    Ok(binary)
}

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// # Errors
///
/// Returns [`PhantomError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String, PhantomError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Extract a zip package into `dest`.
fn extract_zip(archive_path: &Utf8Path, dest: &Utf8Path) -> Result<(), PhantomError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = Path::new(entry.name()).to_path_buf();
        validate_entry_path(&entry_path)?;
        let dest_path = dest.as_std_path().join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut out)?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

/// Extract a gzip-compressed tarball into `dest`.
fn extract_tar_gz(archive_path: &Utf8Path, dest: &Utf8Path) -> Result<(), PhantomError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;
        let dest_path = dest.as_std_path().join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest_path)?;
    }
    Ok(())
}

/// Validate that an archive entry path cannot escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), PhantomError> {
    if path.is_absolute() {
        return Err(PhantomError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(PhantomError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Make the extracted binary executable.
#[cfg(unix)]
fn mark_executable(path: &Utf8Path) -> Result<(), PhantomError> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

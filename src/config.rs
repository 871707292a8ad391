//! Build configuration and path resolution.
//!
//! This module converts the parsed CLI options into an explicit
//! [`BuildContext`] that every component receives by reference. The context
//! resolves all derived paths once: the internal build directory, the
//! archive target directory, and the destination inside a Kibana checkout.

use crate::cli::BuildOptions;
use camino::{Utf8Path, Utf8PathBuf};

/// Default Kibana checkout location, resolved against the project root.
pub const DEFAULT_KIBANA_HOME: &str = "../kibi-internal";

/// Default plugin directory name inside the Kibana checkout.
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";

/// Sub-directory under `build/` and `target/` owned by this tool, so its
/// work does not interfere with other build systems sharing those roots.
const TOOL_DIR: &str = "bindery";

/// The fixed, ordered list of path patterns that form the distributable
/// unit. Entries are either literal paths relative to the project root or a
/// single-`*` glob over root-level names.
pub const INCLUDE: &[&str] = &[
    "*.json",
    "LICENSE",
    "README.md",
    "index.js",
    "init.js",
    "postinst.js",
    "server",
    "lib",
    "public",
    "phantomjs",
];

/// Per-invocation configuration passed into each component.
///
/// Replaces the ambient parsed-flags record of the build runners this tool
/// supersedes: the context is constructed once in `main` and handed down by
/// reference.
#[derive(Debug, Clone)]
pub struct BuildContext {
    project_root: Utf8PathBuf,
    package_name: String,
    kibana_home: Utf8PathBuf,
    plugin_dir: String,
    lib_install: Option<String>,
    version: Option<String>,
    grep: Option<String>,
}

impl BuildContext {
    /// Create a context for the given project root and plugin name.
    #[must_use]
    pub fn new(project_root: Utf8PathBuf, package_name: String, options: &BuildOptions) -> Self {
        Self {
            project_root,
            package_name,
            kibana_home: options.kibana_home.clone(),
            plugin_dir: options.plugin_dir.clone(),
            lib_install: options.lib_install.clone(),
            version: options.version.clone(),
            grep: options.grep.clone(),
        }
    }

    /// The plugin project root all relative paths resolve against.
    #[must_use]
    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// The plugin name, read from the manifest at startup.
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Path to the plugin manifest.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.project_root.join("package.json")
    }

    /// The internal build directory removed by `clean`.
    #[must_use]
    pub fn build_dir(&self) -> Utf8PathBuf {
        self.project_root.join("build").join(TOOL_DIR)
    }

    /// The archive output directory removed by `clean`.
    #[must_use]
    pub fn target_dir(&self) -> Utf8PathBuf {
        self.project_root.join("target").join(TOOL_DIR)
    }

    /// The synchronization destination inside the build directory.
    ///
    /// Nested as `kibana/<name>` so the produced archive unpacks into a
    /// Kibana plugin directory layout.
    #[must_use]
    pub fn build_target(&self) -> Utf8PathBuf {
        self.build_dir().join("kibana").join(&self.package_name)
    }

    /// The plugin's directory inside the configured Kibana checkout.
    #[must_use]
    pub fn kibana_plugin_dir(&self) -> Utf8PathBuf {
        self.project_root
            .join(&self.kibana_home)
            .join(&self.plugin_dir)
            .join(&self.package_name)
    }

    /// The Kibana checkout the test runner executes in.
    #[must_use]
    pub fn kibana_home(&self) -> Utf8PathBuf {
        self.project_root.join(&self.kibana_home)
    }

    /// The vendored PhantomJS directory inside the project.
    #[must_use]
    pub fn phantom_dir(&self) -> Utf8PathBuf {
        self.project_root.join("phantomjs")
    }

    /// Optional dependency spec installed on top of the production install.
    #[must_use]
    pub fn lib_install(&self) -> Option<&str> {
        self.lib_install.as_deref()
    }

    /// Optional version stamped into the manifest and the archive name.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The test filter: the `--grep` flag when given, else the plugin name.
    #[must_use]
    pub fn grep_filter(&self) -> &str {
        self.grep.as_deref().unwrap_or(&self.package_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BuildContext {
        BuildContext::new(
            Utf8PathBuf::from("/work/plugin"),
            "reporter".to_owned(),
            &BuildOptions::default(),
        )
    }

    #[test]
    fn derived_paths_nest_under_the_tool_directory() {
        let ctx = context();
        assert_eq!(ctx.build_dir(), Utf8PathBuf::from("/work/plugin/build/bindery"));
        assert_eq!(ctx.target_dir(), Utf8PathBuf::from("/work/plugin/target/bindery"));
        assert_eq!(
            ctx.build_target(),
            Utf8PathBuf::from("/work/plugin/build/bindery/kibana/reporter")
        );
    }

    #[test]
    fn kibana_plugin_dir_resolves_against_the_project_root() {
        let ctx = context();
        assert_eq!(
            ctx.kibana_plugin_dir(),
            Utf8PathBuf::from("/work/plugin/../kibi-internal/plugins/reporter")
        );
    }

    #[test]
    fn grep_filter_falls_back_to_the_package_name() {
        let ctx = context();
        assert_eq!(ctx.grep_filter(), "reporter");

        let options = BuildOptions {
            grep: Some("reporting".to_owned()),
            ..BuildOptions::default()
        };
        let ctx = BuildContext::new(
            Utf8PathBuf::from("/work/plugin"),
            "reporter".to_owned(),
            &options,
        );
        assert_eq!(ctx.grep_filter(), "reporting");
    }

    #[test]
    fn include_set_is_stable() {
        assert_eq!(INCLUDE.first(), Some(&"*.json"));
        assert!(INCLUDE.contains(&"phantomjs"));
        assert_eq!(INCLUDE.len(), 10);
    }
}

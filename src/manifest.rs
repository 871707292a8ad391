//! Plugin manifest access and version stamping.
//!
//! The manifest is the plugin's `package.json`. It is parsed into an
//! order-preserving JSON document so a version stamp rewrites exactly one
//! field; every other key survives the round trip in its original order.

use crate::error::{BinderyError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;

/// Typed view of the manifest fields the pipelines consume.
#[derive(Debug, Clone, Deserialize)]
struct ManifestFields {
    /// The plugin name; names the archive and the deploy directory.
    name: String,
    /// The Kibana compatibility block, absent in some manifests.
    kibana: Option<KibanaBlock>,
}

/// The nested Kibana compatibility block.
#[derive(Debug, Clone, Deserialize)]
struct KibanaBlock {
    /// The Kibana version this plugin targets.
    version: Option<String>,
}

/// A plugin manifest loaded from disk.
///
/// Holds both the raw document (for lossless rewriting) and a typed view of
/// the fields the pipelines read.
#[derive(Debug, Clone)]
pub struct PluginManifest {
    path: Utf8PathBuf,
    document: serde_json::Value,
    fields: ManifestFields,
}

impl PluginManifest {
    /// Load and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::InvalidManifest`] if the file cannot be read,
    /// is not valid JSON, or lacks a string `name` field.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| invalid(path, &e))?;
        let document: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| invalid(path, &e))?;
        let fields: ManifestFields =
            serde_json::from_value(document.clone()).map_err(|e| invalid(path, &e))?;
        Ok(Self {
            path: path.to_owned(),
            document,
            fields,
        })
    }

    /// The path this manifest was loaded from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// The targeted Kibana version, when the manifest declares one.
    #[must_use]
    pub fn kibana_version(&self) -> Option<&str> {
        self.fields
            .kibana
            .as_ref()
            .and_then(|k| k.version.as_deref())
    }

    /// Overwrite the nested `kibana.version` field in memory.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::ManifestShape`] if the manifest has no
    /// `kibana` object to write into. Nothing is modified on failure.
    pub fn stamp_kibana_version(&mut self, version: &str) -> Result<()> {
        let kibana = self
            .document
            .get_mut("kibana")
            .and_then(serde_json::Value::as_object_mut)
            .ok_or(BinderyError::ManifestShape {
                path: self.path.clone(),
                field: "kibana",
            })?;
        kibana.insert(
            "version".to_owned(),
            serde_json::Value::String(version.to_owned()),
        );
        self.fields.kibana = Some(KibanaBlock {
            version: Some(version.to_owned()),
        });
        Ok(())
    }

    /// Rewrite the manifest to disk, pretty-printed with two-space
    /// indentation.
    ///
    /// The overwrite is destructive and non-transactional; no backup of the
    /// prior manifest is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self) -> Result<()> {
        let text =
            serde_json::to_string_pretty(&self.document).map_err(|e| invalid(&self.path, &e))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Stamp `kibana.version` into the manifest at `path` and rewrite it.
///
/// Convenience for the build pipeline's optional stamping step.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, lacks a `kibana`
/// object, or cannot be rewritten. The structural check runs before any
/// byte is written.
pub fn apply_version(path: &Utf8Path, version: &str) -> Result<()> {
    let mut manifest = PluginManifest::load(path)?;
    manifest.stamp_kibana_version(version)?;
    manifest.write()
}

fn invalid(path: &Utf8Path, reason: &dyn std::fmt::Display) -> BinderyError {
    BinderyError::InvalidManifest {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

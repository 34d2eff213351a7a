//! Manifest tree loading
//!
//! Walks the manifest directory, parses every YAML file as a stream of
//! documents and classifies each one by kind. Bindings are cross-referenced
//! against the role they grant while loading.

use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::binding::BindingIndex;
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;
use crate::resource::Resource;

/// Everything read from the manifest tree
#[derive(Debug, Clone, Default)]
pub struct LoadedManifests {
    pub resources: ResourceIndex,
    pub bindings: BindingIndex,
}

/// Loads and classifies the manifests under a directory
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl ManifestLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Skip `path` while walking (e.g. a CSV template stored inside the tree)
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        self.excluded.push(normalize(path.as_ref()));
        self
    }

    /// YAML files under the root, in file-name order at every level
    pub fn manifest_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                BundleError::io(path, err.into())
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !is_yaml_file(path) {
                continue;
            }
            if self.excluded.contains(&normalize(path)) {
                tracing::debug!(path = %path.display(), "skipping excluded file");
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Load every document and build the resource and binding indexes
    ///
    /// Fails on the first document whose kind is not supported.
    pub fn load(&self) -> Result<LoadedManifests> {
        let mut loaded = LoadedManifests::default();

        for path in self.manifest_files()? {
            let content = fs::read_to_string(&path).map_err(|e| BundleError::io(&path, e))?;

            for resource in parse_documents(&content, &path)? {
                tracing::debug!(
                    resource = %resource.display_name(),
                    path = %path.display(),
                    "loaded manifest"
                );
                loaded.bindings.record(&resource)?;
                loaded.resources.insert(resource);
            }
        }

        Ok(loaded)
    }
}

/// Parse a multi-document YAML stream into resources
///
/// Empty documents (a bare `---` or comments only) are skipped.
pub fn parse_documents(content: &str, source: &Path) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = Value::deserialize(document).map_err(|e| BundleError::yaml(source, e))?;
        if value.is_null() {
            continue;
        }
        resources.push(Resource::from_document(value, source, index)?);
    }

    Ok(resources)
}

/// Whether `path` has a YAML extension
pub fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

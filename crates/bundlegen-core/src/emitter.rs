//! Bundle output
//!
//! The bundle is rendered fully in memory first so that nothing is written
//! when any file would fail to serialize or collide with another.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BundleConfig;
use crate::csv::ClusterServiceVersion;
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;

/// A file of the bundle, rendered but not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Rendered bundle: the CSV plus one file per generic resource
#[derive(Debug, Clone)]
pub struct RenderedBundle {
    pub dir: PathBuf,
    pub csv: BundleFile,
    pub resources: Vec<BundleFile>,
}

impl RenderedBundle {
    /// Create the bundle directory and write every file
    pub fn write(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| BundleError::io(&self.dir, e))?;

        for file in std::iter::once(&self.csv).chain(&self.resources) {
            fs::write(&file.path, &file.contents).map_err(|e| BundleError::io(&file.path, e))?;
            tracing::debug!(path = %file.path.display(), "wrote bundle file");
        }

        Ok(())
    }

    /// Paths of every file in the bundle, CSV first
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(&self.csv)
            .chain(&self.resources)
            .map(|f| f.path.as_path())
    }
}

/// `<operator-name>.v<version>.clusterserviceversion.yaml`
pub fn csv_file_name(config: &BundleConfig) -> String {
    format!("{}.clusterserviceversion.yaml", config.csv_name())
}

/// Render the CSV and every resource left in `index`
pub fn render(
    csv: &ClusterServiceVersion,
    index: &ResourceIndex,
    config: &BundleConfig,
) -> Result<RenderedBundle> {
    let dir = config.bundle_dir();

    let csv_file_name = csv_file_name(config);
    let csv = BundleFile {
        path: dir.join(&csv_file_name),
        contents: csv.to_yaml()?,
    };

    let mut seen = HashSet::from([csv_file_name]);
    let mut resources = Vec::with_capacity(index.len());
    for resource in index.iter() {
        let file_name = resource.bundle_file_name();
        if !seen.insert(file_name.clone()) {
            return Err(BundleError::DuplicateResource { file_name });
        }

        let contents = serde_yaml::to_string(resource.document())
            .map_err(|e| BundleError::yaml(resource.source(), e))?;
        resources.push(BundleFile {
            path: dir.join(file_name),
            contents,
        });
    }

    Ok(RenderedBundle {
        dir,
        csv,
        resources,
    })
}

//! Bundle composition settings

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::version::BundleVersion;

/// Default manifest directory, relative to the working directory
pub const DEFAULT_MANIFEST_DIR: &str = "deploy";

/// Settings shared by every composition step
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Operator name, also the default ServiceAccount name
    pub operator_name: String,
    /// Full image reference (`repository:tag`)
    pub image: String,
    /// Version being built
    pub version: BundleVersion,
    /// Version this one replaces
    pub replaces: Option<BundleVersion>,
    /// Versions that may be skipped straight to this one
    pub skips: Vec<BundleVersion>,
    /// Root of the manifest tree
    pub manifest_dir: PathBuf,
    /// Explicit CSV template; when unset the tree must hold exactly one CSV
    pub csv_template: Option<PathBuf>,
    /// Directory the version directory is created in
    pub output_dir: PathBuf,
    /// Compose without writing anything
    pub dry_run: bool,
}

impl BundleConfig {
    pub fn new(
        operator_name: impl Into<String>,
        image: impl Into<String>,
        version: BundleVersion,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            operator_name: operator_name.into(),
            image: image.into(),
            version,
            replaces: None,
            skips: Vec::new(),
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            csv_template: None,
            output_dir: output_dir.into(),
            dry_run: false,
        }
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = dir.into();
        self
    }

    pub fn with_csv_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_template = Some(path.into());
        self
    }

    pub fn with_replaces(mut self, version: BundleVersion) -> Self {
        self.replaces = Some(version);
        self
    }

    /// Parse and set the skip versions
    pub fn with_skips<S: AsRef<str>>(mut self, skips: &[S]) -> Result<Self> {
        self.skips = skips
            .iter()
            .map(|s| BundleVersion::parse(s.as_ref()))
            .collect::<Result<_>>()?;
        Ok(self)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// `<output-dir>/<version>`
    pub fn bundle_dir(&self) -> PathBuf {
        self.output_dir.join(self.version.as_str())
    }

    /// `<operator-name>.v<version>`
    pub fn csv_name(&self) -> String {
        csv_name(&self.operator_name, &self.version)
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }
}

/// `<operator-name>.v<version>`
pub fn csv_name(operator_name: &str, version: &BundleVersion) -> String {
    format!("{operator_name}.v{version}")
}

/// Image reference from repository and tag
pub fn image_reference(image: &str, tag: &str) -> String {
    format!("{image}:{tag}")
}

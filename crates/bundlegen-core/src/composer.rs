//! Bundle composition pipeline
//!
//! Load, classify, fold, stamp and emit, in that order, once per run.
//! Any failure aborts before the first file is written.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::config::BundleConfig;
use crate::crds::owned_crds;
use crate::csv::ClusterServiceVersion;
use crate::deployment::fold_deployment;
use crate::emitter::{self, RenderedBundle};
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;
use crate::loader::ManifestLoader;
use crate::permissions::fold_permissions;
use crate::resource::ResourceKind;
use crate::stamp::stamp;

/// What a composition produced
#[derive(Debug, Clone)]
pub struct BundleReport {
    /// `<output-dir>/<version>`
    pub bundle_dir: PathBuf,
    pub csv_path: PathBuf,
    /// Generic resources copied into the bundle
    pub resource_paths: Vec<PathBuf>,
    pub cluster_permissions: usize,
    pub permissions: usize,
    pub owned_crds: usize,
    /// Nothing was written
    pub dry_run: bool,
}

/// Composes a bundle from a [`BundleConfig`]
#[derive(Debug, Clone)]
pub struct BundleComposer {
    config: BundleConfig,
}

impl BundleComposer {
    pub fn new(config: BundleConfig) -> Self {
        Self { config }
    }

    /// Build the bundle in memory, stamped with `created_at`
    pub fn render(&self, created_at: DateTime<Utc>) -> Result<(RenderedBundle, BundleReport)> {
        let config = &self.config;

        let mut loader = ManifestLoader::new(&config.manifest_dir);
        if let Some(template) = &config.csv_template {
            loader = loader.exclude(template);
        }
        let loaded = loader.load()?;
        let mut index = loaded.resources;
        tracing::info!(
            resources = index.len(),
            dir = %config.manifest_dir.display(),
            "loaded manifests"
        );

        let mut csv = self.resolve_template(&mut index)?;

        let folded = fold_permissions(
            &mut index,
            &loaded.bindings,
            &config.operator_name,
            csv.namespace(),
        )?;
        csv.set_cluster_permissions(&folded.cluster_permissions)?;
        csv.set_permissions(&folded.permissions)?;

        let deployment = fold_deployment(&mut index, &config.image)?;
        csv.set_deployments(&[deployment])?;

        let owned = owned_crds(&index)?;
        csv.set_owned_crds(&owned)?;

        let service_accounts = index.remove_all(ResourceKind::ServiceAccount);
        if !service_accounts.is_empty() {
            tracing::debug!(
                count = service_accounts.len(),
                "dropped ServiceAccounts, the installer creates them from permissions"
            );
        }

        stamp(&mut csv, config, created_at)?;

        let bundle = emitter::render(&csv, &index, config)?;
        let report = BundleReport {
            bundle_dir: bundle.dir.clone(),
            csv_path: bundle.csv.path.clone(),
            resource_paths: bundle.resources.iter().map(|f| f.path.clone()).collect(),
            cluster_permissions: folded.cluster_permissions.len(),
            permissions: folded.permissions.len(),
            owned_crds: owned.len(),
            dry_run: config.dry_run,
        };

        Ok((bundle, report))
    }

    /// Render and, unless dry-running, write the bundle
    pub fn compose(&self, created_at: DateTime<Utc>) -> Result<BundleReport> {
        let (bundle, report) = self.render(created_at)?;

        if self.config.dry_run {
            tracing::info!(dir = %report.bundle_dir.display(), "dry run, nothing written");
        } else {
            bundle.write()?;
            tracing::info!(
                dir = %report.bundle_dir.display(),
                files = report.resource_paths.len() + 1,
                "wrote bundle"
            );
        }

        Ok(report)
    }

    /// The explicit template, or the single CSV found in the manifest tree
    fn resolve_template(&self, index: &mut ResourceIndex) -> Result<ClusterServiceVersion> {
        let in_tree = index.remove_all(ResourceKind::ClusterServiceVersion);

        match (&self.config.csv_template, in_tree.as_slice()) {
            (Some(template), []) => ClusterServiceVersion::load(template),
            (Some(template), found) => Err(BundleError::MultipleCsvTemplates {
                paths: std::iter::once(template.clone())
                    .chain(found.iter().map(|r| r.source().to_path_buf()))
                    .collect(),
            }),
            (None, []) => Err(BundleError::CsvTemplateNotFound),
            (None, [single]) => {
                ClusterServiceVersion::from_value(single.document().clone(), single.source())
            }
            (None, found) => Err(BundleError::MultipleCsvTemplates {
                paths: found.iter().map(|r| r.source().to_path_buf()).collect(),
            }),
        }
    }
}

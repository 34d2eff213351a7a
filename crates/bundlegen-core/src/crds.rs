//! Owned CRD declarations
//!
//! CRDs stay in the index: they are declared as owned in the CSV and also
//! shipped as their own manifests in the bundle.

use serde_yaml::Value;

use crate::csv::OwnedCrd;
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;
use crate::resource::{Resource, ResourceKind};

/// One owned descriptor per version of every CRD in `index`
pub fn owned_crds(index: &ResourceIndex) -> Result<Vec<OwnedCrd>> {
    let mut owned = Vec::new();

    for crd in index.get(ResourceKind::CustomResourceDefinition) {
        let spec = crd.document().get("spec");
        let kind = spec
            .and_then(|s| s.get("names"))
            .and_then(|n| n.get("kind"))
            .and_then(Value::as_str)
            .ok_or_else(|| missing(crd, "spec.names.kind"))?;

        for version in versions(crd)? {
            owned.push(OwnedCrd {
                name: crd.name().to_string(),
                description: kind.to_string(),
                display_name: kind.to_string(),
                kind: kind.to_string(),
                version,
            });
        }
        tracing::debug!(crd = %crd.name(), kind, "declared owned CRD");
    }

    Ok(owned)
}

/// Served version names: `spec.versions[].name`, or the legacy `spec.version`
fn versions(crd: &Resource) -> Result<Vec<String>> {
    let spec = crd.document().get("spec");

    if let Some(versions) = spec.and_then(|s| s.get("versions")).and_then(Value::as_sequence) {
        return versions
            .iter()
            .map(|v| {
                v.get("name")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| missing(crd, "spec.versions[].name"))
            })
            .collect();
    }

    spec.and_then(|s| s.get("version"))
        .and_then(Value::as_str)
        .map(|v| vec![v.to_string()])
        .ok_or_else(|| missing(crd, "spec.versions"))
}

fn missing(crd: &Resource, field: &'static str) -> BundleError {
    BundleError::MissingField {
        field,
        path: crd.source().to_path_buf(),
        index: crd.index(),
    }
}

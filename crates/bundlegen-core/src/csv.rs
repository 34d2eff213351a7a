//! ClusterServiceVersion document
//!
//! The CSV is loaded once from its template, mutated in place by the
//! folding steps and serialized exactly once at the end. Only the sections
//! the composer writes are typed; everything else in the template is
//! carried through untouched.

use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};

/// Kind of an OpenShift template wrapping the CSV in `objects`
const TEMPLATE_KIND: &str = "Template";
const CSV_KIND: &str = "ClusterServiceVersion";

/// Rules granted to a ServiceAccount
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub rules: Vec<PolicyRule>,
    pub service_account_name: String,
}

/// A CRD version declared as owned by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCrd {
    pub name: String,
    pub description: String,
    pub display_name: String,
    pub kind: String,
    pub version: String,
}

/// Entry of `spec.install.spec.deployments`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallDeployment {
    pub name: String,
    pub spec: Value,
}

/// The CSV being composed
#[derive(Debug, Clone)]
pub struct ClusterServiceVersion {
    document: Value,
    source: PathBuf,
}

impl ClusterServiceVersion {
    /// Read a template file holding a single CSV (or a Template wrapping one)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|e| BundleError::yaml(path, e))?;
        Self::from_value(document, path)
    }

    /// Validate a parsed template
    pub fn from_value(document: Value, source: &Path) -> Result<Self> {
        let invalid = |message: &str| BundleError::InvalidCsvTemplate {
            path: source.to_path_buf(),
            message: message.to_string(),
        };

        let is_template = document.get("kind").and_then(Value::as_str) == Some(TEMPLATE_KIND);
        let mut document = if is_template {
            document
                .get("objects")
                .and_then(Value::as_sequence)
                .and_then(|objects| objects.first())
                .cloned()
                .ok_or_else(|| invalid("template has no objects"))?
        } else {
            document
        };

        if document.get("kind").and_then(Value::as_str) != Some(CSV_KIND) {
            return Err(invalid("document is not a ClusterServiceVersion"));
        }
        if !document.get("metadata").is_some_and(Value::is_mapping) {
            return Err(invalid("missing metadata"));
        }
        if mapping_at(&mut document, &["spec", "install", "spec"]).is_none() {
            return Err(invalid("spec.install.spec is not a mapping"));
        }

        Ok(Self {
            document,
            source: source.to_path_buf(),
        })
    }

    /// Path the template was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    /// Namespace the operator is installed into
    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.document
            .get("metadata")
            .and_then(|m| m.get("annotations"))
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.document
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
    }

    pub fn set_owned_crds(&mut self, owned: &[OwnedCrd]) -> Result<()> {
        let value = self.to_value(owned)?;
        self.section(&["spec", "customresourcedefinitions"])?
            .insert("owned".into(), value);
        Ok(())
    }

    pub fn set_cluster_permissions(&mut self, permissions: &[Permission]) -> Result<()> {
        self.set_install_list("clusterPermissions", permissions)
    }

    pub fn set_permissions(&mut self, permissions: &[Permission]) -> Result<()> {
        self.set_install_list("permissions", permissions)
    }

    pub fn set_deployments(&mut self, deployments: &[InstallDeployment]) -> Result<()> {
        self.set_install_list("deployments", deployments)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.section(&["metadata"])?
            .insert("name".into(), name.into());
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.section(&["spec"])?
            .insert("version".into(), version.into());
        Ok(())
    }

    pub fn set_replaces(&mut self, replaces: &str) -> Result<()> {
        self.section(&["spec"])?
            .insert("replaces".into(), replaces.into());
        Ok(())
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) -> Result<()> {
        self.section(&["metadata", "annotations"])?
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Serialize the whole document
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.document).map_err(|e| BundleError::yaml(&self.source, e))
    }

    fn set_install_list<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<()> {
        let value = self.to_value(items)?;
        self.section(&["spec", "install", "spec"])?
            .insert(key.into(), value);
        Ok(())
    }

    fn to_value<T: Serialize + ?Sized>(&self, item: &T) -> Result<Value> {
        serde_yaml::to_value(item).map_err(|e| BundleError::yaml(&self.source, e))
    }

    fn section(&mut self, path: &[&str]) -> Result<&mut Mapping> {
        let source = self.source.clone();
        mapping_at(&mut self.document, path).ok_or_else(|| BundleError::InvalidCsvTemplate {
            path: source,
            message: format!("{} is not a mapping", path.join(".")),
        })
    }
}

/// Walk `path`, creating missing (or null) mappings on the way
///
/// Returns `None` when an existing value on the path is not a mapping.
fn mapping_at<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Mapping> {
    let mut current = value;
    for key in path {
        if current.is_null() {
            *current = Value::Mapping(Mapping::new());
        }
        current = current
            .as_mapping_mut()?
            .entry(Value::from(*key))
            .or_insert(Value::Null);
    }
    if current.is_null() {
        *current = Value::Mapping(Mapping::new());
    }
    current.as_mapping_mut()
}

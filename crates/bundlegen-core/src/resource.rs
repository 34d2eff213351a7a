//! Resource documents and the supported kind allow-list
//!
//! A [`Resource`] is an open record: the header every Kubernetes object
//! shares (`kind`, `metadata.name`, `metadata.namespace`) is validated when
//! the document is loaded, while the full document is kept untouched so that
//! resources copied into the bundle keep every field they declared.

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BundleError, Result};

/// Kinds the operator registry accepts in a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    ClusterServiceVersion,
    CustomResourceDefinition,
    Deployment,
    Secret,
    ClusterRole,
    ClusterRoleBinding,
    ConfigMap,
    ServiceAccount,
    Service,
    Role,
    RoleBinding,
    PrometheusRule,
    ServiceMonitor,
    PodDisruptionBudget,
    PriorityClass,
    VerticalPodAutoscaler,
    ConsoleYamlSample,
}

impl ResourceKind {
    /// Every supported kind
    pub const ALL: [ResourceKind; 17] = [
        Self::ClusterServiceVersion,
        Self::CustomResourceDefinition,
        Self::Deployment,
        Self::Secret,
        Self::ClusterRole,
        Self::ClusterRoleBinding,
        Self::ConfigMap,
        Self::ServiceAccount,
        Self::Service,
        Self::Role,
        Self::RoleBinding,
        Self::PrometheusRule,
        Self::ServiceMonitor,
        Self::PodDisruptionBudget,
        Self::PriorityClass,
        Self::VerticalPodAutoscaler,
        Self::ConsoleYamlSample,
    ];

    /// The kind as written in manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterServiceVersion => "ClusterServiceVersion",
            Self::CustomResourceDefinition => "CustomResourceDefinition",
            Self::Deployment => "Deployment",
            Self::Secret => "Secret",
            Self::ClusterRole => "ClusterRole",
            Self::ClusterRoleBinding => "ClusterRoleBinding",
            Self::ConfigMap => "ConfigMap",
            Self::ServiceAccount => "ServiceAccount",
            Self::Service => "Service",
            Self::Role => "Role",
            Self::RoleBinding => "RoleBinding",
            Self::PrometheusRule => "PrometheusRule",
            Self::ServiceMonitor => "ServiceMonitor",
            Self::PodDisruptionBudget => "PodDisruptionBudget",
            Self::PriorityClass => "PriorityClass",
            Self::VerticalPodAutoscaler => "VerticalPodAutoscaler",
            Self::ConsoleYamlSample => "ConsoleYamlSample",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind outside the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resource kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A manifest document loaded from the manifest tree
#[derive(Debug, Clone)]
pub struct Resource {
    kind: ResourceKind,
    name: String,
    namespace: Option<String>,
    document: Value,
    source: PathBuf,
    index: usize,
}

impl Resource {
    /// Validate the header of a parsed document and wrap it
    ///
    /// `index` is the position of the document in its YAML stream.
    pub fn from_document(document: Value, source: &Path, index: usize) -> Result<Self> {
        let missing = |field| BundleError::MissingField {
            field,
            path: source.to_path_buf(),
            index,
        };

        let kind = document
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("kind"))?;

        let metadata = document.get("metadata");
        let name = metadata.and_then(|m| m.get("name")).and_then(Value::as_str);

        let kind = kind
            .parse::<ResourceKind>()
            .map_err(|UnknownKind(kind)| BundleError::UnsupportedKind {
                kind,
                name: name.unwrap_or("<unnamed>").to_string(),
                path: source.to_path_buf(),
            })?;

        let name = name.ok_or_else(|| missing("metadata.name"))?.to_string();
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Self {
            kind,
            name,
            namespace,
            document,
            source: source.to_path_buf(),
            index,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The full document as loaded
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// File the document was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Position of the document within its file
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this resource is identified by `name` and `namespace`
    pub fn is(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// `Kind/namespace/name` for messages
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", self.kind, ns, self.name),
            None => format!("{}/{}", self.kind, self.name),
        }
    }

    /// Name of the file this resource is copied to in the bundle
    pub fn bundle_file_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}_{}_{}.yaml", self.kind, ns, self.name),
            None => format!("{}_{}.yaml", self.kind, self.name),
        }
    }

    /// Deserialize the top-level field `key`, `None` when absent or null
    ///
    /// Only the field is read, so the document's `apiVersion` is never
    /// checked against a particular API group version.
    pub fn field_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.document.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| BundleError::yaml(&self.source, e)),
        }
    }
}

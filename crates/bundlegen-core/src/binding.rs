//! Cross-reference of bindings by the role they grant

use k8s_openapi::api::rbac::v1::{RoleRef, Subject};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::resource::{Resource, ResourceKind};

/// Subject kind the installer can materialize
pub const SERVICE_ACCOUNT: &str = "ServiceAccount";

/// A RoleBinding or ClusterRoleBinding reduced to what folding needs
#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
    /// Name of the Role or ClusterRole granted
    pub role_name: String,
    pub subjects: Vec<Subject>,
    pub source: PathBuf,
}

impl Binding {
    /// Build from a binding resource. Returns `None` for other kinds.
    pub fn from_resource(resource: &Resource) -> Result<Option<Self>> {
        if !matches!(
            resource.kind(),
            ResourceKind::ClusterRoleBinding | ResourceKind::RoleBinding
        ) {
            return Ok(None);
        }

        let role_ref: RoleRef =
            resource
                .field_as("roleRef")?
                .ok_or_else(|| BundleError::MissingField {
                    field: "roleRef",
                    path: resource.source().to_path_buf(),
                    index: resource.index(),
                })?;
        let subjects: Option<Vec<Subject>> = resource.field_as("subjects")?;

        Ok(Some(Self {
            kind: resource.kind(),
            name: resource.name().to_string(),
            namespace: resource.namespace().map(String::from),
            role_name: role_ref.name,
            subjects: subjects.unwrap_or_default(),
            source: resource.source().to_path_buf(),
        }))
    }

    /// First subject of kind ServiceAccount
    pub fn first_service_account(&self) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.kind == SERVICE_ACCOUNT)
    }

    /// The only subject, if it is a ServiceAccount
    pub fn sole_service_account(&self) -> Option<&Subject> {
        match self.subjects.as_slice() {
            [subject] if subject.kind == SERVICE_ACCOUNT => Some(subject),
            _ => None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", self.kind, ns, self.name),
            None => format!("{}/{}", self.kind, self.name),
        }
    }
}

/// Bindings keyed by the name of the role they reference
#[derive(Debug, Clone, Default)]
pub struct BindingIndex {
    cluster_role_bindings: HashMap<String, Binding>,
    role_bindings: HashMap<String, Binding>,
}

impl BindingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `resource` if it is a binding
    ///
    /// A second binding referencing an already bound role is rejected: only
    /// one of them could be folded, the other would surface as an orphan.
    pub fn record(&mut self, resource: &Resource) -> Result<()> {
        let Some(binding) = Binding::from_resource(resource)? else {
            return Ok(());
        };

        let map = match binding.kind {
            ResourceKind::ClusterRoleBinding => &mut self.cluster_role_bindings,
            _ => &mut self.role_bindings,
        };

        if let Some(existing) = map.get(&binding.role_name) {
            return Err(BundleError::AmbiguousBinding {
                kind: binding.kind.as_str(),
                role: binding.role_name.clone(),
                first: existing.display_name(),
                second: binding.display_name(),
            });
        }

        tracing::debug!(
            binding = %binding.display_name(),
            role = %binding.role_name,
            "indexed binding"
        );
        map.insert(binding.role_name.clone(), binding);
        Ok(())
    }

    /// ClusterRoleBinding granting the ClusterRole `role`
    pub fn cluster_role_binding(&self, role: &str) -> Option<&Binding> {
        self.cluster_role_bindings.get(role)
    }

    /// RoleBinding granting the Role `role`
    pub fn role_binding(&self, role: &str) -> Option<&Binding> {
        self.role_bindings.get(role)
    }

    pub fn len(&self) -> usize {
        self.cluster_role_bindings.len() + self.role_bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

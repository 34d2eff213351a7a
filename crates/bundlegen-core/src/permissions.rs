//! Folding of Roles and ClusterRoles into CSV permissions
//!
//! ClusterRoles become `clusterPermissions`, Roles become `permissions`.
//! A folded role and its binding are trimmed from the index; any binding
//! still present afterwards is an orphan and aborts the composition.

use k8s_openapi::api::rbac::v1::PolicyRule;

use crate::binding::{Binding, BindingIndex};
use crate::csv::Permission;
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;
use crate::resource::{Resource, ResourceKind};

/// Permissions extracted from the manifest tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldedPermissions {
    pub cluster_permissions: Vec<Permission>,
    pub permissions: Vec<Permission>,
}

/// Fold every ClusterRole and Role in `index` into permission entries
///
/// `operator_name` is the ServiceAccount used for a ClusterRole nobody
/// binds. `csv_namespace` is required as soon as a Role is present.
pub fn fold_permissions(
    index: &mut ResourceIndex,
    bindings: &BindingIndex,
    operator_name: &str,
    csv_namespace: Option<&str>,
) -> Result<FoldedPermissions> {
    let mut folded = FoldedPermissions::default();

    for role in index.get(ResourceKind::ClusterRole).to_vec() {
        let binding = bindings.cluster_role_binding(role.name());
        let service_account = match binding {
            None => operator_name.to_string(),
            Some(binding) => binding
                .first_service_account()
                .map(|subject| subject.name.clone())
                .ok_or_else(|| missing_subject(binding))?,
        };

        let rules = role_rules(&role)?;
        tracing::debug!(
            role = %role.name(),
            service_account = %service_account,
            rules = rules.len(),
            "folded ClusterRole"
        );
        folded.cluster_permissions.push(Permission {
            rules,
            service_account_name: service_account,
        });
        trim(index, &role, binding);
    }

    let roles = index.get(ResourceKind::Role).to_vec();
    if !roles.is_empty() {
        let namespace = csv_namespace.ok_or(BundleError::MissingNamespace)?;

        for role in roles {
            let binding =
                bindings
                    .role_binding(role.name())
                    .ok_or_else(|| BundleError::MissingRoleBinding {
                        name: role.name().to_string(),
                        path: role.source().to_path_buf(),
                    })?;

            let Some(subject) = binding.sole_service_account().filter(|subject| {
                subject.namespace.as_deref().unwrap_or(namespace) == namespace
            }) else {
                tracing::warn!(
                    role = %role.name(),
                    binding = %binding.display_name(),
                    namespace,
                    "RoleBinding needs exactly one ServiceAccount subject in the CSV namespace; leaving pair unfolded"
                );
                continue;
            };

            let rules = role_rules(&role)?;
            tracing::debug!(
                role = %role.name(),
                service_account = %subject.name,
                rules = rules.len(),
                "folded Role"
            );
            folded.permissions.push(Permission {
                rules,
                service_account_name: subject.name.clone(),
            });
            trim(index, &role, Some(binding));
        }
    }

    let orphans: Vec<String> = index
        .get(ResourceKind::ClusterRoleBinding)
        .iter()
        .chain(index.get(ResourceKind::RoleBinding))
        .map(Resource::display_name)
        .collect();
    if !orphans.is_empty() {
        return Err(BundleError::OrphanBindings { bindings: orphans });
    }

    Ok(folded)
}

/// `rules` of a Role or ClusterRole, whatever its RBAC API version
fn role_rules(role: &Resource) -> Result<Vec<PolicyRule>> {
    Ok(role.field_as("rules")?.unwrap_or_default())
}

fn trim(index: &mut ResourceIndex, role: &Resource, binding: Option<&Binding>) {
    index.remove_one(role.kind(), role.name(), role.namespace());
    if let Some(binding) = binding {
        index.remove_one(binding.kind, &binding.name, binding.namespace.as_deref());
    }
}

fn missing_subject(binding: &Binding) -> BundleError {
    BundleError::MissingSubject {
        kind: binding.kind.as_str(),
        name: binding.name.clone(),
        path: binding.source().to_path_buf(),
    }
}

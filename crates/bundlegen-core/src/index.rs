//! Resource index grouped by kind
//!
//! Documents are folded into the CSV and then trimmed from the index, so
//! whatever is left once the pipeline finishes is the set of generic
//! resources copied into the bundle verbatim.

use indexmap::IndexMap;

use crate::resource::{Resource, ResourceKind};

/// Resources grouped by kind, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    by_kind: IndexMap<ResourceKind, Vec<Resource>>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource after the others of its kind
    pub fn insert(&mut self, resource: Resource) {
        self.by_kind
            .entry(resource.kind())
            .or_default()
            .push(resource);
    }

    /// Resources of `kind`, in load order
    pub fn get(&self, kind: ResourceKind) -> &[Resource] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.get(kind).len()
    }

    /// Remove one resource by identity. No-op if absent.
    pub fn remove_one(
        &mut self,
        kind: ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Option<Resource> {
        let resources = self.by_kind.get_mut(&kind)?;
        let position = resources.iter().position(|r| r.is(name, namespace))?;
        let removed = resources.remove(position);

        if resources.is_empty() {
            self.by_kind.shift_remove(&kind);
        }

        Some(removed)
    }

    /// Remove every resource of `kind`. No-op if absent.
    pub fn remove_all(&mut self, kind: ResourceKind) -> Vec<Resource> {
        self.by_kind.shift_remove(&kind).unwrap_or_default()
    }

    /// All resources, kinds in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.by_kind.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

//! Error types for bundle composition
//!
//! Every failure is fatal: the composer aborts and nothing is written.
//! Variants carry enough context (kind, name, source path) to locate the
//! offending manifest without re-running in debug mode.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for bundle operations
pub type Result<T> = std::result::Result<T, BundleError>;

/// Errors raised while loading manifests or composing the bundle
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum BundleError {
    /// A document's kind is outside the supported allow-list
    #[error("unsupported resource kind '{kind}' ({name}) in {path}")]
    #[diagnostic(
        code(bundlegen::manifest::unsupported_kind),
        help("the operator registry only ingests a fixed set of kinds; move this manifest out of the bundle source tree")
    )]
    UnsupportedKind {
        kind: String,
        name: String,
        path: PathBuf,
    },

    /// A document lacks a field every resource must declare
    #[error("document #{index} in {path} is missing required field '{field}'")]
    #[diagnostic(code(bundlegen::manifest::missing_field))]
    MissingField {
        field: &'static str,
        path: PathBuf,
        index: usize,
    },

    /// A binding has no ServiceAccount subject
    #[error("{kind} '{name}' in {path} has no ServiceAccount subject")]
    #[diagnostic(
        code(bundlegen::rbac::missing_subject),
        help("add a subject with kind: ServiceAccount to the binding")
    )]
    MissingSubject {
        kind: &'static str,
        name: String,
        path: PathBuf,
    },

    /// A Role exists without a RoleBinding referencing it
    #[error("Role '{name}' in {path} has no RoleBinding")]
    #[diagnostic(
        code(bundlegen::rbac::missing_role_binding),
        help("every Role must be bound to the operator ServiceAccount by a RoleBinding")
    )]
    MissingRoleBinding { name: String, path: PathBuf },

    /// Two bindings reference the same role name
    #[error("{kind} '{first}' and '{second}' both reference role '{role}'")]
    #[diagnostic(
        code(bundlegen::rbac::ambiguous_binding),
        help("bind each role exactly once; merge the subjects into a single binding")
    )]
    AmbiguousBinding {
        kind: &'static str,
        role: String,
        first: String,
        second: String,
    },

    /// Bindings left over after folding permissions
    #[error("orphan bindings are not supported: {}", .bindings.join(", "))]
    #[diagnostic(
        code(bundlegen::rbac::orphan_bindings),
        help("a RoleBinding is only folded when it has exactly one ServiceAccount subject in the CSV namespace")
    )]
    OrphanBindings { bindings: Vec<String> },

    /// The CSV template declares no namespace
    #[error("CSV template has no metadata.namespace")]
    #[diagnostic(
        code(bundlegen::csv::missing_namespace),
        help("the namespace is needed to resolve ServiceAccount namespaces of RoleBindings")
    )]
    MissingNamespace,

    /// No Deployment in the manifest tree
    #[error("at least one Deployment is required")]
    #[diagnostic(code(bundlegen::deployment::missing))]
    MissingDeployment,

    /// More than one Deployment in the manifest tree
    #[error("multiple Deployments not supported: {}", .names.join(", "))]
    #[diagnostic(code(bundlegen::deployment::multiple))]
    MultipleDeployments { names: Vec<String> },

    /// The Deployment cannot carry the operator image
    #[error("Deployment '{name}' in {path} is invalid: {message}")]
    #[diagnostic(code(bundlegen::deployment::invalid))]
    InvalidDeployment {
        name: String,
        path: PathBuf,
        message: String,
    },

    /// Version string does not have the major.minor.commitcount-hash shape
    #[error("invalid version '{version}': {message}")]
    #[diagnostic(
        code(bundlegen::version::invalid),
        help("versions look like 0.1.189-3f73a592 (major.minor.commitcount-hash)")
    )]
    InvalidVersion { version: String, message: String },

    /// No CSV template was given and none was found in the manifest tree
    #[error("no ClusterServiceVersion template found")]
    #[diagnostic(
        code(bundlegen::csv::template_not_found),
        help("pass --csv-template or place a ClusterServiceVersion in the manifest directory")
    )]
    CsvTemplateNotFound,

    /// More than one CSV template candidate
    #[error("multiple CSV templates not supported: {}", join_paths(.paths))]
    #[diagnostic(code(bundlegen::csv::multiple_templates))]
    MultipleCsvTemplates { paths: Vec<PathBuf> },

    /// The CSV template lacks a required section
    #[error("invalid CSV template {path}: {message}")]
    #[diagnostic(code(bundlegen::csv::invalid_template))]
    InvalidCsvTemplate { path: PathBuf, message: String },

    /// Two leftover resources would be written to the same file
    #[error("resources would overwrite each other in {file_name}")]
    #[diagnostic(
        code(bundlegen::emit::duplicate),
        help("(kind, namespace, name) must identify a resource uniquely")
    )]
    DuplicateResource { file_name: String },

    /// YAML parse or serialization failure
    #[error("YAML error in {path}: {source}")]
    #[diagnostic(code(bundlegen::yaml))]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Filesystem failure
    #[error("IO error on {path}: {source}")]
    #[diagnostic(code(bundlegen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    /// Whether the error stems from the input manifests or template rather
    /// than from the relationships between resources
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind { .. }
                | Self::MissingField { .. }
                | Self::Yaml { .. }
                | Self::CsvTemplateNotFound
                | Self::MultipleCsvTemplates { .. }
                | Self::InvalidCsvTemplate { .. }
        )
    }

    /// Whether the error is a filesystem failure
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

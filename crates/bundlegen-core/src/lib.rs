//! Bundlegen Core - Operator Lifecycle Manager bundle composition
//!
//! This crate turns a tree of plain Kubernetes manifests plus a
//! ClusterServiceVersion (CSV) template into an OLM bundle directory:
//! - `ManifestLoader`: walks the tree and classifies documents by kind
//! - `fold_permissions`: ClusterRoles and Roles become CSV permission entries
//! - `fold_deployment`: the operator Deployment becomes the install strategy
//! - `owned_crds`: CRDs are declared as owned by the CSV
//! - `BundleComposer`: runs the whole pipeline and writes `<out>/<version>/`
//!
//! # Example
//!
//! ```no_run
//! use bundlegen_core::{BundleComposer, BundleConfig, BundleVersion};
//!
//! let version = BundleVersion::parse("0.1.42-3f73a592").unwrap();
//! let config = BundleConfig::new("demo-operator", "quay.io/acme/demo:v1", version, "bundles")
//!     .with_manifest_dir("deploy")
//!     .with_csv_template("hack/csv-template.yaml");
//!
//! let report = BundleComposer::new(config)
//!     .compose(chrono::Utc::now())
//!     .unwrap();
//! println!("wrote {}", report.csv_path.display());
//! ```

pub mod binding;
pub mod composer;
pub mod config;
pub mod crds;
pub mod csv;
pub mod deployment;
pub mod emitter;
pub mod error;
pub mod index;
pub mod loader;
pub mod permissions;
pub mod resource;
pub mod stamp;
pub mod validate;
pub mod version;

pub use binding::{Binding, BindingIndex};
pub use composer::{BundleComposer, BundleReport};
pub use config::{BundleConfig, DEFAULT_MANIFEST_DIR, csv_name, image_reference};
pub use crds::owned_crds;
pub use csv::{ClusterServiceVersion, InstallDeployment, OwnedCrd, Permission};
pub use deployment::{OPERATOR_IMAGE_ENV, fold_deployment};
pub use emitter::{BundleFile, RenderedBundle};
pub use error::{BundleError, Result};
pub use index::ResourceIndex;
pub use loader::{LoadedManifests, ManifestLoader, parse_documents};
pub use permissions::{FoldedPermissions, fold_permissions};
pub use resource::{Resource, ResourceKind};
pub use stamp::stamp;
pub use validate::{FileValidation, ValidationReport, validate_paths};
pub use version::{BundleVersion, DEFAULT_VERSION_BASE, skip_range};

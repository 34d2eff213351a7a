//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - `validate` found files that are not valid YAML
pub const VALIDATION_ERROR: i32 = 2;

/// Manifest error - unsupported kind, unparsable YAML, bad CSV template
pub const MANIFEST_ERROR: i32 = 3;

/// Composition error - RBAC, Deployment or version invariants violated
pub const COMPOSITION_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use bundlegen_core::BundleError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Failure reported by the composer
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bundle(#[from] BundleError),

    /// Some files passed to `validate` are not valid YAML
    #[error("Validation failed: {failed} of {total} file(s) did not pass")]
    #[diagnostic(code(bundlegen::cli::validation))]
    Validation { failed: usize, total: usize },

    /// Invalid combination of arguments
    #[error("{message}")]
    #[diagnostic(code(bundlegen::cli::usage))]
    Usage { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(bundlegen::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Bundle(err) if err.is_io_error() => exit_codes::IO_ERROR,
            CliError::Bundle(err) if err.is_manifest_error() => exit_codes::MANIFEST_ERROR,
            CliError::Bundle(_) => exit_codes::COMPOSITION_ERROR,
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let io = CliError::from(BundleError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        });
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);

        let manifest = CliError::from(BundleError::CsvTemplateNotFound);
        assert_eq!(manifest.exit_code(), exit_codes::MANIFEST_ERROR);

        let composition = CliError::from(BundleError::MissingDeployment);
        assert_eq!(composition.exit_code(), exit_codes::COMPOSITION_ERROR);

        let validation = CliError::Validation {
            failed: 1,
            total: 3,
        };
        assert_eq!(validation.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(CliError::usage("bad").exit_code(), exit_codes::USAGE_ERROR);
    }
}

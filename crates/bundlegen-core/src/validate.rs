//! YAML syntax validation
//!
//! Checks that manifest files parse as multi-document YAML streams without
//! interpreting their contents.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::is_yaml_file;

/// Outcome for a single file or path argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileValidation {
    pub path: PathBuf,
    /// Number of documents parsed; zero when the file failed
    pub documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of validating a set of paths
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files: Vec<FileValidation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.files.iter().all(FileValidation::is_valid)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileValidation> {
        self.files.iter().filter(|f| !f.is_valid())
    }
}

/// Validate every YAML file named by `paths`
///
/// Directories contribute their immediate YAML children in file-name order.
/// A path that does not exist is reported as a failure.
pub fn validate_paths<P: AsRef<Path>>(paths: &[P]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            if is_yaml_file(path) {
                report.files.push(validate_file(path));
            }
        } else if path.is_dir() {
            match yaml_children(path) {
                Ok(children) => report.files.extend(children.iter().map(|p| validate_file(p))),
                Err(e) => report.files.push(failure(path, e.to_string())),
            }
        } else {
            report
                .files
                .push(failure(path, "path does not exist".to_string()));
        }
    }

    report
}

/// Parse `path` as a stream of YAML documents
pub fn validate_file(path: &Path) -> FileValidation {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return failure(path, e.to_string()),
    };

    match count_documents(&content) {
        Ok(documents) => {
            tracing::debug!(path = %path.display(), documents, "valid YAML");
            FileValidation {
                path: path.to_path_buf(),
                documents,
                error: None,
            }
        }
        Err(e) => failure(path, e.to_string()),
    }
}

fn count_documents(content: &str) -> Result<usize, serde_yaml::Error> {
    let mut count = 0;
    for document in serde_yaml::Deserializer::from_str(content) {
        Value::deserialize(document)?;
        count += 1;
    }
    Ok(count)
}

fn yaml_children(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_yaml_file(&path) {
            children.push(path);
        }
    }
    children.sort();
    Ok(children)
}

fn failure(path: &Path, error: String) -> FileValidation {
    tracing::debug!(path = %path.display(), %error, "invalid YAML");
    FileValidation {
        path: path.to_path_buf(),
        documents: 0,
        error: Some(error),
    }
}

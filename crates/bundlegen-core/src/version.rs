//! Bundle versions
//!
//! Operator versions have the shape `major.minor.commitcount-hash`
//! (e.g. `0.1.189-3f73a592`). The numeric triple follows SemVer rules; the
//! commit hash after the first `-` is opaque, so all-digit hashes with a
//! leading zero are accepted.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{BundleError, Result};

/// Version base used when composing a version from commit information
pub const DEFAULT_VERSION_BASE: &str = "0.1";

/// A validated operator version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleVersion {
    raw: String,
    /// `major.minor.commitcount`
    core: Version,
}

impl BundleVersion {
    /// Parse and validate a version string
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |message: String| BundleError::InvalidVersion {
            version: raw.to_string(),
            message,
        };

        let (core, hash) = raw
            .split_once('-')
            .ok_or_else(|| invalid("missing '-<commit hash>' suffix".to_string()))?;
        if hash.is_empty() {
            return Err(invalid("empty commit hash".to_string()));
        }

        let core = Version::parse(core).map_err(|e| invalid(e.to_string()))?;
        if !core.build.is_empty() {
            return Err(invalid("unexpected build metadata".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            core,
        })
    }

    /// Compose `<base>.<commit_number>-<commit_hash>`
    pub fn from_commit(base: &str, commit_number: &str, commit_hash: &str) -> Result<Self> {
        Self::parse(&format!("{base}.{commit_number}-{commit_hash}"))
    }

    /// Number of commits the version was cut at
    pub fn commit_count(&self) -> u64 {
        self.core.patch
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Order by commit count only; equal counts compare equal
pub fn by_commit_count(a: &BundleVersion, b: &BundleVersion) -> Ordering {
    a.commit_count().cmp(&b.commit_count())
}

/// Value of the `olm.skipRange` annotation for `skips`
///
/// Versions are ordered by commit count (numerically, stable for ties) and
/// joined with `" || "`. Returns `None` when there is nothing to skip.
pub fn skip_range(skips: &[BundleVersion]) -> Option<String> {
    if skips.is_empty() {
        return None;
    }

    let mut sorted: Vec<&BundleVersion> = skips.iter().collect();
    sorted.sort_by(|a, b| by_commit_count(a, b));

    Some(
        sorted
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" || "),
    )
}

//! CSV metadata stamping

use chrono::{DateTime, Utc};

use crate::config::{BundleConfig, csv_name};
use crate::csv::ClusterServiceVersion;
use crate::error::Result;
use crate::version::skip_range;

/// Format of the `createdAt` annotation
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const CREATED_AT_ANNOTATION: &str = "createdAt";
pub const SKIP_RANGE_ANNOTATION: &str = "olm.skipRange";
pub const CONTAINER_IMAGE_ANNOTATION: &str = "containerImage";

/// Stamp name, version, upgrade edges, image and creation time onto `csv`
pub fn stamp(
    csv: &mut ClusterServiceVersion,
    config: &BundleConfig,
    created_at: DateTime<Utc>,
) -> Result<()> {
    csv.set_name(&config.csv_name())?;
    csv.set_version(config.version.as_str())?;

    if let Some(replaces) = &config.replaces {
        csv.set_replaces(&csv_name(&config.operator_name, replaces))?;
    }

    if let Some(range) = skip_range(&config.skips) {
        csv.set_annotation(SKIP_RANGE_ANNOTATION, &range)?;
    }

    csv.set_annotation(CONTAINER_IMAGE_ANNOTATION, &config.image)?;
    csv.set_annotation(
        CREATED_AT_ANNOTATION,
        &created_at.format(CREATED_AT_FORMAT).to_string(),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::BundleVersion;
    use chrono::TimeZone;
    use std::path::Path;

    fn csv() -> ClusterServiceVersion {
        ClusterServiceVersion::from_value(
            serde_yaml::from_str(
                "kind: ClusterServiceVersion\nmetadata:\n  name: template\nspec:\n  install:\n    spec: {}\n",
            )
            .unwrap(),
            Path::new("csv.yaml"),
        )
        .unwrap()
    }

    fn config() -> BundleConfig {
        BundleConfig::new(
            "demo-operator",
            "quay.io/acme/demo:abc",
            BundleVersion::parse("1.2.3-abcd").unwrap(),
            "out",
        )
    }

    #[test]
    fn test_stamp_all_fields() {
        let mut csv = csv();
        let config = config()
            .with_replaces(BundleVersion::parse("1.2.2-xyz").unwrap())
            .with_skips(&["1.2.3-abcd", "1.2.10-efgh", "1.2.2-xyz"])
            .unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        stamp(&mut csv, &config, created_at).unwrap();

        let doc = csv.document();
        assert_eq!(csv.name(), Some("demo-operator.v1.2.3-abcd"));
        assert_eq!(doc["spec"]["version"].as_str(), Some("1.2.3-abcd"));
        assert_eq!(
            doc["spec"]["replaces"].as_str(),
            Some("demo-operator.v1.2.2-xyz")
        );
        assert_eq!(
            csv.annotation(SKIP_RANGE_ANNOTATION),
            Some("1.2.2-xyz || 1.2.3-abcd || 1.2.10-efgh")
        );
        assert_eq!(
            csv.annotation(CONTAINER_IMAGE_ANNOTATION),
            Some("quay.io/acme/demo:abc")
        );
        assert_eq!(
            csv.annotation(CREATED_AT_ANNOTATION),
            Some("2024-03-09T07:05:01Z")
        );
    }

    #[test]
    fn test_optional_fields_left_out() {
        let mut csv = csv();
        stamp(&mut csv, &config(), Utc::now()).unwrap();

        assert!(csv.document()["spec"].get("replaces").is_none());
        assert!(csv.annotation(SKIP_RANGE_ANNOTATION).is_none());
    }
}

//! Integration tests for CLI commands

use std::path::Path;
use std::process::Command;

/// Helper to run bundlegen command
fn bundlegen(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_bundlegen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute bundlegen")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn read_yaml(path: &Path) -> serde_yaml::Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_yaml::from_str(&content).expect("Output should be valid YAML")
}

mod generate_command {
    use super::*;
    use tempfile::TempDir;

    fn generate(out: &Path, extra: &[&str]) -> std::process::Output {
        let manifests = format!("{}/demo-operator/deploy", fixtures_path());
        let template = format!("{}/demo-operator/csv-template.yaml", fixtures_path());
        let out = out.to_string_lossy().to_string();

        let mut args = vec![
            "generate",
            "--name",
            "demo-operator",
            "--output-dir",
            &out,
            "--image",
            "quay.io/acme/demo-operator",
            "--image-tag",
            "v1.2.3",
            "--manifest-dir",
            &manifests,
            "--csv-template",
            &template,
        ];
        args.extend_from_slice(extra);
        bundlegen(&args)
    }

    #[test]
    fn test_generate_demo_operator() {
        let out = TempDir::new().unwrap();
        let output = generate(out.path(), &["--current-version", "1.2.3-abcd"]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Bundle written to"));

        let bundle = out.path().join("1.2.3-abcd");
        let mut files: Vec<String> = std::fs::read_dir(&bundle)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        files.sort();
        assert_eq!(
            files,
            vec![
                "ConfigMap_demo-operator_demo-operator-config.yaml",
                "CustomResourceDefinition_widgets.acme.io.yaml",
                "Service_demo-operator_demo-operator-metrics.yaml",
                "demo-operator.v1.2.3-abcd.clusterserviceversion.yaml",
            ]
        );

        let csv = read_yaml(&bundle.join("demo-operator.v1.2.3-abcd.clusterserviceversion.yaml"));
        assert_eq!(csv["metadata"]["name"].as_str(), Some("demo-operator.v1.2.3-abcd"));
        assert_eq!(csv["spec"]["version"].as_str(), Some("1.2.3-abcd"));
        assert!(csv["spec"].get("replaces").is_none());
        assert!(csv["metadata"]["annotations"]["createdAt"].as_str().is_some());
        assert_eq!(
            csv["metadata"]["annotations"]["containerImage"].as_str(),
            Some("quay.io/acme/demo-operator:v1.2.3")
        );

        let install = &csv["spec"]["install"]["spec"];
        assert_eq!(
            install["clusterPermissions"][0]["serviceAccountName"].as_str(),
            Some("demo-operator")
        );
        assert_eq!(
            install["clusterPermissions"][0]["rules"]
                .as_sequence()
                .map(Vec::len),
            Some(2)
        );
        assert_eq!(
            install["permissions"][0]["serviceAccountName"].as_str(),
            Some("demo-operator")
        );

        let container = &install["deployments"][0]["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(
            container["image"].as_str(),
            Some("quay.io/acme/demo-operator:v1.2.3")
        );
        let env = container["env"].as_sequence().unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env[2]["name"].as_str(), Some("OPERATOR_IMAGE"));
        assert_eq!(
            env[2]["value"].as_str(),
            Some("quay.io/acme/demo-operator:v1.2.3")
        );

        let owned = &csv["spec"]["customresourcedefinitions"]["owned"][0];
        assert_eq!(owned["name"].as_str(), Some("widgets.acme.io"));
        assert_eq!(owned["kind"].as_str(), Some("Widget"));
        assert_eq!(owned["version"].as_str(), Some("v1alpha1"));
    }

    #[test]
    fn test_generate_with_upgrade_edges() {
        let out = TempDir::new().unwrap();
        let output = generate(
            out.path(),
            &[
                "--current-version",
                "0.1.12-bbbb",
                "--replaces",
                "0.1.10-aaaa",
                "--skip",
                "0.1.9-cccc",
                "--skip",
                "0.1.11-dddd",
                "--skip",
                "0.1.10-aaaa",
            ],
        );
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let csv = read_yaml(
            &out.path()
                .join("0.1.12-bbbb/demo-operator.v0.1.12-bbbb.clusterserviceversion.yaml"),
        );
        assert_eq!(
            csv["spec"]["replaces"].as_str(),
            Some("demo-operator.v0.1.10-aaaa")
        );
        assert_eq!(
            csv["metadata"]["annotations"]["olm.skipRange"].as_str(),
            Some("0.1.9-cccc || 0.1.10-aaaa || 0.1.11-dddd")
        );
    }

    #[test]
    fn test_generate_composed_version() {
        let out = TempDir::new().unwrap();
        let output = generate(
            out.path(),
            &["--commit-number", "189", "--commit-hash", "3f73a592"],
        );
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(
            out.path()
                .join("0.1.189-3f73a592/demo-operator.v0.1.189-3f73a592.clusterserviceversion.yaml")
                .is_file()
        );
    }

    #[test]
    fn test_generate_dry_run() {
        let out = TempDir::new().unwrap();
        let output = generate(out.path(), &["--current-version", "1.2.3-abcd", "--dry-run"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Dry run mode"));
        assert!(!out.path().join("1.2.3-abcd").exists());
    }

    #[test]
    fn test_generate_invalid_version() {
        let out = TempDir::new().unwrap();
        let output = generate(out.path(), &["--current-version", "not-a-version"]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("invalid version"));
        assert!(!out.path().join("not-a-version").exists());
    }

    #[test]
    fn test_generate_unsupported_kind() {
        let out = TempDir::new().unwrap();
        let manifests = format!("{}/unsupported-kind/deploy", fixtures_path());
        let template = format!("{}/demo-operator/csv-template.yaml", fixtures_path());
        let out_dir = out.path().to_string_lossy().to_string();

        let output = bundlegen(&[
            "generate",
            "-n",
            "demo-operator",
            "-o",
            &out_dir,
            "-i",
            "quay.io/acme/demo-operator",
            "-t",
            "v1",
            "-c",
            "0.1.1-abc",
            "-m",
            &manifests,
            "--csv-template",
            &template,
        ]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("CronJob"));
        assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_generate_missing_version_is_usage_error() {
        let output = bundlegen(&[
            "generate",
            "-n",
            "demo-operator",
            "-o",
            "out",
            "-i",
            "img",
            "-t",
            "v1",
        ]);

        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_generate_from_env() {
        let out = TempDir::new().unwrap();
        let output = Command::new(env!("CARGO_BIN_EXE_bundlegen"))
            .arg("generate")
            .env_remove("RUST_LOG")
            .env("BUNDLEGEN_NAME", "demo-operator")
            .env("BUNDLEGEN_OUTPUT_DIR", out.path())
            .env("BUNDLEGEN_IMAGE", "quay.io/acme/demo-operator")
            .env("BUNDLEGEN_IMAGE_TAG", "v1")
            .env("BUNDLEGEN_CURRENT_VERSION", "0.2.5-feed")
            .env(
                "BUNDLEGEN_MANIFEST_DIR",
                format!("{}/demo-operator/deploy", fixtures_path()),
            )
            .env(
                "BUNDLEGEN_CSV_TEMPLATE",
                format!("{}/demo-operator/csv-template.yaml", fixtures_path()),
            )
            .output()
            .expect("Failed to execute bundlegen");

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(out.path().join("0.2.5-feed").is_dir());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_valid_tree() {
        let output = bundlegen(&[
            "validate",
            &format!("{}/demo-operator/deploy", fixtures_path()),
            &format!("{}/demo-operator/csv-template.yaml", fixtures_path()),
        ]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Validation passed"));
        assert!(stdout.contains("01-cluster-role.yaml"));
        // directories are not searched recursively
        assert!(!stdout.contains("widgets.acme.io.yaml"));
        assert!(!stdout.contains("README.md"));
    }

    #[test]
    fn test_validate_invalid_yaml() {
        let output = bundlegen(&["validate", &format!("{}/invalid-yaml", fixtures_path())]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("broken.yaml"));
        assert!(stdout.contains("good.yaml"));
    }

    #[test]
    fn test_validate_missing_path() {
        let output = bundlegen(&["validate", "/no/such/dir"]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("path does not exist"));
    }

    #[test]
    fn test_validate_json_output() {
        let output = bundlegen(&[
            "validate",
            &format!("{}/invalid-yaml", fixtures_path()),
            "--json",
        ]);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        assert_eq!(json["valid"], false);
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0]["error"].is_string());
        assert_eq!(files[1]["documents"], 2);
    }

    #[test]
    fn test_validate_requires_paths() {
        let output = bundlegen(&["validate"]);
        assert_eq!(output.status.code(), Some(64));
    }
}

//! Folding of the operator Deployment into the CSV install strategy

use serde_yaml::{Mapping, Sequence, Value};

use crate::csv::InstallDeployment;
use crate::error::{BundleError, Result};
use crate::index::ResourceIndex;
use crate::resource::{Resource, ResourceKind};

/// Environment variable carrying the operator's own image
pub const OPERATOR_IMAGE_ENV: &str = "OPERATOR_IMAGE";

/// Take the single Deployment out of `index` and point it at `image`
///
/// The first container's image is replaced and `OPERATOR_IMAGE` is set on
/// that container, added if the container does not declare it yet.
pub fn fold_deployment(index: &mut ResourceIndex, image: &str) -> Result<InstallDeployment> {
    match index.count(ResourceKind::Deployment) {
        0 => return Err(BundleError::MissingDeployment),
        1 => {}
        _ => {
            return Err(BundleError::MultipleDeployments {
                names: index
                    .get(ResourceKind::Deployment)
                    .iter()
                    .map(Resource::display_name)
                    .collect(),
            });
        }
    }

    let Some(deployment) = index.remove_all(ResourceKind::Deployment).pop() else {
        return Err(BundleError::MissingDeployment);
    };

    let name = deployment.name().to_string();
    let path = deployment.source().to_path_buf();
    let invalid = |message: &str| BundleError::InvalidDeployment {
        name: name.clone(),
        path: path.clone(),
        message: message.to_string(),
    };

    let mut document = deployment.into_document();
    let container = first_container(&mut document)
        .ok_or_else(|| invalid("spec.template.spec.containers is empty"))?;

    container.insert("image".into(), image.into());
    set_operator_image(container, image).map_err(invalid)?;

    let spec = document
        .as_mapping_mut()
        .and_then(|m| m.remove("spec"))
        .unwrap_or(Value::Null);

    tracing::debug!(deployment = %name, image, "folded Deployment");
    Ok(InstallDeployment { name, spec })
}

fn first_container(document: &mut Value) -> Option<&mut Mapping> {
    document
        .get_mut("spec")?
        .get_mut("template")?
        .get_mut("spec")?
        .get_mut("containers")?
        .as_sequence_mut()?
        .first_mut()?
        .as_mapping_mut()
}

fn set_operator_image(
    container: &mut Mapping,
    image: &str,
) -> std::result::Result<(), &'static str> {
    let env = container.entry("env".into()).or_insert(Value::Null);
    if env.is_null() {
        *env = Value::Sequence(Sequence::new());
    }
    let env = env
        .as_sequence_mut()
        .ok_or("env of the first container is not a list")?;

    let existing = env
        .iter_mut()
        .filter_map(Value::as_mapping_mut)
        .find(|var| var.get("name").and_then(Value::as_str) == Some(OPERATOR_IMAGE_ENV));

    match existing {
        Some(var) => {
            var.remove("valueFrom");
            var.insert("value".into(), image.into());
        }
        None => {
            let mut var = Mapping::new();
            var.insert("name".into(), OPERATOR_IMAGE_ENV.into());
            var.insert("value".into(), image.into());
            env.push(Value::Mapping(var));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_documents;
    use std::path::Path;

    const IMAGE: &str = "quay.io/acme/demo-operator:v1.2.3";

    fn index(yaml: &str) -> ResourceIndex {
        let mut index = ResourceIndex::new();
        for resource in parse_documents(yaml, Path::new("operator.yaml")).unwrap() {
            index.insert(resource);
        }
        index
    }

    fn deployment(name: &str, env: &str) -> String {
        format!(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {name}
  namespace: demo
spec:
  replicas: 1
  selector:
    matchLabels:
      app: {name}
  template:
    metadata:
      labels:
        app: {name}
    spec:
      serviceAccountName: {name}
      containers:
        - name: operator
          image: REPLACE_IMAGE
{env}        - name: sidecar
          image: busybox
"#
        )
    }

    fn operator_image_env(spec: &Value) -> Vec<&str> {
        spec["template"]["spec"]["containers"][0]["env"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter(|v| v["name"].as_str() == Some(OPERATOR_IMAGE_ENV))
            .filter_map(|v| v["value"].as_str())
            .collect()
    }

    #[test]
    fn test_image_and_env_added() {
        let mut index = index(&deployment("demo-operator", ""));

        let folded = fold_deployment(&mut index, IMAGE).unwrap();

        assert_eq!(folded.name, "demo-operator");
        let container = &folded.spec["template"]["spec"]["containers"][0];
        assert_eq!(container["image"].as_str(), Some(IMAGE));
        assert_eq!(operator_image_env(&folded.spec), vec![IMAGE]);
        assert_eq!(
            folded.spec["template"]["spec"]["containers"][1]["image"].as_str(),
            Some("busybox")
        );
        assert_eq!(index.count(ResourceKind::Deployment), 0);
    }

    #[test]
    fn test_existing_env_updated_in_place() {
        let env = "          env:\n            - name: WATCH_NAMESPACE\n              value: \"\"\n            - name: OPERATOR_IMAGE\n              value: old\n";
        let mut index = index(&deployment("demo-operator", env));

        let folded = fold_deployment(&mut index, IMAGE).unwrap();

        let vars = folded.spec["template"]["spec"]["containers"][0]["env"]
            .as_sequence()
            .unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0]["name"].as_str(), Some("WATCH_NAMESPACE"));
        assert_eq!(operator_image_env(&folded.spec), vec![IMAGE]);
    }

    #[test]
    fn test_value_from_replaced() {
        let env = "          env:\n            - name: OPERATOR_IMAGE\n              valueFrom:\n                configMapKeyRef:\n                  name: x\n                  key: y\n";
        let mut index = index(&deployment("demo-operator", env));

        let folded = fold_deployment(&mut index, IMAGE).unwrap();

        let var = &folded.spec["template"]["spec"]["containers"][0]["env"][0];
        assert!(var.get("valueFrom").is_none());
        assert_eq!(var["value"].as_str(), Some(IMAGE));
    }

    #[test]
    fn test_null_env_replaced() {
        let mut index = index(&deployment("demo-operator", "          env:\n"));

        let folded = fold_deployment(&mut index, IMAGE).unwrap();
        assert_eq!(operator_image_env(&folded.spec), vec![IMAGE]);
    }

    #[test]
    fn test_missing_deployment() {
        let mut index = index("kind: ConfigMap\nmetadata:\n  name: x\n");
        let err = fold_deployment(&mut index, IMAGE).unwrap_err();
        assert!(matches!(err, BundleError::MissingDeployment));
    }

    #[test]
    fn test_multiple_deployments() {
        let yaml = format!("{}---{}", deployment("a", ""), deployment("b", ""));
        let mut index = index(&yaml);

        let err = fold_deployment(&mut index, IMAGE).unwrap_err();
        match err {
            BundleError::MultipleDeployments { names } => {
                assert_eq!(names, vec!["Deployment/demo/a", "Deployment/demo/b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(index.count(ResourceKind::Deployment), 2);
    }

    #[test]
    fn test_no_containers() {
        let mut index = index(
            "kind: Deployment\nmetadata:\n  name: empty\nspec:\n  template:\n    spec:\n      containers: []\n",
        );
        let err = fold_deployment(&mut index, IMAGE).unwrap_err();
        assert!(matches!(err, BundleError::InvalidDeployment { ref name, .. } if name == "empty"));
    }
}

use kube::Resource;
use serde::Serialize;
use serde_json::Value;

use crate::api::all_crds;
use crate::error::Result;

/// Marshals a typed Kubernetes object to YAML, stamping the constant
/// `apiVersion` and `kind` of its type at the top.
pub fn to_manifest_yaml<K>(object: &K) -> Result<String>
where
    K: Resource<DynamicType = ()> + Serialize,
{
    let mut value = serde_json::to_value(object)?;
    if let Value::Object(fields) = &mut value {
        fields.insert(
            "apiVersion".to_string(),
            Value::String(K::api_version(&()).into_owned()),
        );
        fields.insert("kind".to_string(), Value::String(K::kind(&()).into_owned()));
    }
    Ok(serde_yaml::to_string(&value)?)
}

/// Every supported CRD as one multi-document YAML stream, ready for
/// `kubectl apply -f -`.
pub fn crd_manifests() -> Result<String> {
    let mut out = String::new();
    for crd in all_crds() {
        out.push_str(&format!("---\n{}", serde_yaml::to_string(&crd)?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v2::mapping_api::{Mapping, MappingSpec};

    #[test]
    fn manifest_starts_with_type_information() {
        let mapping = Mapping::new(
            "quote",
            MappingSpec {
                prefix: "/backend/".to_string(),
                service: "quote".to_string(),
                ..Default::default()
            },
        );
        let yaml = to_manifest_yaml(&mapping).unwrap();
        assert!(yaml.starts_with("apiVersion: getambassador.io/v2\nkind: Mapping\n"));
        assert!(yaml.contains("name: quote"));
        assert!(yaml.contains("prefix: /backend/"));
        assert!(!yaml.contains("timeout_ms"));
    }

    #[test]
    fn crd_stream_has_one_document_per_kind() {
        let stream = crd_manifests().unwrap();
        assert_eq!(stream.matches("---\n").count(), 2);
        assert!(stream.contains("name: thinruntimes.data.fluid.io"));
        assert!(stream.contains("name: mappings.getambassador.io"));
    }
}

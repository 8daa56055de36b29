use std::collections::BTreeMap;

use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::v1alpha1::thinruntime_api::ThinRuntime;
use crate::api::v2::mapping_api::Mapping;
use crate::controllers::manifest_controller::{ManifestResource, ProviderResource};
use crate::error::{Error, Result};

use self::diagnostics::{AttributePath, Diagnostics};
use self::schema::Schema;

pub mod decode;
pub mod diagnostics;
pub mod schema;

/// Prefix of every resource type this provider serves.
pub const PROVIDER_TYPE_NAME: &str = "k8s";
/// Registry address the provider is published under.
pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/k8s-crds/k8s";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub resources: Vec<String>,
}

pub struct ProviderSchema {
    pub provider: Schema,
    pub resource_schemas: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    /// Renders the schema in the layout of `terraform providers schema -json`.
    pub fn to_json(&self) -> Value {
        let resources: serde_json::Map<String, Value> = self
            .resource_schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.to_json()))
            .collect();
        json!({
            "format_version": "1.0",
            "provider_schemas": {
                PROVIDER_ADDRESS: {
                    "provider": self.provider.to_json(),
                    "resource_schemas": resources,
                }
            }
        })
    }
}

/// Registry of the resource types served by this provider.
pub struct Provider {
    resources: BTreeMap<String, Box<dyn ProviderResource>>,
}

impl Provider {
    pub fn new() -> Result<Self> {
        let mut provider = Self {
            resources: BTreeMap::new(),
        };
        provider.register(ManifestResource::<ThinRuntime>::new(PROVIDER_TYPE_NAME)?);
        provider.register(ManifestResource::<Mapping>::new(PROVIDER_TYPE_NAME)?);
        Ok(provider)
    }

    pub fn register<R: ProviderResource + 'static>(&mut self, resource: R) {
        debug!("registering resource {}", resource.type_name());
        self.resources
            .insert(resource.type_name().to_string(), Box::new(resource));
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn ProviderResource> {
        self.resources
            .get(type_name)
            .map(|resource| resource.as_ref())
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_string()))
    }

    pub fn resources(&self) -> impl Iterator<Item = &dyn ProviderResource> {
        self.resources.values().map(|resource| resource.as_ref())
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            resources: self.resources.keys().cloned().collect(),
        }
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: Schema::empty("Renders Kubernetes custom resources as YAML manifests."),
            resource_schemas: self
                .resources
                .iter()
                .map(|(name, resource)| (name.clone(), resource.schema().clone()))
                .collect(),
        }
    }

    /// Runs `create` on a YAML or JSON configuration document outside of
    /// Terraform. Returns the manifest, or the whole state when `full_state`.
    pub fn render(&self, type_name: &str, content: &str, full_state: bool) -> Result<String> {
        let config: Value = serde_yaml::from_str(content)?;
        let state = self.resource(type_name)?.create(&config)?;
        if full_state {
            return Ok(serde_json::to_string_pretty(&state)?);
        }
        Ok(state["yaml"].as_str().unwrap_or_default().to_string())
    }

    /// The provider block takes no arguments.
    pub fn configure(&self, config: &Value) -> Result<Diagnostics> {
        let mut diags = Diagnostics::new();
        match config {
            Value::Null => {}
            Value::Object(fields) => {
                for name in fields.keys() {
                    diags.error(
                        &AttributePath::root().attribute(name),
                        "Unsupported argument",
                        format!("the provider block does not accept {name:?}"),
                    );
                }
            }
            _ => diags.error(
                &AttributePath::root(),
                "Incorrect attribute value type",
                "the provider configuration must be an object",
            ),
        }
        if diags.has_errors() {
            return Err(Error::InvalidConfiguration(diags));
        }
        info!("provider configured");
        Ok(diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_kind() {
        let provider = Provider::new().unwrap();
        assert_eq!(
            provider.metadata().resources,
            vec![
                "k8s_data_fluid_io_thin_runtime_v1alpha1".to_string(),
                "k8s_getambassador_io_mapping_v2".to_string(),
            ]
        );
        assert!(provider.resource("k8s_getambassador_io_mapping_v2").is_ok());
        assert!(matches!(
            provider.resource("k8s_core_pod_v1"),
            Err(Error::UnknownResourceType(_))
        ));
    }

    #[test]
    fn schema_json_is_keyed_by_provider_address() {
        let schema = Provider::new().unwrap().schema().to_json();
        assert_eq!(schema["format_version"], "1.0");
        let resources = &schema["provider_schemas"][PROVIDER_ADDRESS]["resource_schemas"];
        assert!(resources["k8s_data_fluid_io_thin_runtime_v1alpha1"]["block"]["attributes"]["spec"].is_object());
        assert!(schema["provider_schemas"][PROVIDER_ADDRESS]["provider"]["block"]
            .get("attributes")
            .is_none());
    }

    const RUNTIME_CONFIG: &str = r#"
metadata:
  name: nfs
  namespace: fluid-system
spec:
  replicas: 2
  fuse:
    liveness_probe:
      tcp_socket:
        port: http
"#;

    #[test]
    fn render_prints_the_manifest() {
        let provider = Provider::new().unwrap();
        let yaml = provider
            .render("k8s_data_fluid_io_thin_runtime_v1alpha1", RUNTIME_CONFIG, false)
            .unwrap();
        assert!(yaml.starts_with("apiVersion: data.fluid.io/v1alpha1\nkind: ThinRuntime\n"));
        assert!(yaml.contains("replicas: 2"));
        assert!(yaml.contains("port: http"));
    }

    #[test]
    fn render_prints_the_state() {
        let provider = Provider::new().unwrap();
        let rendered = provider
            .render("k8s_data_fluid_io_thin_runtime_v1alpha1", RUNTIME_CONFIG, true)
            .unwrap();
        let state: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(state["kind"], "ThinRuntime");
        assert!(state["id"].as_i64().unwrap() > 0);
        assert_eq!(state["metadata"]["namespace"], "fluid-system");
    }

    #[test]
    fn render_failures() {
        let provider = Provider::new().unwrap();
        assert!(matches!(
            provider.render("k8s_core_pod_v1", RUNTIME_CONFIG, false),
            Err(Error::UnknownResourceType(_))
        ));
        assert!(matches!(
            provider.render("k8s_data_fluid_io_thin_runtime_v1alpha1", "metadata: [", false),
            Err(Error::YamlError(_))
        ));
        let err = provider
            .render(
                "k8s_data_fluid_io_thin_runtime_v1alpha1",
                "metadata:\n  name: nfs\nspec:\n  replicas: 3000000000\n",
                false,
            )
            .unwrap_err();
        let diags = err.diagnostics();
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.attribute.as_ref().unwrap().to_string(), "spec.replicas");
    }

    #[test]
    fn configure_rejects_arguments() {
        let provider = Provider::new().unwrap();
        assert!(provider.configure(&json!({})).unwrap().is_empty());
        assert!(provider.configure(&Value::Null).is_ok());
        assert!(matches!(
            provider.configure(&json!({"kubeconfig": "~/.kube/config"})),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}

use std::marker::PhantomData;

use chrono::Utc;
use kube::{CustomResourceExt, Resource};
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::helpers::manifests::to_manifest_yaml;
use crate::helpers::naming::resource_type_name;
use crate::provider::decode::decode_object;
use crate::provider::diagnostics::{AttributePath, Diagnostics};
use crate::provider::schema::{spec_attribute, Schema};

/// Result of planning a change: the state Terraform should expect after apply.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlanResult {
    pub planned_state: Value,
    /// Attribute paths whose change forces the resource to be replaced.
    pub requires_replace: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Lifecycle of one Terraform resource type.
pub trait ProviderResource: Send + Sync {
    fn type_name(&self) -> &str;
    fn schema(&self) -> &Schema;
    fn validate(&self, config: &Value) -> Diagnostics;
    fn plan(&self, prior_state: Option<&Value>, proposed_state: &Value) -> Result<PlanResult>;
    fn create(&self, planned_state: &Value) -> Result<Value>;
    fn read(&self, current_state: &Value) -> Result<Value>;
    fn update(&self, prior_state: &Value, planned_state: &Value) -> Result<Value>;
    fn delete(&self, current_state: &Value) -> Result<()>;
}

/// A resource whose whole lifecycle is rendering a manifest of kind `K` into
/// state. Nothing is ever sent to a cluster.
pub struct ManifestResource<K> {
    type_name: String,
    schema: Schema,
    kind: PhantomData<fn() -> K>,
}

impl<K> ManifestResource<K>
where
    K: CustomResourceExt + Resource<DynamicType = ()> + Serialize + DeserializeOwned,
{
    pub fn new(provider: &str) -> Result<Self> {
        let crd = K::crd();
        let type_name = resource_type_name(
            provider,
            &crd.spec.group,
            &crd.spec.names.kind,
            &K::version(&()),
        );
        let description = format!(
            "{} is the schema for the {} API of `{}`. The manifest is rendered to YAML and kept in Terraform state only.",
            crd.spec.names.kind,
            crd.spec.names.plural,
            K::api_version(&()),
        );
        let schema = Schema::manifest(&description, spec_attribute(&crd)?);
        Ok(Self {
            type_name,
            schema,
            kind: PhantomData,
        })
    }

    /// Decodes a configuration into the typed object and its YAML.
    pub fn render(&self, config: &Value) -> Result<(K, String)> {
        let mut diags = Diagnostics::new();
        let decoded = decode_object(&self.schema.attributes, config, &AttributePath::root(), &mut diags);
        let mut manifest = match decoded {
            Some(manifest) if !diags.has_errors() => manifest,
            _ => return Err(Error::InvalidConfiguration(diags)),
        };
        manifest.insert("apiVersion".to_string(), Value::String(K::api_version(&()).into_owned()));
        manifest.insert("kind".to_string(), Value::String(K::kind(&()).into_owned()));

        let object: K = match serde_json::from_value(Value::Object(manifest)) {
            Ok(object) => object,
            Err(err) => {
                diags.error(&AttributePath::root(), "Invalid manifest", err.to_string());
                return Err(Error::InvalidConfiguration(diags));
            }
        };
        let yaml = to_manifest_yaml(&object)?;
        Ok((object, yaml))
    }

    /// Stamps the bookkeeping fields onto a copy of the configuration.
    fn stamp(&self, config: &Value, id: Value, yaml: String) -> Value {
        let mut state = config.as_object().cloned().unwrap_or_else(Map::new);
        state.insert("id".to_string(), id);
        state.insert("api_version".to_string(), Value::String(K::api_version(&()).into_owned()));
        state.insert("kind".to_string(), Value::String(K::kind(&()).into_owned()));
        state.insert("yaml".to_string(), Value::String(yaml));
        Value::Object(state)
    }

    fn apply(&self, planned_state: &Value) -> Result<Value> {
        let (_, yaml) = self.render(planned_state)?;
        let id = Utc::now().timestamp_nanos_opt().ok_or(Error::ClockOutOfRange)?;
        Ok(self.stamp(planned_state, Value::from(id), yaml))
    }
}

impl<K> ProviderResource for ManifestResource<K>
where
    K: CustomResourceExt + Resource<DynamicType = ()> + Serialize + DeserializeOwned,
{
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        match self.render(config) {
            Ok(_) => Diagnostics::new(),
            Err(err) => err.diagnostics(),
        }
    }

    fn plan(&self, prior_state: Option<&Value>, proposed_state: &Value) -> Result<PlanResult> {
        debug!("planning {}", self.type_name);
        let (_, yaml) = self.render(proposed_state)?;

        let mut requires_replace = Vec::new();
        let id = match prior_state {
            None => Value::Null,
            Some(prior) => {
                for field in ["name", "namespace"] {
                    if metadata_field(prior, field) != metadata_field(proposed_state, field) {
                        requires_replace.push(format!("metadata.{field}"));
                    }
                }
                let unchanged = prior.get("yaml").and_then(Value::as_str) == Some(yaml.as_str());
                if unchanged && requires_replace.is_empty() {
                    prior.get("id").cloned().unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
        };

        Ok(PlanResult {
            planned_state: self.stamp(proposed_state, id, yaml),
            requires_replace,
            diagnostics: Diagnostics::new(),
        })
    }

    fn create(&self, planned_state: &Value) -> Result<Value> {
        let state = self.apply(planned_state)?;
        info!("created {} {}", self.type_name, describe(&state));
        Ok(state)
    }

    fn read(&self, current_state: &Value) -> Result<Value> {
        debug!("read {} is a no-op", self.type_name);
        Ok(current_state.clone())
    }

    fn update(&self, prior_state: &Value, planned_state: &Value) -> Result<Value> {
        let state = self.apply(planned_state)?;
        info!(
            "updated {} {} (id {} -> {})",
            self.type_name,
            describe(&state),
            prior_state.get("id").unwrap_or(&Value::Null),
            state["id"]
        );
        Ok(state)
    }

    fn delete(&self, current_state: &Value) -> Result<()> {
        debug!("delete {} {} is a no-op", self.type_name, describe(current_state));
        Ok(())
    }
}

fn metadata_field<'a>(state: &'a Value, field: &str) -> Option<&'a str> {
    state
        .get("metadata")
        .and_then(|metadata| metadata.get(field))
        .and_then(Value::as_str)
}

fn describe(state: &Value) -> String {
    match (metadata_field(state, "namespace"), metadata_field(state, "name")) {
        (Some(namespace), Some(name)) => format!("{namespace}/{name}"),
        (None, Some(name)) => name.to_string(),
        _ => "<unnamed>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha1::thinruntime_api::ThinRuntime;
    use crate::api::v2::mapping_api::Mapping;
    use serde_json::json;

    fn mapping() -> ManifestResource<Mapping> {
        ManifestResource::new("k8s").unwrap()
    }

    fn mapping_config() -> Value {
        json!({
            "metadata": {"name": "quote-backend", "namespace": "ambassador"},
            "spec": {
                "prefix": "/backend/",
                "service": "quote",
                "timeout_ms": 3000,
                "load_balancer": {"policy": "round_robin"}
            }
        })
    }

    #[test]
    fn type_names_follow_group_kind_version() {
        assert_eq!(mapping().type_name(), "k8s_getambassador_io_mapping_v2");
        let thin: ManifestResource<ThinRuntime> = ManifestResource::new("k8s").unwrap();
        assert_eq!(thin.type_name(), "k8s_data_fluid_io_thin_runtime_v1alpha1");
    }

    #[test]
    fn create_stamps_bookkeeping_fields() {
        let state = mapping().create(&mapping_config()).unwrap();
        assert_eq!(state["api_version"], "getambassador.io/v2");
        assert_eq!(state["kind"], "Mapping");
        assert!(state["id"].as_i64().unwrap() > 0);
        assert_eq!(state["spec"]["prefix"], "/backend/");

        let yaml = state["yaml"].as_str().unwrap();
        let manifest: Mapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.metadata.namespace.as_deref(), Some("ambassador"));
        assert_eq!(manifest.spec.timeout_ms, Some(3000));
        assert!(yaml.contains("policy: round_robin"));
    }

    #[test]
    fn update_restamps_the_id() {
        let resource = mapping();
        let prior = resource.create(&mapping_config()).unwrap();
        let mut planned = mapping_config();
        planned["spec"]["timeout_ms"] = json!(5000);
        let state = resource.update(&prior, &planned).unwrap();
        assert!(state["id"].as_i64().unwrap() >= prior["id"].as_i64().unwrap());
        assert!(state["yaml"].as_str().unwrap().contains("timeout_ms: 5000"));
    }

    #[test]
    fn read_and_delete_do_nothing() {
        let resource = mapping();
        let state = resource.create(&mapping_config()).unwrap();
        assert_eq!(resource.read(&state).unwrap(), state);
        assert!(resource.delete(&state).is_ok());
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let config = json!({
            "metadata": {"name": "Not_Valid"},
            "spec": {"prefix": "/"}
        });
        let diags = mapping().validate(&config);
        let paths: Vec<String> = diags
            .iter()
            .filter_map(|d| d.attribute.as_ref().map(|p| p.to_string()))
            .collect();
        assert!(paths.contains(&"metadata.name".to_string()));
        assert!(paths.contains(&"spec.service".to_string()));
        assert!(matches!(
            mapping().create(&config),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn plan_keeps_id_only_when_nothing_changed() {
        let resource = mapping();
        let prior = resource.create(&mapping_config()).unwrap();

        let same = resource.plan(Some(&prior), &mapping_config()).unwrap();
        assert_eq!(same.planned_state["id"], prior["id"]);
        assert!(same.requires_replace.is_empty());

        let mut changed = mapping_config();
        changed["spec"]["service"] = json!("quote-v2");
        let plan = resource.plan(Some(&prior), &changed).unwrap();
        assert_eq!(plan.planned_state["id"], Value::Null);
        assert!(plan.planned_state["yaml"].as_str().unwrap().contains("service: quote-v2"));

        let mut moved = mapping_config();
        moved["metadata"]["namespace"] = json!("edge");
        let plan = resource.plan(Some(&prior), &moved).unwrap();
        assert_eq!(plan.requires_replace, vec!["metadata.namespace".to_string()]);
    }

    #[test]
    fn plan_for_new_resource_leaves_id_unknown() {
        let plan = mapping().plan(None, &mapping_config()).unwrap();
        assert_eq!(plan.planned_state["id"], Value::Null);
        assert_eq!(plan.planned_state["kind"], "Mapping");
    }
}

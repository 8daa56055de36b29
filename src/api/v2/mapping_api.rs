use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mapping associates a resource prefix with an upstream service on the
/// Ambassador edge stack. Field names follow the Ambassador configuration
/// format, which is already snake_case on the wire.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Mapping",
    group = "getambassador.io",
    version = "v2",
    plural = "mappings",
    namespaced
)]
#[kube(derive = "Default", derive = "PartialEq")]
pub struct MappingSpec {
    /// Ambassador instances that should process this mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambassador_id: Option<Vec<String>>,

    /// URL prefix identifying the resource.
    pub prefix: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_regex: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_exact: Option<bool>,

    /// Upstream service the resource is mapped to.
    pub service: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_regex: Option<bool>,

    /// HTTP method to match, e.g. `GET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_regex: Option<bool>,

    /// Headers that must be present with the given values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_headers: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_parameters: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_query_parameters: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    /// Tie breaker between mappings with the same prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Share of traffic sent to this mapping when several share a prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,

    /// Replacement for the matched prefix. Defaults to `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_rewrite: Option<RegexMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_rewrite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_host_rewrite: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_redirect: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_redirect: Option<RegexMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_response_code: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_request_headers: Option<BTreeMap<String, AddedHeader>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_response_headers: Option<BTreeMap<String, AddedHeader>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_request_headers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_response_headers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_linkerd_headers: Option<bool>,

    /// Request timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_idle_timeout_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_max_connection_lifetime_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc: Option<bool>,

    /// Name of a TLSContext to originate TLS with, or `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breakers: Option<Vec<CircuitBreaker>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<KeepAlive>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<Cors>,

    /// Mirror traffic to the service without returning its responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ipv4: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ipv6: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_dns_ttl: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<String>,

    /// Protocols the upstream connection may be upgraded to, e.g. `websocket`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_upgrade: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_websocket: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_auth: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_context_extensions: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_error_response_overrides: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_response_overrides: Option<Vec<ErrorResponseOverride>>,

    /// Developer portal settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<DocsInfo>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RegexMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct AddedHeader {
    pub value: String,

    /// Append to an existing header instead of replacing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct LoadBalancer {
    pub policy: LoadBalancerPolicy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<LoadBalancerCookie>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerPolicy {
    RoundRobin,
    RingHash,
    Maglev,
    LeastRequest,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct LoadBalancerCookie {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct CircuitBreaker {
    /// Either `default` or `high`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pending_requests: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RetryPolicy {
    /// Condition that triggers a retry, e.g. `5xx` or `gateway-error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_retries: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_try_timeout: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct KeepAlive {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_time: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct Cors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_headers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ErrorResponseOverride {
    /// Upstream status code the override applies to.
    pub on_status_code: i64,

    pub body: ErrorResponseOverrideBody,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ErrorResponseOverrideBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format_source: Option<ErrorResponseTextFormatSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ErrorResponseTextFormatSource {
    pub filename: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct DocsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn crd_names_match_ambassador() {
        let crd = Mapping::crd();
        assert_eq!(crd.spec.group, "getambassador.io");
        assert_eq!(crd.spec.names.kind, "Mapping");
        assert_eq!(crd.spec.versions[0].name, "v2");
        assert_eq!(Mapping::api_version(&()), "getambassador.io/v2");
    }

    #[test]
    fn prefix_and_service_are_required() {
        let crd = Mapping::crd();
        let spec = crd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .and_then(|root| root.properties.as_ref())
            .and_then(|props| props.get("spec"))
            .cloned()
            .unwrap();
        let required = spec.required.unwrap();
        assert!(required.contains(&"prefix".to_string()));
        assert!(required.contains(&"service".to_string()));
        assert_eq!(required.len(), 2);
    }

    #[test]
    fn load_balancer_policy_is_snake_case() {
        let lb = LoadBalancer {
            policy: LoadBalancerPolicy::RingHash,
            cookie: None,
            header: Some("x-user".to_string()),
            source_ip: None,
        };
        let value = serde_json::to_value(&lb).unwrap();
        assert_eq!(value["policy"], "ring_hash");
        assert!(value.get("cookie").is_none());
    }
}

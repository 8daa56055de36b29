use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ContainerPort, EmptyDirVolumeSource, EnvVar, EphemeralVolumeSource, HostPathVolumeSource,
    Lifecycle, LocalObjectReference, PersistentVolumeClaimVolumeSource, Probe,
    ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ThinRuntime is the lightweight Fluid runtime. It lets a user plug any
/// FUSE-capable storage system into Fluid by describing how the fuse and
/// worker components should be started.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "ThinRuntime",
    group = "data.fluid.io",
    version = "v1alpha1",
    plural = "thinruntimes",
    namespaced
)]
#[kube(derive = "Default", derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct ThinRuntimeSpec {
    /// The name of the ThinRuntimeProfile this runtime is based on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,

    /// The component spec of the thin worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<ThinCompTemplateSpec>,

    /// The component spec of the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuse: Option<ThinFuseSpec>,

    /// Tiered storage used by the runtime.
    #[serde(rename = "tieredstore", skip_serializing_if = "Option::is_none")]
    pub tiered_store: Option<TieredStore>,

    /// Volumes that can be mounted by containers belonging to the runtime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    /// The replicas of the worker, need to be specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// The user and group used to run the runtime components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as: Option<User>,

    /// Runtime management behaviour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management: Option<RuntimeManagement>,

    /// Secrets used when pulling the runtime images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,
}

/// Template shared by the thin runtime components.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThinCompTemplateSpec {
    /// Whether the component is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Replicas is the desired number of replicas of the given template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Image for the component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image tag for the component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,

    /// One of the three policies: `Always`, `IfNotPresent`, `Never`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Environment variables that will be used by the component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    /// Resources that will be requested by the component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Ports used by the component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<ContainerPort>>,

    /// Periodic probe of container liveness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,

    /// Periodic probe of container service readiness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,

    /// Whether to use host network or container network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<NetworkMode>,

    /// Node selector of the component pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Volumes to mount into the component's filesystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

/// Spec of the thin fuse component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThinFuseSpec {
    /// Image of the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image tag of the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,

    /// One of the three policies: `Always`, `IfNotPresent`, `Never`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Environment variables that will be used by the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    /// Command to start the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Arguments passed to the thin fuse command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Mount options of the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,

    /// Resources that will be requested by the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Ports used by the thin fuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<ContainerPort>>,

    /// Periodic probe of container liveness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,

    /// Periodic probe of container service readiness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,

    /// Whether to use host network or container network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<NetworkMode>,

    /// When the fuse pods are cleaned up. Defaults to `OnRuntimeDeleted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_policy: Option<FuseCleanPolicy>,

    /// Node selector of the fuse pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Volumes to mount into the fuse's filesystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,

    /// Actions the management system should take in response to container
    /// lifecycle events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub enum NetworkMode {
    HostNetwork,
    ContainerNetwork,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub enum FuseCleanPolicy {
    OnDemand,
    OnRuntimeDeleted,
}

/// Tiered storage configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct TieredStore {
    /// Configurations for multiple tiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<Level>>,
}

/// A single storage tier.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Medium type of the tier.
    #[serde(rename = "mediumtype")]
    pub medium_type: MediumType,

    /// How the cache directory is provisioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<VolumeType>,

    /// Volume source used when `volumeType` is `volumeTemplate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_source: Option<LevelVolumeSource>,

    /// File paths to be used for the tier, comma separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Quota of the whole tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<Quantity>,

    /// Quota for every path of the tier, comma separated, e.g. `100Gi,50Gi`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_list: Option<String>,

    /// Ratio of high watermark of the tier, e.g. `0.9`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,

    /// Ratio of low watermark of the tier, e.g. `0.7`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub enum MediumType {
    #[serde(rename = "MEM")]
    Memory,
    #[serde(rename = "SSD")]
    Ssd,
    #[serde(rename = "HDD")]
    Hdd,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum VolumeType {
    HostPath,
    EmptyDir,
    VolumeTemplate,
}

/// The subset of volume sources a tier can be provisioned from.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LevelVolumeSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimVolumeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<EphemeralVolumeSource>,
}

/// Identity the runtime components run as.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct User {
    /// The uid to run the runtime as.
    pub uid: i64,
    /// The gid to run the runtime as.
    pub gid: i64,
    /// The user name to run the runtime as.
    pub user: String,
    /// The group name to run the runtime as.
    pub group: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeManagement {
    /// Policy for cleaning the cache when the runtime is removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_cache_policy: Option<CleanCachePolicy>,

    /// Policy for syncing the dataset metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_sync_policy: Option<MetadataSyncPolicy>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanCachePolicy {
    /// Seconds to wait before cleaning the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<i32>,

    /// Maximum number of cleaning attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry_attempts: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSyncPolicy {
    /// Whether to sync dataset metadata automatically. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_sync: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn crd_names_match_fluid() {
        let crd = ThinRuntime::crd();
        assert_eq!(crd.spec.group, "data.fluid.io");
        assert_eq!(crd.spec.names.kind, "ThinRuntime");
        assert_eq!(crd.spec.names.plural, "thinruntimes");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(ThinRuntime::api_version(&()), "data.fluid.io/v1alpha1");
    }

    #[test]
    fn empty_fields_are_omitted() {
        let runtime = ThinRuntime::new(
            "demo",
            ThinRuntimeSpec {
                profile_name: Some("nfs".to_string()),
                ..Default::default()
            },
        );
        let yaml = serde_yaml::to_string(&runtime).unwrap();
        assert!(yaml.contains("profileName: nfs"));
        assert!(!yaml.contains("fuse"));
        assert!(!yaml.contains("tieredstore"));
    }

    #[test]
    fn level_uses_fluid_field_names() {
        let level = Level {
            medium_type: MediumType::Memory,
            volume_type: Some(VolumeType::EmptyDir),
            volume_source: None,
            path: Some("/dev/shm".to_string()),
            quota: Some(Quantity("2Gi".to_string())),
            quota_list: None,
            high: Some("0.95".to_string()),
            low: None,
        };
        let value = serde_json::to_value(&level).unwrap();
        assert_eq!(value["mediumtype"], "MEM");
        assert_eq!(value["volumeType"], "emptyDir");
        assert_eq!(value["quota"], "2Gi");
        assert!(value.get("low").is_none());
    }
}

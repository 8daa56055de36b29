use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

pub mod v1alpha1;
pub mod v2;

/// Every CRD this provider knows how to render.
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![v1alpha1::thinruntime_api::ThinRuntime::crd(), v2::mapping_api::Mapping::crd()]
}

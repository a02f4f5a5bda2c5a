//! meshgen objects: complete Kubernetes objects composed from fragments.
//!
//! Builders here are infallible. They never set `status`, and they only refer
//! to other generated objects by name.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use meshgen_core::OwnerRef;
use meshgen_resolve::ResolvedConfig;

mod autoscaler;
mod deployment;
mod rbac;
mod service;

pub use autoscaler::autoscaler;
pub use deployment::{deploy_annotations, deployment, mixer_container, proxy_container, rolling_update_strategy, template_labels};
pub use rbac::{cluster_role, cluster_role_binding, cluster_role_name, reader_rules, service_account};
pub use service::service;

fn owner_reference(owner: &OwnerRef) -> OwnerReference {
    OwnerReference {
        api_version: owner.api_version.clone(),
        kind: owner.kind.clone(),
        name: owner.name.clone(),
        uid: owner.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Metadata for a namespaced object; carries the owner reference when one is
/// configured.
pub fn object_meta(name: String, labels: BTreeMap<String, String>, cfg: &ResolvedConfig) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(cfg.namespace.clone()),
        labels: Some(labels),
        owner_references: cfg.owner.as_ref().map(|o| vec![owner_reference(o)]),
        ..Default::default()
    }
}

/// Metadata for a cluster-scoped object. Namespaced owners cannot own
/// cluster-scoped objects, so no owner reference is set.
pub fn cluster_object_meta(name: String, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta { name: Some(name), labels: Some(labels), ..Default::default() }
}

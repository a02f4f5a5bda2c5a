//! meshgen synth: the entry point a reconciler calls once per tick and role.
//!
//! `synthesize` resolves the mesh specification for one role and returns every
//! object that role needs, in a fixed order. Nothing is cached between calls.

#![forbid(unsafe_code)]

use std::time::Instant;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::Resource;
use meshgen_core::{ComponentRole, MeshSpec, Result};
use meshgen_objects as objects;
use meshgen_resolve::{resolve, ReplicaLookup};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One generated object. Serializes as the plain Kubernetes object, including
/// `apiVersion` and `kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Descriptor {
    ServiceAccount(ServiceAccount),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    Deployment(Deployment),
    Service(Service),
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
}

impl Descriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::ServiceAccount(_) => ServiceAccount::KIND,
            Descriptor::ClusterRole(_) => ClusterRole::KIND,
            Descriptor::ClusterRoleBinding(_) => ClusterRoleBinding::KIND,
            Descriptor::Deployment(_) => Deployment::KIND,
            Descriptor::Service(_) => Service::KIND,
            Descriptor::HorizontalPodAutoscaler(_) => HorizontalPodAutoscaler::KIND,
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            Descriptor::ServiceAccount(_) => ServiceAccount::API_VERSION,
            Descriptor::ClusterRole(_) => ClusterRole::API_VERSION,
            Descriptor::ClusterRoleBinding(_) => ClusterRoleBinding::API_VERSION,
            Descriptor::Deployment(_) => Deployment::API_VERSION,
            Descriptor::Service(_) => Service::API_VERSION,
            Descriptor::HorizontalPodAutoscaler(_) => HorizontalPodAutoscaler::API_VERSION,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Descriptor::ServiceAccount(o) => &o.metadata,
            Descriptor::ClusterRole(o) => &o.metadata,
            Descriptor::ClusterRoleBinding(o) => &o.metadata,
            Descriptor::Deployment(o) => &o.metadata,
            Descriptor::Service(o) => &o.metadata,
            Descriptor::HorizontalPodAutoscaler(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// `None` for cluster-scoped objects.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    /// `Kind/name` or `Kind/namespace/name`.
    pub fn key(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}/{}", self.kind(), ns, self.name()),
            None => format!("{}/{}", self.kind(), self.name()),
        }
    }
}

/// Every descriptor `role` needs: ServiceAccount, ClusterRole,
/// ClusterRoleBinding, Deployment, Service, then the autoscaler if enabled.
/// On error nothing is returned for the role.
pub fn synthesize(spec: &MeshSpec, role: ComponentRole, lookup: &dyn ReplicaLookup) -> Result<Vec<Descriptor>> {
    let t0 = Instant::now();
    let cfg = match resolve(spec, role, lookup) {
        Ok(cfg) => cfg,
        Err(e) => {
            counter!("synth_err", 1u64, "role" => role.as_str());
            warn!(%role, error = %e, "configuration rejected");
            return Err(e);
        }
    };

    let mut out = vec![
        Descriptor::ServiceAccount(objects::service_account(&cfg)),
        Descriptor::ClusterRole(objects::cluster_role(&cfg)),
        Descriptor::ClusterRoleBinding(objects::cluster_role_binding(&cfg)),
        Descriptor::Deployment(objects::deployment(role, &cfg)),
        Descriptor::Service(objects::service(role, &cfg)),
    ];
    match objects::autoscaler(role, &cfg) {
        Some(hpa) => out.push(Descriptor::HorizontalPodAutoscaler(hpa)),
        None => debug!(%role, "autoscaling disabled; no autoscaler emitted"),
    }

    histogram!("synth_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);
    counter!("synth_ok", 1u64, "role" => role.as_str());
    info!(%role, namespace = %cfg.namespace, replicas = cfg.replicas, count = out.len(), "synthesized descriptors");
    Ok(out)
}

/// Like [`synthesize`], for callers holding the role as a string.
pub fn synthesize_named(spec: &MeshSpec, role: &str, lookup: &dyn ReplicaLookup) -> Result<Vec<Descriptor>> {
    let role: ComponentRole = role.parse()?;
    synthesize(spec, role, lookup)
}

/// All roles in declaration order, stopping at the first failing role.
pub fn synthesize_all(spec: &MeshSpec, lookup: &dyn ReplicaLookup) -> Result<Vec<(ComponentRole, Vec<Descriptor>)>> {
    ComponentRole::ALL
        .iter()
        .map(|&role| synthesize(spec, role, lookup).map(|d| (role, d)))
        .collect()
}

//! Mesh specification model.
//!
//! Mirrors the shape of the mesh custom resource's `spec` as handed over by the
//! reconciler. Every field the caller may leave out is an `Option`; defaulting
//! happens in `meshgen-resolve`, never here.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Affinity, EnvVar, ResourceRequirements, SecurityContext, Toleration};
use serde::{Deserialize, Serialize};

use crate::ComponentRole;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshSpec {
    /// Control-plane namespace every namespaced descriptor lands in.
    pub namespace: Option<String>,
    /// Mesh custom resource that owns the generated objects.
    pub owner: Option<OwnerRef>,
    pub image_pull_policy: Option<String>,
    pub trust_domain: Option<String>,
    pub control_plane_security_enabled: Option<bool>,
    #[serde(rename = "useMCP")]
    pub use_mcp: Option<bool>,
    #[serde(rename = "watchAdapterCRDs")]
    pub watch_adapter_crds: Option<bool>,
    pub default_resources: Option<ResourceRequirements>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub sds: SdsConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub telemetry: RoleConfig,
    #[serde(default)]
    pub policy: RoleConfig,
}

impl MeshSpec {
    /// Per-role sub-spec.
    pub fn role(&self, role: ComponentRole) -> &RoleConfig {
        match role {
            ComponentRole::Telemetry => &self.telemetry,
            ComponentRole::Policy => &self.policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingConfig {
    pub enabled: Option<bool>,
    #[serde(default)]
    pub zipkin: ZipkinConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinConfig {
    /// `host:port` of the collector
    pub address: Option<String>,
}

/// Secret discovery service settings for the sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdsConfig {
    pub enabled: Option<bool>,
    pub token_audience: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub image: Option<String>,
    pub resources: Option<ResourceRequirements>,
    pub security_context: Option<SecurityContext>,
    pub log_level: Option<String>,
    pub component_log_level: Option<String>,
    pub cluster_domain: Option<String>,
    #[serde(default)]
    pub additional_env_vars: Vec<EnvVar>,
}

/// Settings shared by every mixer role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerConfig {
    pub image: Option<String>,
    pub security_context: Option<SecurityContext>,
    #[serde(default)]
    pub additional_env_vars: Vec<EnvVar>,
    #[serde(default)]
    pub additional_container_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    /// Overrides `mixer.image` for this role.
    pub image: Option<String>,
    pub replica_count: Option<i32>,
    pub min_replicas: Option<i32>,
    pub max_replicas: Option<i32>,
    pub cpu_target_utilization: Option<i32>,
    pub resources: Option<ResourceRequirements>,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub affinity: Option<Affinity>,
    pub tolerations: Option<Vec<Toleration>>,
    #[serde(default)]
    pub additional_env_vars: Vec<EnvVar>,
}

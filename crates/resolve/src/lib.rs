//! meshgen resolve: turns a `MeshSpec` plus one replica lookup into a fully
//! defaulted `ResolvedConfig` for a single role.
//!
//! All "is this set" branching lives here; fragment and object builders only
//! read plain values off `ResolvedConfig`.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, EnvVar, PodSecurityContext, ResourceRequirements, SecurityContext, Toleration,
};
use meshgen_core::{naming, ComponentRole, Error, MeshSpec, OwnerRef, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

mod merge;

pub use merge::{merge_env_vars, merge_label_maps, resolve_resources};

pub const DEFAULT_REPLICA_COUNT: i32 = 1;
pub const DEFAULT_CPU_TARGET_UTILIZATION: i32 = 80;
pub const DEFAULT_TRUST_DOMAIN: &str = "cluster.local";
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_TOKEN_AUDIENCE: &str = "istio-ca";

// ---------------- Replica lookup ----------------

/// Externally managed replica count, e.g. the current size an autoscaler has
/// settled on. `None` means "nothing known" and is never an error.
pub trait ReplicaLookup: Send + Sync {
    fn current_replicas(&self, name: &str, namespace: &str) -> Option<i32>;
}

impl<F> ReplicaLookup for F
where
    F: Fn(&str, &str) -> Option<i32> + Send + Sync,
{
    fn current_replicas(&self, name: &str, namespace: &str) -> Option<i32> {
        self(name, namespace)
    }
}

/// Lookup that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl ReplicaLookup for NoLookup {
    fn current_replicas(&self, _name: &str, _namespace: &str) -> Option<i32> {
        None
    }
}

/// Map-backed lookup keyed by `(name, namespace)`.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    entries: FxHashMap<(String, String), i32>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, namespace: impl Into<String>, replicas: i32) {
        self.entries.insert((name.into(), namespace.into()), replicas);
    }

    pub fn with(mut self, name: impl Into<String>, namespace: impl Into<String>, replicas: i32) -> Self {
        self.insert(name, namespace, replicas);
        self
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl ReplicaLookup for StaticLookup {
    fn current_replicas(&self, name: &str, namespace: &str) -> Option<i32> {
        self.entries.get(&(name.to_string(), namespace.to_string())).copied()
    }
}

/// Observed replica count for the role's autoscaler, or `default`.
pub fn resolve_replica_count(role: ComponentRole, namespace: &str, default: i32, lookup: &dyn ReplicaLookup) -> i32 {
    let name = naming::autoscaler_name(role);
    match lookup.current_replicas(&name, namespace) {
        Some(n) if n >= 0 => n,
        Some(n) => {
            debug!(%role, autoscaler = %name, namespace, observed = n, default, "negative observed replica count; using default");
            default
        }
        None => {
            debug!(%role, autoscaler = %name, namespace, default, "no observed replica count; using default");
            default
        }
    }
}

// ---------------- Resolved configuration ----------------

/// Where the mixer pulls its configuration from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStore {
    /// Kubernetes API (`k8s://`)
    Native,
    /// MCP over plaintext
    Mcp,
    /// MCP over mutual TLS
    SecureMcp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autoscaling {
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub cpu_target_utilization: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sds {
    pub token_audience: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProxy {
    pub image: String,
    pub resources: Option<ResourceRequirements>,
    pub security_context: Option<SecurityContext>,
    pub log_level: Option<String>,
    pub component_log_level: Option<String>,
    pub cluster_domain: String,
    pub additional_env: Vec<EnvVar>,
}

/// Everything builders need for one role, with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub namespace: String,
    pub owner: Option<OwnerRef>,
    pub image: String,
    pub image_pull_policy: Option<String>,
    pub replicas: i32,
    pub autoscaling: Option<Autoscaling>,
    pub resources: Option<ResourceRequirements>,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub affinity: Option<Affinity>,
    pub tolerations: Option<Vec<Toleration>>,
    pub security_context: Option<SecurityContext>,
    pub pod_security_context: Option<PodSecurityContext>,
    /// Env shared by all mixer roles.
    pub mixer_env: Vec<EnvVar>,
    /// Env of the role being synthesized only.
    pub role_env: Vec<EnvVar>,
    pub additional_args: Vec<String>,
    pub log_level: Option<String>,
    /// Zipkin collector `host:port`; `Some` iff tracing is enabled.
    pub zipkin_address: Option<String>,
    pub config_store: ConfigStore,
    pub watch_adapter_crds: bool,
    pub control_plane_security: bool,
    pub trust_domain: String,
    /// `Some` iff secure discovery is enabled.
    pub sds: Option<Sds>,
    pub proxy: ResolvedProxy,
}

fn enabled(flag: Option<bool>) -> bool {
    flag.unwrap_or(false)
}

fn non_empty(v: Option<&String>) -> Option<String> {
    v.filter(|s| !s.is_empty()).cloned()
}

fn role_field(role: ComponentRole, leaf: &str) -> String {
    format!("spec.{}.{}", role.as_str(), leaf)
}

/// Validate `spec` for `role` and apply every default. Performs the single
/// replica lookup of a synthesis call.
pub fn resolve(spec: &MeshSpec, role: ComponentRole, lookup: &dyn ReplicaLookup) -> Result<ResolvedConfig> {
    let namespace = non_empty(spec.namespace.as_ref()).ok_or_else(|| Error::missing("spec.namespace"))?;
    if !naming::is_dns_label(&namespace) {
        return Err(Error::invalid("spec.namespace", format!("{:?} is not a valid DNS-1123 label", namespace)));
    }

    let rc = spec.role(role);
    let image = non_empty(rc.image.as_ref())
        .or_else(|| non_empty(spec.mixer.image.as_ref()))
        .ok_or_else(|| Error::missing(role_field(role, "image")))?;
    let proxy_image = non_empty(spec.proxy.image.as_ref()).ok_or_else(|| Error::missing("spec.proxy.image"))?;

    let control_plane_security = enabled(spec.control_plane_security_enabled);
    let trust_domain = match non_empty(spec.trust_domain.as_ref()) {
        Some(td) => td,
        None if control_plane_security => {
            return Err(Error::invalid(
                "spec.trustDomain",
                "controlPlaneSecurityEnabled requires an explicit trust domain",
            ))
        }
        None => DEFAULT_TRUST_DOMAIN.to_string(),
    };

    let zipkin_address = if enabled(spec.tracing.enabled) {
        Some(non_empty(spec.tracing.zipkin.address.as_ref()).ok_or_else(|| Error::missing("spec.tracing.zipkin.address"))?)
    } else {
        None
    };

    let config_store = match (enabled(spec.use_mcp), control_plane_security) {
        (false, _) => ConfigStore::Native,
        (true, false) => ConfigStore::Mcp,
        (true, true) => ConfigStore::SecureMcp,
    };

    let sds = enabled(spec.sds.enabled).then(|| Sds {
        token_audience: non_empty(spec.sds.token_audience.as_ref()).unwrap_or_else(|| DEFAULT_TOKEN_AUDIENCE.to_string()),
    });

    let default_replicas = rc.replica_count.unwrap_or(DEFAULT_REPLICA_COUNT);
    if default_replicas < 0 {
        return Err(Error::invalid(role_field(role, "replicaCount"), "must not be negative"));
    }
    let autoscaling = resolve_autoscaling(role, rc)?;
    let replicas = resolve_replica_count(role, &namespace, default_replicas, lookup);

    let security_context = spec.mixer.security_context.clone();
    let pod_security_context = security_context.as_ref().map(pod_security_context);

    Ok(ResolvedConfig {
        namespace,
        owner: spec.owner.clone(),
        image,
        image_pull_policy: spec.image_pull_policy.clone(),
        replicas,
        autoscaling,
        resources: resolve_resources(rc.resources.as_ref(), spec.default_resources.as_ref()),
        node_selector: rc.node_selector.clone(),
        affinity: rc.affinity.clone(),
        tolerations: rc.tolerations.clone(),
        security_context,
        pod_security_context,
        mixer_env: spec.mixer.additional_env_vars.clone(),
        role_env: rc.additional_env_vars.clone(),
        additional_args: spec.mixer.additional_container_args.clone(),
        log_level: non_empty(spec.logging.level.as_ref()),
        zipkin_address,
        config_store,
        watch_adapter_crds: enabled(spec.watch_adapter_crds),
        control_plane_security,
        trust_domain,
        sds,
        proxy: ResolvedProxy {
            image: proxy_image,
            resources: resolve_resources(spec.proxy.resources.as_ref(), spec.default_resources.as_ref()),
            security_context: spec.proxy.security_context.clone(),
            log_level: non_empty(spec.proxy.log_level.as_ref()),
            component_log_level: non_empty(spec.proxy.component_log_level.as_ref()),
            cluster_domain: non_empty(spec.proxy.cluster_domain.as_ref())
                .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
            additional_env: spec.proxy.additional_env_vars.clone(),
        },
    })
}

/// Autoscaling is on only when both bounds are set and leave room to scale.
fn resolve_autoscaling(role: ComponentRole, rc: &meshgen_core::RoleConfig) -> Result<Option<Autoscaling>> {
    let (min, max) = match (rc.min_replicas, rc.max_replicas) {
        (Some(min), Some(max)) => (min, max),
        _ => return Ok(None),
    };
    if min < 1 {
        return Err(Error::invalid(role_field(role, "minReplicas"), "must be at least 1"));
    }
    if max < min {
        return Err(Error::invalid(role_field(role, "maxReplicas"), "must not be below minReplicas"));
    }
    if max == min {
        return Ok(None);
    }
    let cpu_target_utilization = rc.cpu_target_utilization.unwrap_or(DEFAULT_CPU_TARGET_UTILIZATION);
    if !(1..=100).contains(&cpu_target_utilization) {
        return Err(Error::invalid(role_field(role, "cpuTargetUtilization"), "must be between 1 and 100"));
    }
    Ok(Some(Autoscaling { min_replicas: min, max_replicas: max, cpu_target_utilization }))
}

/// Pod-level context derived from the mixer container context.
pub fn pod_security_context(sc: &SecurityContext) -> PodSecurityContext {
    PodSecurityContext {
        se_linux_options: sc.se_linux_options.clone(),
        windows_options: sc.windows_options.clone(),
        run_as_user: sc.run_as_user,
        run_as_group: sc.run_as_group,
        run_as_non_root: sc.run_as_non_root,
        ..Default::default()
    }
}

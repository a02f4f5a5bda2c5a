use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use meshgen_core::naming;
use meshgen_resolve::ResolvedConfig;

use crate::{cluster_object_meta, object_meta};

const READ_VERBS: [&str; 3] = ["get", "watch", "list"];
const MESH_API_GROUPS: [&str; 5] = [
    "config.istio.io",
    "rbac.istio.io",
    "security.istio.io",
    "networking.istio.io",
    "authentication.istio.io",
];
const CORE_RESOURCES: [&str; 6] = ["endpoints", "pods", "services", "nodes", "replicationcontrollers", "namespaces"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn read_rule(api_groups: &[&str], resources: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(strings(api_groups)),
        resources: Some(strings(resources)),
        verbs: strings(&READ_VERBS),
        ..Default::default()
    }
}

/// Static read-only allowlist. Not configurable.
pub fn reader_rules() -> Vec<PolicyRule> {
    vec![
        read_rule(&MESH_API_GROUPS, &["*"]),
        read_rule(&[""], &CORE_RESOURCES),
        read_rule(&["apps"], &["replicasets"]),
    ]
}

pub fn cluster_role_name(cfg: &ResolvedConfig) -> String {
    naming::qualified_name(naming::CLUSTER_ROLE_BASE, &cfg.namespace)
}

pub fn service_account(cfg: &ResolvedConfig) -> ServiceAccount {
    ServiceAccount {
        metadata: object_meta(naming::SERVICE_ACCOUNT_NAME.to_string(), naming::mixer_labels(), cfg),
        ..Default::default()
    }
}

pub fn cluster_role(cfg: &ResolvedConfig) -> ClusterRole {
    ClusterRole {
        metadata: cluster_object_meta(cluster_role_name(cfg), naming::mixer_labels()),
        rules: Some(reader_rules()),
        ..Default::default()
    }
}

pub fn cluster_role_binding(cfg: &ResolvedConfig) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: cluster_object_meta(cluster_role_name(cfg), naming::mixer_labels()),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: cluster_role_name(cfg),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: naming::SERVICE_ACCOUNT_NAME.to_string(),
            namespace: Some(cfg.namespace.clone()),
            ..Default::default()
        }]),
    }
}

//! Canonical names and label sets for generated objects.
//!
//! Everything here is a pure function of the role (and namespace where the
//! object is cluster scoped). Selector labels in particular must never change
//! between releases: the platform refuses to mutate a workload's selector.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ComponentRole;

// ---------------- Fixed names ----------------
pub const SERVICE_ACCOUNT_NAME: &str = "istio-mixer-service-account";
pub const CLUSTER_ROLE_BASE: &str = "istio-mixer";
pub const PROXY_CONTAINER_NAME: &str = "istio-proxy";
pub const CONFIG_STORE_SERVICE: &str = "istio-galley";

// ---------------- Label keys / values ----------------
pub const LABEL_ISTIO: &str = "istio";
pub const LABEL_MIXER_TYPE: &str = "istio-mixer-type";
pub const LABEL_APP: &str = "app";
pub const LABEL_TLS_MODE: &str = "security.istio.io/tlsMode";
pub const MIXER: &str = "mixer";
pub const TLS_MODE_DISABLED: &str = "disabled";

// DNS-1123 label: lowercase alnum and '-', must start and end alnum.
static DNS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());
pub const DNS_LABEL_MAX: usize = 63;

/// Workload and service name: `istio-<role>`.
pub fn component_name(role: ComponentRole) -> String {
    format!("istio-{}", role.as_str())
}

/// `<base>-<namespace>`, used for cluster-scoped objects that would otherwise
/// collide between meshes installed in different namespaces.
pub fn qualified_name(base: &str, namespace: &str) -> String {
    format!("{}-{}", base, namespace)
}

pub fn autoscaler_name(role: ComponentRole) -> String {
    format!("istio-{}-autoscaler", role.as_str())
}

pub fn adapter_secret_name(role: ComponentRole) -> String {
    format!("{}-adapter-secret", role.as_str())
}

/// Secret holding the workload certificate chain for the service account.
pub fn cert_secret_name() -> String {
    format!("istio.{}", SERVICE_ACCOUNT_NAME)
}

/// Labels shared by every mixer object regardless of role.
pub fn mixer_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(LABEL_ISTIO.to_string(), MIXER.to_string())])
}

/// Workload selector. Only ever computed here.
pub fn label_selector(role: ComponentRole) -> BTreeMap<String, String> {
    let mut labels = mixer_labels();
    labels.insert(LABEL_MIXER_TYPE.to_string(), role.as_str().to_string());
    labels
}

/// Labels only the pod template carries, on top of [`label_selector`].
pub fn pod_identity_labels(role: ComponentRole) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_APP.to_string(), role.as_str().to_string());
    labels.insert(LABEL_TLS_MODE.to_string(), TLS_MODE_DISABLED.to_string());
    labels
}

pub fn is_dns_label(s: &str) -> bool {
    s.len() <= DNS_LABEL_MAX && DNS_LABEL.is_match(s)
}

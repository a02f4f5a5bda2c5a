//! Container environment.

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector};
use meshgen_resolve::{merge_env_vars, ResolvedConfig};

pub fn env(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

fn field_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                api_version: Some("v1".to_string()),
                field_path: field_path.to_string(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Baseline, then mixer-wide env, then the env of the role `cfg` was
/// resolved for.
pub fn container_env(cfg: &ResolvedConfig) -> Vec<EnvVar> {
    let base = [env("GOMAXPROCS", "6")];
    let envs = merge_env_vars(&base, &cfg.mixer_env);
    merge_env_vars(&envs, &cfg.role_env)
}

pub fn proxy_env(cfg: &ResolvedConfig) -> Vec<EnvVar> {
    let mut envs = vec![
        field_env("POD_NAME", "metadata.name"),
        field_env("POD_NAMESPACE", "metadata.namespace"),
        field_env("INSTANCE_IP", "status.podIP"),
        field_env("SERVICE_ACCOUNT", "spec.serviceAccountName"),
        field_env("HOST_IP", "status.hostIP"),
        field_env("ISTIO_META_POD_NAME", "metadata.name"),
        env("ISTIO_META_CONFIG_NAMESPACE", &cfg.namespace),
    ];
    if cfg.sds.is_some() {
        envs.push(env("SDS_ENABLED", "true"));
    }
    merge_env_vars(&envs, &cfg.proxy.additional_env)
}

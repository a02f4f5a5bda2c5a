//! Startup arguments for the mixer and its sidecar proxy.

use meshgen_core::{naming, ComponentRole};
use meshgen_resolve::{ConfigStore, ResolvedConfig};

pub const MIXER_SOCKET: &str = "unix:///sock/mixer.socket";
pub const MONITORING_PORT: i32 = 15014;
pub const CONFIG_STORE_PORT: i32 = 9901;

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| s.to_string()));
}

/// `<scheme>://istio-galley.<ns>.svc:9901`
pub fn config_store_url(store: ConfigStore, namespace: &str) -> String {
    let scheme = match store {
        ConfigStore::Native => return "k8s://".to_string(),
        ConfigStore::Mcp => "mcp",
        ConfigStore::SecureMcp => "mcps",
    };
    format!("{}://{}.{}.svc:{}", scheme, naming::CONFIG_STORE_SERVICE, namespace, CONFIG_STORE_PORT)
}

pub fn container_args(role: ComponentRole, cfg: &ResolvedConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(24 + cfg.additional_args.len());
    push(&mut args, &["--address", MIXER_SOCKET, "--configDefaultNamespace", cfg.namespace.as_str()]);
    args.push("--monitoringPort".to_string());
    args.push(MONITORING_PORT.to_string());

    if let Some(level) = &cfg.log_level {
        args.push(format!("--log_output_level={}", level));
    }

    if let Some(addr) = &cfg.zipkin_address {
        args.push("--trace_zipkin_url".to_string());
        args.push(format!("http://{}/api/v1/spans", addr));
    }

    args.push("--configStoreURL".to_string());
    args.push(config_store_url(cfg.config_store, &cfg.namespace));
    if cfg.config_store == ConfigStore::SecureMcp && role == ComponentRole::Telemetry {
        push(
            &mut args,
            &[
                "--certFile",
                "/etc/certs/cert-chain.pem",
                "--keyFile",
                "/etc/certs/key.pem",
                "--caCertFile",
                "/etc/certs/root-cert.pem",
            ],
        );
    }

    args.push(format!("--useAdapterCRDs={}", cfg.watch_adapter_crds));

    match role {
        ComponentRole::Telemetry => push(
            &mut args,
            &["--averageLatencyThreshold", "100ms", "--loadsheddingMode", "enforce"],
        ),
        ComponentRole::Policy => {}
    }

    // caller-supplied, passed through untouched
    args.extend(cfg.additional_args.iter().cloned());
    args
}

pub fn control_plane_auth_policy(secure: bool) -> &'static str {
    if secure { "MUTUAL_TLS" } else { "NONE" }
}

pub fn proxy_args(role: ComponentRole, cfg: &ResolvedConfig) -> Vec<String> {
    let mut args = vec![
        "proxy".to_string(),
        "--serviceCluster".to_string(),
        naming::component_name(role),
        "--templateFile".to_string(),
        format!("/etc/istio/proxy/envoy_{}.yaml.tmpl", role.as_str()),
        "--controlPlaneAuthPolicy".to_string(),
        control_plane_auth_policy(cfg.control_plane_security).to_string(),
        "--domain".to_string(),
        format!("$(POD_NAMESPACE).svc.{}", cfg.proxy.cluster_domain),
        "--trust-domain".to_string(),
        cfg.trust_domain.clone(),
        "--configPath".to_string(),
        "/tmp".to_string(),
    ];
    if let Some(level) = &cfg.proxy.log_level {
        args.push(format!("--proxyLogLevel={}", level));
    }
    if let Some(level) = &cfg.proxy.component_log_level {
        args.push(format!("--proxyComponentLogLevel={}", level));
    }
    if let Some(level) = &cfg.log_level {
        args.push(format!("--log_output_level={}", level));
    }
    args
}

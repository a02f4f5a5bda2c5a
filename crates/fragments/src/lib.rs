//! meshgen fragments: the pieces a pod spec is assembled from.
//!
//! Each builder is a total function of the role and a `ResolvedConfig`.
//! Optional fragments are emitted only when their toggle resolved to on, and
//! list order never depends on anything but the input.

#![forbid(unsafe_code)]

use k8s_openapi::api::core::v1::{ContainerPort, HTTPGetAction, Probe};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub mod args;
pub mod env;
pub mod volumes;

pub use args::{config_store_url, container_args, control_plane_auth_policy, proxy_args};
pub use env::{container_env, proxy_env};
pub use volumes::{mixer_volume_mounts, proxy_volume_mounts, volumes};

pub const MIXER_GRPC_PORT: i32 = 9091;
pub const MIXER_MTLS_PORT: i32 = 15004;
pub const ENVOY_PROM_PORT: i32 = 15090;
pub const PROMETHEUS_PORT: i32 = 42422;

// Liveness probe constants
pub const PROBE_PATH: &str = "/version";
pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 5;
pub const PROBE_PERIOD_SECONDS: i32 = 5;
pub const PROBE_FAILURE_THRESHOLD: i32 = 3;
pub const PROBE_SUCCESS_THRESHOLD: i32 = 1;
pub const PROBE_TIMEOUT_SECONDS: i32 = 1;

pub fn liveness_probe() -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(PROBE_PATH.to_string()),
            port: IntOrString::Int(args::MONITORING_PORT),
            scheme: Some("HTTP".to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY_SECONDS),
        period_seconds: Some(PROBE_PERIOD_SECONDS),
        failure_threshold: Some(PROBE_FAILURE_THRESHOLD),
        success_threshold: Some(PROBE_SUCCESS_THRESHOLD),
        timeout_seconds: Some(PROBE_TIMEOUT_SECONDS),
        ..Default::default()
    }
}

fn tcp_port(port: i32, name: Option<&str>) -> ContainerPort {
    ContainerPort {
        container_port: port,
        protocol: Some("TCP".to_string()),
        name: name.map(str::to_string),
        ..Default::default()
    }
}

pub fn mixer_ports() -> Vec<ContainerPort> {
    vec![tcp_port(args::MONITORING_PORT, None), tcp_port(PROMETHEUS_PORT, None)]
}

pub fn proxy_ports() -> Vec<ContainerPort> {
    vec![
        tcp_port(MIXER_GRPC_PORT, None),
        tcp_port(MIXER_MTLS_PORT, None),
        tcp_port(ENVOY_PROM_PORT, Some("http-envoy-prom")),
    ]
}

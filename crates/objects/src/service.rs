use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use meshgen_core::{naming, ComponentRole};
use meshgen_fragments::{args::MONITORING_PORT, MIXER_GRPC_PORT, MIXER_MTLS_PORT, PROMETHEUS_PORT};
use meshgen_resolve::ResolvedConfig;

use crate::object_meta;

fn port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        protocol: Some("TCP".to_string()),
        target_port: Some(IntOrString::Int(port)),
        ..Default::default()
    }
}

pub fn service(role: ComponentRole, cfg: &ResolvedConfig) -> Service {
    let mut ports = vec![
        port("grpc-mixer", MIXER_GRPC_PORT),
        port("grpc-mixer-mtls", MIXER_MTLS_PORT),
        port("http-monitoring", MONITORING_PORT),
    ];
    if role == ComponentRole::Telemetry {
        ports.push(port("prometheus", PROMETHEUS_PORT));
    }
    Service {
        metadata: object_meta(naming::component_name(role), naming::label_selector(role), cfg),
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            ports: Some(ports),
            selector: Some(naming::label_selector(role)),
            ..Default::default()
        }),
        status: None,
    }
}

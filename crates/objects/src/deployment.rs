use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use meshgen_core::{naming, ComponentRole};
use meshgen_fragments as fragments;
use meshgen_resolve::{merge_label_maps, ResolvedConfig};

use crate::object_meta;

const TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";
const TERMINATION_MESSAGE_POLICY: &str = "File";

/// Selector labels first, then the pod identity labels.
pub fn template_labels(role: ComponentRole) -> BTreeMap<String, String> {
    merge_label_maps([&naming::label_selector(role), &naming::pod_identity_labels(role)])
}

pub fn rolling_update_strategy() -> DeploymentStrategy {
    DeploymentStrategy {
        type_: Some("RollingUpdate".to_string()),
        rolling_update: Some(RollingUpdateDeployment {
            max_surge: Some(IntOrString::Int(1)),
            max_unavailable: Some(IntOrString::Int(0)),
        }),
    }
}

pub fn deploy_annotations() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("scheduler.alpha.kubernetes.io/critical-pod".to_string(), String::new()),
        ("sidecar.istio.io/inject".to_string(), "false".to_string()),
    ])
}

pub fn mixer_container(role: ComponentRole, cfg: &ResolvedConfig) -> Container {
    Container {
        name: role.as_str().to_string(),
        image: Some(cfg.image.clone()),
        image_pull_policy: cfg.image_pull_policy.clone(),
        ports: Some(fragments::mixer_ports()),
        args: Some(fragments::container_args(role, cfg)),
        env: Some(fragments::container_env(cfg)),
        resources: cfg.resources.clone(),
        volume_mounts: Some(fragments::mixer_volume_mounts(role, cfg)),
        liveness_probe: Some(fragments::liveness_probe()),
        termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
        termination_message_policy: Some(TERMINATION_MESSAGE_POLICY.to_string()),
        security_context: cfg.security_context.clone(),
        ..Default::default()
    }
}

pub fn proxy_container(role: ComponentRole, cfg: &ResolvedConfig) -> Container {
    Container {
        name: naming::PROXY_CONTAINER_NAME.to_string(),
        image: Some(cfg.proxy.image.clone()),
        image_pull_policy: cfg.image_pull_policy.clone(),
        ports: Some(fragments::proxy_ports()),
        args: Some(fragments::proxy_args(role, cfg)),
        env: Some(fragments::proxy_env(cfg)),
        resources: cfg.proxy.resources.clone(),
        volume_mounts: Some(fragments::proxy_volume_mounts(cfg)),
        termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
        termination_message_policy: Some(TERMINATION_MESSAGE_POLICY.to_string()),
        security_context: cfg.proxy.security_context.clone(),
        ..Default::default()
    }
}

pub fn deployment(role: ComponentRole, cfg: &ResolvedConfig) -> Deployment {
    Deployment {
        metadata: object_meta(naming::component_name(role), naming::label_selector(role), cfg),
        spec: Some(DeploymentSpec {
            replicas: Some(cfg.replicas),
            strategy: Some(rolling_update_strategy()),
            selector: LabelSelector {
                match_labels: Some(naming::label_selector(role)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(template_labels(role)),
                    annotations: Some(deploy_annotations()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(naming::SERVICE_ACCOUNT_NAME.to_string()),
                    volumes: Some(fragments::volumes(role, cfg)),
                    affinity: cfg.affinity.clone(),
                    node_selector: cfg.node_selector.clone(),
                    tolerations: cfg.tolerations.clone(),
                    containers: vec![mixer_container(role, cfg), proxy_container(role, cfg)],
                    security_context: cfg.pod_security_context.clone(),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

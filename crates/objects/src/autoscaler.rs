use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec, MetricSpec, MetricTarget,
    ResourceMetricSource,
};
use meshgen_core::{naming, ComponentRole};
use meshgen_resolve::ResolvedConfig;

use crate::object_meta;

/// `None` unless autoscaling resolved on for this role.
pub fn autoscaler(role: ComponentRole, cfg: &ResolvedConfig) -> Option<HorizontalPodAutoscaler> {
    let scaling = cfg.autoscaling.as_ref()?;
    Some(HorizontalPodAutoscaler {
        metadata: object_meta(naming::autoscaler_name(role), naming::label_selector(role), cfg),
        spec: Some(HorizontalPodAutoscalerSpec {
            min_replicas: Some(scaling.min_replicas),
            max_replicas: scaling.max_replicas,
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: "Deployment".to_string(),
                name: naming::component_name(role),
            },
            metrics: Some(vec![MetricSpec {
                type_: "Resource".to_string(),
                resource: Some(ResourceMetricSource {
                    name: "cpu".to_string(),
                    target: MetricTarget {
                        type_: "Utilization".to_string(),
                        average_utilization: Some(scaling.cpu_target_utilization),
                        ..Default::default()
                    },
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    })
}

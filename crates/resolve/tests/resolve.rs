use meshgen_core::{ComponentRole, Error, MeshSpec};
use meshgen_resolve::{resolve, resolve_replica_count, ConfigStore, NoLookup, StaticLookup};

fn base_spec() -> MeshSpec {
    let mut spec = MeshSpec::default();
    spec.namespace = Some("istio-system".into());
    spec.mixer.image = Some("istio/mixer:1.2.2".into());
    spec.proxy.image = Some("istio/proxyv2:1.2.2".into());
    spec
}

#[test]
fn replica_count_falls_back_to_default() {
    assert_eq!(resolve_replica_count(ComponentRole::Telemetry, "istio-system", 2, &NoLookup), 2);
    let lookup = StaticLookup::new().with("istio-telemetry-autoscaler", "istio-system", 5);
    assert_eq!(resolve_replica_count(ComponentRole::Telemetry, "istio-system", 2, &lookup), 5);
    // keyed by role and namespace
    assert_eq!(resolve_replica_count(ComponentRole::Policy, "istio-system", 2, &lookup), 2);
    assert_eq!(resolve_replica_count(ComponentRole::Telemetry, "other", 2, &lookup), 2);
}

#[test]
fn negative_observed_count_is_ignored() {
    let lookup = StaticLookup::new().with("istio-telemetry-autoscaler", "istio-system", -3);
    assert_eq!(resolve_replica_count(ComponentRole::Telemetry, "istio-system", 2, &lookup), 2);
    let cfg = resolve(&base_spec(), ComponentRole::Telemetry, &lookup).unwrap();
    assert_eq!(cfg.replicas, 1);

    let lookup = StaticLookup::new().with("istio-telemetry-autoscaler", "istio-system", 0);
    assert_eq!(resolve_replica_count(ComponentRole::Telemetry, "istio-system", 2, &lookup), 0);
}

#[test]
fn closures_are_lookups() {
    let lookup = |name: &str, _ns: &str| if name.starts_with("istio-policy") { Some(3) } else { None };
    assert_eq!(resolve_replica_count(ComponentRole::Policy, "istio-system", 1, &lookup), 3);
}

#[test]
fn resolve_applies_defaults() {
    let cfg = resolve(&base_spec(), ComponentRole::Policy, &NoLookup).expect("resolve");
    assert_eq!(cfg.namespace, "istio-system");
    assert_eq!(cfg.image, "istio/mixer:1.2.2");
    assert_eq!(cfg.replicas, 1);
    assert_eq!(cfg.trust_domain, "cluster.local");
    assert_eq!(cfg.proxy.cluster_domain, "cluster.local");
    assert_eq!(cfg.config_store, ConfigStore::Native);
    assert!(!cfg.watch_adapter_crds);
    assert!(cfg.sds.is_none());
    assert!(cfg.zipkin_address.is_none());
    assert!(cfg.autoscaling.is_none());
    assert!(cfg.pod_security_context.is_none());
}

#[test]
fn role_image_overrides_mixer_image() {
    let mut spec = base_spec();
    spec.telemetry.image = Some("custom/telemetry:dev".into());
    let cfg = resolve(&spec, ComponentRole::Telemetry, &NoLookup).unwrap();
    assert_eq!(cfg.image, "custom/telemetry:dev");
}

#[test]
fn config_store_three_way_choice() {
    let mut spec = base_spec();
    spec.use_mcp = Some(true);
    assert_eq!(resolve(&spec, ComponentRole::Policy, &NoLookup).unwrap().config_store, ConfigStore::Mcp);
    spec.control_plane_security_enabled = Some(true);
    spec.trust_domain = Some("example.org".into());
    assert_eq!(resolve(&spec, ComponentRole::Policy, &NoLookup).unwrap().config_store, ConfigStore::SecureMcp);
}

#[test]
fn missing_required_fields_fail_fast() {
    let mut spec = base_spec();
    spec.namespace = None;
    assert_eq!(resolve(&spec, ComponentRole::Telemetry, &NoLookup), Err(Error::missing("spec.namespace")));

    let mut spec = base_spec();
    spec.mixer.image = None;
    assert_eq!(resolve(&spec, ComponentRole::Telemetry, &NoLookup), Err(Error::missing("spec.telemetry.image")));

    let mut spec = base_spec();
    spec.proxy.image = Some(String::new());
    assert_eq!(resolve(&spec, ComponentRole::Policy, &NoLookup), Err(Error::missing("spec.proxy.image")));

    let mut spec = base_spec();
    spec.tracing.enabled = Some(true);
    assert_eq!(resolve(&spec, ComponentRole::Policy, &NoLookup), Err(Error::missing("spec.tracing.zipkin.address")));
}

#[test]
fn secure_transport_requires_trust_domain() {
    let mut spec = base_spec();
    spec.control_plane_security_enabled = Some(true);
    let err = resolve(&spec, ComponentRole::Telemetry, &NoLookup).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "spec.trustDomain"));
}

#[test]
fn invalid_namespace_rejected() {
    let mut spec = base_spec();
    spec.namespace = Some("Istio_System".into());
    assert!(matches!(
        resolve(&spec, ComponentRole::Telemetry, &NoLookup),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn autoscaling_needs_room_to_scale() {
    let mut spec = base_spec();
    spec.telemetry.min_replicas = Some(2);
    spec.telemetry.max_replicas = Some(2);
    assert!(resolve(&spec, ComponentRole::Telemetry, &NoLookup).unwrap().autoscaling.is_none());

    spec.telemetry.max_replicas = Some(5);
    let a = resolve(&spec, ComponentRole::Telemetry, &NoLookup).unwrap().autoscaling.expect("autoscaling");
    assert_eq!((a.min_replicas, a.max_replicas, a.cpu_target_utilization), (2, 5, 80));

    spec.telemetry.min_replicas = Some(0);
    assert!(resolve(&spec, ComponentRole::Telemetry, &NoLookup).is_err());

    spec.telemetry.min_replicas = Some(5);
    spec.telemetry.max_replicas = Some(2);
    assert_eq!(
        resolve(&spec, ComponentRole::Telemetry, &NoLookup),
        Err(Error::invalid("spec.telemetry.maxReplicas", "must not be below minReplicas"))
    );
}

#[test]
fn sds_audience_defaults() {
    let mut spec = base_spec();
    spec.sds.enabled = Some(true);
    let cfg = resolve(&spec, ComponentRole::Policy, &NoLookup).unwrap();
    assert_eq!(cfg.sds.map(|s| s.token_audience).as_deref(), Some("istio-ca"));
}

#[test]
fn env_sources_are_picked_by_role() {
    let mut spec = base_spec();
    spec.telemetry.additional_env_vars = vec![k8s_openapi::api::core::v1::EnvVar { name: "T".into(), ..Default::default() }];
    spec.policy.additional_env_vars = vec![k8s_openapi::api::core::v1::EnvVar { name: "P".into(), ..Default::default() }];
    let cfg = resolve(&spec, ComponentRole::Policy, &NoLookup).unwrap();
    assert_eq!(cfg.role_env.len(), 1);
    assert_eq!(cfg.role_env[0].name, "P");
}

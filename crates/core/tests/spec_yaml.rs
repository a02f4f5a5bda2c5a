use meshgen_core::{ComponentRole, MeshSpec};

const MESH: &str = r#"
namespace: istio-system
useMCP: true
watchAdapterCRDs: false
controlPlaneSecurityEnabled: true
trustDomain: example.org
sds:
  enabled: true
  tokenAudience: istio-ca
mixer:
  image: docker.io/istio/mixer:1.2.2
  additionalContainerArgs: ["--foo", "bar"]
telemetry:
  replicaCount: 2
  minReplicas: 1
  maxReplicas: 5
  additionalEnvVars:
    - name: A
      value: "1"
proxy:
  image: docker.io/istio/proxyv2:1.2.2
"#;

#[test]
fn deserializes_camel_case_spec() {
    let spec: MeshSpec = serde_yaml::from_str(MESH).expect("parse");
    assert_eq!(spec.namespace.as_deref(), Some("istio-system"));
    assert_eq!(spec.use_mcp, Some(true));
    assert_eq!(spec.watch_adapter_crds, Some(false));
    assert_eq!(spec.sds.token_audience.as_deref(), Some("istio-ca"));
    assert_eq!(spec.mixer.additional_container_args, vec!["--foo", "bar"]);
    let telemetry = spec.role(ComponentRole::Telemetry);
    assert_eq!(telemetry.replica_count, Some(2));
    assert_eq!(telemetry.additional_env_vars[0].name, "A");
    // untouched sections default to all-unset
    assert_eq!(spec.role(ComponentRole::Policy).replica_count, None);
    assert_eq!(spec.tracing.enabled, None);
}

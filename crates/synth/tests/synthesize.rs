use meshgen_core::{ComponentRole, Error, MeshSpec};
use meshgen_resolve::{NoLookup, StaticLookup};
use meshgen_synth::{synthesize, synthesize_all, synthesize_named, Descriptor};

const MESH: &str = r#"
namespace: istio-system
imagePullPolicy: IfNotPresent
useMCP: true
logging:
  level: "default:info"
defaultResources:
  requests:
    cpu: 10m
mixer:
  image: docker.io/istio/mixer:1.2.2
  additionalEnvVars:
    - name: SHARED
      value: "1"
telemetry:
  replicaCount: 2
  minReplicas: 1
  maxReplicas: 5
proxy:
  image: docker.io/istio/proxyv2:1.2.2
"#;

fn mesh() -> MeshSpec {
    serde_yaml::from_str(MESH).expect("mesh yaml")
}

fn deployment_of(descriptors: &[Descriptor]) -> &k8s_openapi::api::apps::v1::Deployment {
    descriptors
        .iter()
        .find_map(|d| match d {
            Descriptor::Deployment(dep) => Some(dep),
            _ => None,
        })
        .expect("deployment descriptor")
}

#[test]
fn descriptor_order_is_fixed() {
    let out = synthesize(&mesh(), ComponentRole::Telemetry, &NoLookup).unwrap();
    let kinds: Vec<_> = out.iter().map(Descriptor::kind).collect();
    assert_eq!(
        kinds,
        ["ServiceAccount", "ClusterRole", "ClusterRoleBinding", "Deployment", "Service", "HorizontalPodAutoscaler"]
    );
    // policy has no autoscaling bounds
    let out = synthesize(&mesh(), ComponentRole::Policy, &NoLookup).unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(out[3].key(), "Deployment/istio-system/istio-policy");
    assert_eq!(out[1].key(), "ClusterRole/istio-mixer-istio-system");
}

#[test]
fn repeated_calls_are_byte_identical() {
    let spec = mesh();
    let lookup = StaticLookup::new().with("istio-telemetry-autoscaler", "istio-system", 3);
    let a = serde_json::to_vec(&synthesize(&spec, ComponentRole::Telemetry, &lookup).unwrap()).unwrap();
    let b = serde_json::to_vec(&synthesize(&spec, ComponentRole::Telemetry, &lookup).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn serialized_objects_carry_type_meta_and_no_status() {
    let out = synthesize(&mesh(), ComponentRole::Policy, &NoLookup).unwrap();
    for d in &out {
        let v = serde_json::to_value(d).unwrap();
        assert_eq!(v["kind"], d.kind());
        assert_eq!(v["apiVersion"], d.api_version());
        assert!(v.get("status").is_none(), "{} must not carry status", d.key());
    }
}

#[test]
fn lookup_result_drives_replicas() {
    let spec = mesh();
    let dep = |lookup: &dyn meshgen_resolve::ReplicaLookup| {
        let out = synthesize(&spec, ComponentRole::Telemetry, lookup).unwrap();
        deployment_of(&out).spec.as_ref().and_then(|s| s.replicas)
    };
    assert_eq!(dep(&NoLookup), Some(2));
    assert_eq!(dep(&StaticLookup::new().with("istio-telemetry-autoscaler", "istio-system", 5)), Some(5));
}

#[test]
fn unknown_role_fails_fast() {
    let err = synthesize_named(&mesh(), "galley", &NoLookup).unwrap_err();
    assert_eq!(err, Error::InvalidRole("galley".into()));
    assert!(synthesize_named(&mesh(), "telemetry", &NoLookup).is_ok());
}

#[test]
fn config_error_yields_no_descriptors() {
    let mut spec = mesh();
    spec.proxy.image = None;
    assert_eq!(synthesize(&spec, ComponentRole::Policy, &NoLookup), Err(Error::missing("spec.proxy.image")));
    assert!(synthesize_all(&spec, &NoLookup).is_err());
}

#[test]
fn synthesize_all_covers_every_role() {
    let all = synthesize_all(&mesh(), &NoLookup).unwrap();
    let roles: Vec<_> = all.iter().map(|(r, _)| *r).collect();
    assert_eq!(roles, ComponentRole::ALL);
}

#[test]
fn sds_toggle_only_adds_its_own_fragments() {
    let mut spec = mesh();
    let off = synthesize(&spec, ComponentRole::Policy, &NoLookup).unwrap();
    spec.sds.enabled = Some(true);
    let on = synthesize(&spec, ComponentRole::Policy, &NoLookup).unwrap();

    let pod = |d: &[Descriptor]| deployment_of(d).spec.as_ref().and_then(|s| s.template.spec.clone()).unwrap();
    let (pod_off, pod_on) = (pod(&off), pod(&on));

    let vols = |p: &k8s_openapi::api::core::v1::PodSpec| -> Vec<String> {
        p.volumes.as_ref().unwrap().iter().map(|v| v.name.clone()).collect()
    };
    let mut added = vols(&pod_on);
    added.retain(|n| !vols(&pod_off).contains(n));
    assert_eq!(added, ["sds-uds-path", "istio-token"]);

    // mixer container untouched, proxy gains exactly the two mounts and SDS env
    assert_eq!(pod_off.containers[0], pod_on.containers[0]);
    let mounts = |p: &k8s_openapi::api::core::v1::PodSpec| p.containers[1].volume_mounts.as_ref().unwrap().len();
    assert_eq!(mounts(&pod_on), mounts(&pod_off) + 2);

    // other descriptors unaffected
    assert_eq!(off[..3], on[..3]);
    assert_eq!(off[4], on[4]);
}

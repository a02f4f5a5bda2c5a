//! Pod volumes and the per-container mounts that reference them.

use k8s_openapi::api::core::v1::{
    EmptyDirVolumeSource, HostPathVolumeSource, ProjectedVolumeSource, SecretVolumeSource,
    ServiceAccountTokenProjection, Volume, VolumeMount, VolumeProjection,
};
use meshgen_core::{naming, ComponentRole};
use meshgen_resolve::{ConfigStore, ResolvedConfig};

pub const CERTS_VOLUME: &str = "istio-certs";
pub const UDS_VOLUME: &str = "uds-socket";
pub const SDS_VOLUME: &str = "sds-uds-path";
pub const TOKEN_VOLUME: &str = "istio-token";

pub const CERTS_PATH: &str = "/etc/certs";
pub const UDS_PATH: &str = "/sock";
pub const SDS_PATH: &str = "/var/run/sds";
pub const TOKEN_PATH: &str = "/var/run/secrets/tokens";

pub const TOKEN_EXPIRATION_SECONDS: i64 = 43200;
/// 0644
pub const DEFAULT_MODE: i32 = 420;

fn optional_secret(volume: String, secret: String) -> Volume {
    Volume {
        name: volume,
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret),
            optional: Some(true),
            default_mode: Some(DEFAULT_MODE),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn mount(name: &str, path: &str, read_only: bool) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        read_only: read_only.then_some(true),
        ..Default::default()
    }
}

pub fn volumes(role: ComponentRole, cfg: &ResolvedConfig) -> Vec<Volume> {
    let adapter = naming::adapter_secret_name(role);
    let mut volumes = vec![
        optional_secret(CERTS_VOLUME.to_string(), naming::cert_secret_name()),
        Volume {
            name: UDS_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        },
        optional_secret(adapter.clone(), adapter),
    ];

    if let Some(sds) = &cfg.sds {
        volumes.push(Volume {
            name: SDS_VOLUME.to_string(),
            host_path: Some(HostPathVolumeSource { path: SDS_PATH.to_string(), ..Default::default() }),
            ..Default::default()
        });
        volumes.push(Volume {
            name: TOKEN_VOLUME.to_string(),
            projected: Some(ProjectedVolumeSource {
                sources: Some(vec![VolumeProjection {
                    service_account_token: Some(ServiceAccountTokenProjection {
                        path: TOKEN_VOLUME.to_string(),
                        expiration_seconds: Some(TOKEN_EXPIRATION_SECONDS),
                        audience: Some(sds.token_audience.clone()),
                    }),
                    ..Default::default()
                }]),
                default_mode: Some(DEFAULT_MODE),
            }),
            ..Default::default()
        });
    }

    volumes
}

/// Mounts of the mixer container. Certificates are only needed to talk MCP.
pub fn mixer_volume_mounts(role: ComponentRole, cfg: &ResolvedConfig) -> Vec<VolumeMount> {
    let mut mounts = vec![
        mount(UDS_VOLUME, UDS_PATH, false),
        mount(
            &naming::adapter_secret_name(role),
            &format!("/var/run/secrets/istio.io/{}/adapter", role.as_str()),
            true,
        ),
    ];
    if cfg.config_store != ConfigStore::Native {
        mounts.push(mount(CERTS_VOLUME, CERTS_PATH, true));
    }
    mounts
}

pub fn proxy_volume_mounts(cfg: &ResolvedConfig) -> Vec<VolumeMount> {
    let mut mounts = vec![mount(CERTS_VOLUME, CERTS_PATH, true), mount(UDS_VOLUME, UDS_PATH, false)];
    if cfg.sds.is_some() {
        mounts.push(mount(SDS_VOLUME, SDS_PATH, true));
        mounts.push(mount(TOKEN_VOLUME, TOKEN_PATH, false));
    }
    mounts
}

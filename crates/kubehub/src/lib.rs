//! meshgen kubehub: reads live autoscaler state so synthesis can honour the
//! replica count an HPA has settled on.
//!
//! Synthesis is synchronous and must not do I/O, so lookups are prefetched here
//! into a `StaticLookup` before the engine runs.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use futures::future::join_all;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::{api::Api, Client};
use meshgen_core::{naming, ComponentRole};
use meshgen_resolve::StaticLookup;
use metrics::counter;
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client for the current kube context, created on first use.
pub async fn get_kube_client() -> Result<Client> {
    if let Some(c) = CLIENT.get() {
        return Ok(c.clone());
    }
    let client = Client::try_default().await.context("creating kube client from current context")?;
    Ok(CLIENT.get_or_init(|| client).clone())
}

/// Replica count the autoscaler currently maintains, if it reports one.
pub fn observed_replicas(hpa: &HorizontalPodAutoscaler) -> Option<i32> {
    hpa.status.as_ref().and_then(|s| s.current_replicas)
}

/// Collect observed HPA sizes into a lookup. Missing HPAs simply leave no
/// entry; read failures are logged and treated the same way.
pub fn lookup_from<'a, I>(namespace: &str, observed: I) -> StaticLookup
where
    I: IntoIterator<Item = (String, Option<&'a HorizontalPodAutoscaler>)>,
{
    let mut lookup = StaticLookup::new();
    for (name, hpa) in observed {
        match hpa.and_then(observed_replicas) {
            Some(n) => lookup.insert(name, namespace, n),
            None => debug!(autoscaler = %name, namespace, "no observed replicas"),
        }
    }
    lookup
}

/// Fetch the autoscaler of every role in `roles` from `namespace`.
pub async fn prefetch_replicas(client: Client, namespace: &str, roles: &[ComponentRole]) -> StaticLookup {
    let api: Api<HorizontalPodAutoscaler> = Api::namespaced(client, namespace);
    let names: Vec<String> = roles.iter().map(|r| naming::autoscaler_name(*r)).collect();
    let fetched = join_all(names.iter().map(|n| api.get_opt(n))).await;

    let mut hpas = Vec::with_capacity(names.len());
    for (name, res) in names.into_iter().zip(fetched) {
        match res {
            Ok(hpa) => hpas.push((name, hpa)),
            Err(e) => {
                counter!("hpa_lookup_err", 1u64);
                warn!(autoscaler = %name, namespace, error = %e, "reading autoscaler failed; using static replica count");
                hpas.push((name, None));
            }
        }
    }
    let lookup = lookup_from(namespace, hpas.iter().map(|(n, h)| (n.clone(), h.as_ref())));
    info!(namespace, found = lookup.len(), requested = roles.len(), "prefetched autoscaler replicas");
    lookup
}

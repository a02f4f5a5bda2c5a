//! Ordered merge rules for env vars, labels and resource requirements.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Appends `additional` to `base`. An entry whose name already exists replaces
/// that entry in place, so the first occurrence keeps its position.
pub fn merge_env_vars(base: &[EnvVar], additional: &[EnvVar]) -> Vec<EnvVar> {
    let mut out: Vec<EnvVar> = Vec::with_capacity(base.len() + additional.len());
    for env in base.iter().chain(additional.iter()) {
        match out.iter_mut().find(|e| e.name == env.name) {
            Some(existing) => *existing = env.clone(),
            None => out.push(env.clone()),
        }
    }
    out
}

/// Later maps win key-by-key.
pub fn merge_label_maps<'a, I>(maps: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    let mut out = BTreeMap::new();
    for m in maps {
        for (k, v) in m {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Field-level resource defaulting: for requests and limits independently,
/// each resource key takes the specific value when present, else the default.
pub fn resolve_resources(
    specific: Option<&ResourceRequirements>,
    defaults: Option<&ResourceRequirements>,
) -> Option<ResourceRequirements> {
    let requests = overlay(
        defaults.and_then(|d| d.requests.as_ref()),
        specific.and_then(|s| s.requests.as_ref()),
    );
    let limits = overlay(
        defaults.and_then(|d| d.limits.as_ref()),
        specific.and_then(|s| s.limits.as_ref()),
    );
    let claims = specific
        .and_then(|s| s.claims.clone())
        .or_else(|| defaults.and_then(|d| d.claims.clone()));
    if requests.is_none() && limits.is_none() && claims.is_none() {
        return None;
    }
    Some(ResourceRequirements { requests, limits, claims })
}

fn overlay(
    base: Option<&BTreeMap<String, Quantity>>,
    top: Option<&BTreeMap<String, Quantity>>,
) -> Option<BTreeMap<String, Quantity>> {
    let mut out = BTreeMap::new();
    for m in [base, top].into_iter().flatten() {
        for (k, v) in m {
            out.insert(k.clone(), v.clone());
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

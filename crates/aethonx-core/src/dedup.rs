// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-key deduplication and the handful of pure filters built on top of it.

use crate::artifact::{derive_id, Artifact};
use crate::artifact_type::ArtifactType;
use crate::normalize::normalize;

/// Discard nil/invalid entries, normalize, merge by `(type, value)` key, and
/// return a stable `(type asc, value asc)` ordering.
///
/// Idempotent: `deduplicate(deduplicate(xs)) == deduplicate(xs)` both as a
/// multiset and as an ordered sequence.
#[must_use]
pub fn deduplicate(artifacts: Vec<Artifact>) -> Vec<Artifact> {
    let mut kept: Vec<Artifact> = Vec::with_capacity(artifacts.len());

    for mut artifact in artifacts {
        if !artifact.is_valid() {
            continue;
        }
        // `Artifact::new` normalizes at construction, but an artifact
        // reaching here via `Deserialize` (e.g. reloaded from a spill file)
        // bypasses that path, so normalize and re-derive its id here too.
        artifact.value = normalize(artifact.ty, &artifact.value);
        artifact.id = derive_id(artifact.ty, &artifact.value);

        let (ty, value) = (artifact.ty, artifact.value.clone());
        if let Some(existing) = kept.iter_mut().find(|a| a.ty == ty && a.value == value) {
            // `merge` only fails on key mismatch, which cannot happen here.
            let _ = existing.merge(artifact);
        } else {
            kept.push(artifact);
        }
    }

    kept.sort_by(|a, b| a.ty.as_str().cmp(b.ty.as_str()).then_with(|| a.value.cmp(&b.value)));
    kept
}

/// Artifacts whose type is `ty`.
#[must_use]
pub fn filter_by_type(artifacts: &[Artifact], ty: ArtifactType) -> Vec<Artifact> {
    artifacts.iter().filter(|a| a.ty == ty).cloned().collect()
}

/// Artifacts with confidence at least `min`.
#[must_use]
pub fn filter_by_confidence(artifacts: &[Artifact], min: f64) -> Vec<Artifact> {
    artifacts.iter().filter(|a| a.confidence >= min).cloned().collect()
}

/// Artifacts whose `sources` include `source`.
#[must_use]
pub fn filter_by_source(artifacts: &[Artifact], source: &str) -> Vec<Artifact> {
    artifacts
        .iter()
        .filter(|a| a.sources.iter().any(|s| s == source))
        .cloned()
        .collect()
}

/// Group artifacts by type, preserving each group's relative order.
#[must_use]
pub fn group_by_type(artifacts: &[Artifact]) -> std::collections::BTreeMap<ArtifactType, Vec<Artifact>> {
    let mut groups: std::collections::BTreeMap<ArtifactType, Vec<Artifact>> = Default::default();
    for artifact in artifacts {
        groups.entry(artifact.ty).or_default().push(artifact.clone());
    }
    groups
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Directed, typed edges between artifacts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed vocabulary of relation types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    ResolvesTo,
    ReverseResolves,
    OwnedBy,
    HostedOn,
    SubdomainOf,
    UsesCert,
    ProtectedBy,
    HasVuln,
    RunsOn,
    ListensOn,
    Serves,
    HasNameserver,
    HasMx,
    HasCname,
    HasContact,
    ManagedBy,
    UsesTech,
}

impl RelationType {
    /// The wire tag for this variant, identical to its serde rendering.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolvesTo => "resolves_to",
            Self::ReverseResolves => "reverse_resolves",
            Self::OwnedBy => "owned_by",
            Self::HostedOn => "hosted_on",
            Self::SubdomainOf => "subdomain_of",
            Self::UsesCert => "uses_cert",
            Self::ProtectedBy => "protected_by",
            Self::HasVuln => "has_vuln",
            Self::RunsOn => "runs_on",
            Self::ListensOn => "listens_on",
            Self::Serves => "serves",
            Self::HasNameserver => "has_nameserver",
            Self::HasMx => "has_mx",
            Self::HasCname => "has_cname",
            Self::HasContact => "has_contact",
            Self::ManagedBy => "managed_by",
            Self::UsesTech => "uses_tech",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge from the owning artifact to `target_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Relation {
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub target_id: String,
    pub confidence: f64,
    pub discovered_at: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Relation {
    /// Construct a relation with no metadata.
    #[must_use]
    pub fn new(
        kind: RelationType,
        target_id: impl Into<String>,
        confidence: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target_id: target_id.into(),
            confidence,
            discovered_at: Utc::now(),
            source: source.into(),
            metadata: None,
        }
    }

    /// The `(target_id, type)` identity used for deduplication per `spec.md` §3.
    #[must_use]
    pub fn identity(&self) -> (&str, RelationType) {
        (self.target_id.as_str(), self.kind)
    }
}

/// Insert `relation` into `relations` unless one with the same
/// `(target_id, type)` identity already exists. Returns `true` if inserted.
pub fn add_relation_idempotent(relations: &mut Vec<Relation>, relation: Relation) -> bool {
    let exists = relations
        .iter()
        .any(|r| r.identity() == relation.identity());
    if exists {
        return false;
    }
    relations.push(relation);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(target: &str, kind: RelationType) -> Relation {
        Relation::new(kind, target, 0.8, "crtsh")
    }

    #[test]
    fn duplicate_target_and_type_is_a_no_op() {
        let mut relations = Vec::new();
        assert!(add_relation_idempotent(&mut relations, rel("ip-1", RelationType::ResolvesTo)));
        assert!(!add_relation_idempotent(&mut relations, rel("ip-1", RelationType::ResolvesTo)));
        assert_eq!(relations.len(), 1);
    }

    #[test]
    fn same_target_different_type_is_inserted() {
        let mut relations = Vec::new();
        add_relation_idempotent(&mut relations, rel("ip-1", RelationType::ResolvesTo));
        add_relation_idempotent(&mut relations, rel("ip-1", RelationType::HostedOn));
        assert_eq!(relations.len(), 2);
    }

    #[test]
    fn add_relation_is_idempotent_under_repetition() {
        let mut relations = Vec::new();
        for _ in 0..5 {
            add_relation_idempotent(&mut relations, rel("ip-1", RelationType::ResolvesTo));
        }
        assert_eq!(relations.len(), 1);
    }
}

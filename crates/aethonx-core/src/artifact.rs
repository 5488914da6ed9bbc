// SPDX-License-Identifier: MIT OR Apache-2.0
//! The discovered-fact type and its invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use aethonx_error::{AethonError, ErrorCode};

use crate::artifact_type::ArtifactType;
use crate::metadata::TypedMetadata;
use crate::normalize::normalize;
use crate::relation::{add_relation_idempotent, Relation, RelationType};

/// A single typed fact discovered during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: ArtifactType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(rename = "metadata", default, skip_serializing_if = "Option::is_none")]
    pub typed_metadata: Option<TypedMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
    pub confidence: f64,
    pub discovered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Derive the stable 16-hex-char identifier for `(type, normalized_value)`.
///
/// `id` is a pure function of its inputs: two artifacts with the same type
/// and normalized value always share an id, by construction.
#[must_use]
pub fn derive_id(ty: ArtifactType, normalized_value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ty.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(normalized_value.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

impl Artifact {
    /// Create a new artifact, normalizing `value` and deriving its id.
    ///
    /// `confidence` starts at `1.0` and `discovered_at` is `now`; callers
    /// that need a historical confidence band should adjust afterwards.
    #[must_use]
    pub fn new(ty: ArtifactType, value: &str, source: impl Into<String>) -> Self {
        let normalized = normalize(ty, value);
        let id = derive_id(ty, &normalized);
        let source = source.into();
        let sources = if source.is_empty() { Vec::new() } else { vec![source] };
        Self {
            id,
            ty,
            value: normalized,
            sources,
            typed_metadata: None,
            relations: Vec::new(),
            confidence: 1.0,
            discovered_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// The `(type, value)` key two artifacts must share to be merge targets.
    #[must_use]
    pub fn key(&self) -> (ArtifactType, &str) {
        (self.ty, self.value.as_str())
    }

    /// Append `source` to the ordered, deduplicated source list.
    ///
    /// An empty source is a no-op, and re-adding an existing source is a
    /// no-op (insertion order of the first occurrence is preserved).
    pub fn add_source(&mut self, source: &str) {
        if source.is_empty() || self.sources.iter().any(|s| s == source) {
            return;
        }
        self.sources.push(source.to_string());
    }

    /// Append `tag` to the ordered, deduplicated tag list.
    pub fn add_tag(&mut self, tag: &str) {
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return;
        }
        self.tags.push(tag.to_string());
    }

    /// Add a relation with no metadata. Idempotent on `(target_id, type)`.
    pub fn add_relation(
        &mut self,
        target_id: impl Into<String>,
        kind: RelationType,
        confidence: f64,
        source: impl Into<String>,
    ) {
        let relation = Relation::new(kind, target_id, confidence, source);
        add_relation_idempotent(&mut self.relations, relation);
    }

    /// Add a relation carrying string metadata. Idempotent on `(target_id, type)`.
    pub fn add_relation_with_metadata(
        &mut self,
        target_id: impl Into<String>,
        kind: RelationType,
        confidence: f64,
        source: impl Into<String>,
        metadata: std::collections::BTreeMap<String, String>,
    ) {
        let mut relation = Relation::new(kind, target_id, confidence, source);
        relation.metadata = Some(metadata);
        add_relation_idempotent(&mut self.relations, relation);
    }

    /// Merge `other` into `self` per `spec.md` §3.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::Internal`] if `other` has a different
    /// `(type, value)` key — merging is only defined for artifacts the dedup
    /// service has already identified as the same entity.
    pub fn merge(&mut self, other: Artifact) -> Result<(), AethonError> {
        if self.key() != other.key() {
            return Err(AethonError::non_fatal(
                ErrorCode::Internal,
                format!(
                    "cannot merge artifact with key {:?} into {:?}",
                    other.key(),
                    self.key()
                ),
            ));
        }

        for source in &other.sources {
            self.add_source(source);
        }
        for tag in &other.tags {
            self.add_tag(tag);
        }
        for relation in other.relations {
            add_relation_idempotent(&mut self.relations, relation);
        }
        if self.typed_metadata.is_none() {
            self.typed_metadata = other.typed_metadata;
        }
        self.confidence = self.confidence.max(other.confidence);
        self.discovered_at = self.discovered_at.min(other.discovered_at);
        Ok(())
    }

    /// Accumulate every validation problem with this artifact.
    ///
    /// Mirrors the accumulate-don't-short-circuit validation style used
    /// throughout this codebase: callers that only need a boolean should use
    /// [`Artifact::is_valid`].
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.value.is_empty() {
            errors.push("value must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            errors.push(format!("confidence {} out of range [0.0, 1.0]", self.confidence));
        }

        match self.ty {
            ArtifactType::Ip => {
                if self.value.parse::<std::net::Ipv4Addr>().is_err() {
                    errors.push("value is not a valid IPv4 address".to_string());
                }
            }
            ArtifactType::Ipv6 => {
                if self.value.parse::<std::net::Ipv6Addr>().is_err() {
                    errors.push("value is not a valid IPv6 address".to_string());
                }
            }
            ArtifactType::Email => {
                if !is_valid_email(&self.value) {
                    errors.push("value is not a valid email address".to_string());
                }
            }
            ArtifactType::Url => {
                if !self.value.contains("://") {
                    errors.push("value is not an absolute URL".to_string());
                }
            }
            ArtifactType::Domain | ArtifactType::Subdomain => {
                if !is_valid_domain(&self.value) {
                    errors.push("value is not a valid domain".to_string());
                }
            }
            ArtifactType::Port => {
                if self
                    .value
                    .parse::<u32>()
                    .map(|p| p == 0 || p > 65535)
                    .unwrap_or(true)
                {
                    errors.push("value is not a valid port in 1..65535".to_string());
                }
            }
            ArtifactType::Certificate => {
                if !is_hex_serial(&self.value) {
                    errors.push("value is not a hex certificate serial".to_string());
                }
            }
            _ => {}
        }

        errors
    }

    /// Whether this artifact passes every invariant check for its type.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

fn is_valid_email(value: &str) -> bool {
    if !(3..254).contains(&value.len()) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = domain
        .rsplit('.')
        .next()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);
    local_ok && domain_ok && tld_ok
}

fn is_valid_domain(value: &str) -> bool {
    if !value.contains('.') {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_hex_serial(value: &str) -> bool {
    let cleaned: String = value.chars().filter(|c| !matches!(c, ':' | ' ')).collect();
    !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_hexdigit())
}

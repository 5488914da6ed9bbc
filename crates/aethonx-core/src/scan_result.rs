// SPDX-License-Identifier: MIT OR Apache-2.0
//! The document a scan produces: artifacts plus provenance ledgers.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::target::Target;

/// Generate a scan identifier of the form `scan-<nanoseconds-since-epoch>`.
#[must_use]
pub fn new_scan_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("scan-{nanos}")
}

/// A single append-only warning entry.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Warning {
    pub source: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A single append-only error entry.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ErrorEntry {
    pub source: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub fatal: bool,
}

/// Aggregate statistics and provenance attached to a finished scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_invoked: Vec<String>,
    #[serde(default)]
    pub total_sources: usize,
    #[serde(default)]
    pub total_relations: usize,
    /// Keyed by the relation type's wire tag (e.g. `"resolves_to"`).
    #[serde(default)]
    pub relations_by_type: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// The emitted document for one scan.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScanResult {
    pub id: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub metadata: ScanMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

impl ScanResult {
    /// Start a new, empty scan result for `target`.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            id: new_scan_id(),
            target,
            artifacts: Vec::new(),
            metadata: ScanMetadata {
                started_at: Some(Utc::now()),
                ..ScanMetadata::default()
            },
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Append a non-fatal warning.
    pub fn add_warning(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Warning {
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
            context: None,
        });
    }

    /// Append an error entry.
    pub fn add_error(&mut self, source: impl Into<String>, message: impl Into<String>, fatal: bool) {
        self.errors.push(ErrorEntry {
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
            context: None,
            fatal,
        });
    }

    /// Whether any recorded error is fatal.
    #[must_use]
    pub fn has_fatal_errors(&self) -> bool {
        self.errors.iter().any(|e| e.fatal)
    }

    /// Recompute `total_relations` and `relations_by_type` from `artifacts`.
    pub fn recompute_relation_stats(&mut self) {
        let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;
        for artifact in &self.artifacts {
            for relation in &artifact.relations {
                *histogram.entry(relation.kind.as_str().to_string()).or_insert(0) += 1;
                total += 1;
            }
        }
        self.metadata.total_relations = total;
        self.metadata.relations_by_type = histogram;
    }

    /// Set `finished_at` and `duration_ms` from `started_at`.
    pub fn finalize(&mut self) {
        let finished_at = Utc::now();
        self.metadata.finished_at = Some(finished_at);
        if let Some(started_at) = self.metadata.started_at {
            self.metadata.duration_ms =
                Some((finished_at - started_at).num_milliseconds().max(0) as u64);
        }
    }
}

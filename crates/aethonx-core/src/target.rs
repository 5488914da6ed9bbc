// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scan targets and their in-scope policy.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use aethonx_error::{AethonError, ErrorCode};

/// How aggressively a scan is permitted to probe the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Passive,
    Active,
    Hybrid,
}

impl ScanMode {
    /// Whether a source declaring `self` as its supported mode may run under
    /// `scan_mode`, per `spec.md` §3.
    #[must_use]
    pub fn compatible_with(self, scan_mode: ScanMode) -> bool {
        match self {
            ScanMode::Passive => matches!(scan_mode, ScanMode::Passive | ScanMode::Hybrid),
            ScanMode::Active => matches!(scan_mode, ScanMode::Active | ScanMode::Hybrid),
            ScanMode::Hybrid => true,
        }
    }
}

/// Scope policy controlling which discovered domains are in-bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Scope {
    #[serde(default)]
    pub include_subdomains: bool,
    #[serde(default)]
    pub exclude_domains: BTreeSet<String>,
    /// `0` means unlimited subdomain label depth.
    #[serde(default)]
    pub max_depth: u32,
    #[serde(default)]
    pub only_in_scope: bool,
}

/// The domain a scan investigates, plus the policy governing its scope.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Target {
    pub root: String,
    pub mode: ScanMode,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Target {
    /// Construct a target with default scope, tags, and metadata.
    #[must_use]
    pub fn new(root: impl Into<String>, mode: ScanMode) -> Self {
        Self {
            root: root.into(),
            mode,
            scope: Scope::default(),
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Validate this target, accumulating every problem found.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`AethonError`] naming the first category of problem
    /// found (empty root takes precedence over a malformed root, which takes
    /// precedence over scope issues) — the scan aborts on any validation
    /// failure, so a single representative error suffices.
    pub fn validate(&self) -> Result<(), AethonError> {
        if self.root.trim().is_empty() {
            return Err(AethonError::fatal(ErrorCode::EmptyTarget, "target root must not be empty"));
        }
        if !self.root.contains('.') {
            return Err(AethonError::fatal(
                ErrorCode::InvalidDomain,
                format!("target root '{}' is not a valid domain", self.root),
            ));
        }
        if self.scope.only_in_scope && !self.scope.include_subdomains && self.scope.max_depth > 0 {
            return Err(AethonError::fatal(
                ErrorCode::InvalidScope,
                "max_depth is meaningless without include_subdomains",
            ));
        }
        Ok(())
    }

    /// Whether `domain` falls within this target's scope.
    ///
    /// Exclusion wins first; `only_in_scope` then gates everything else.
    /// Idempotent under normalization: `is_in_scope(normalize(d)) ==
    /// is_in_scope(d)` for any casing/trailing-dot variation of `d`.
    #[must_use]
    pub fn is_in_scope(&self, domain: &str) -> bool {
        let d = normalize_for_scope(domain);
        let root = normalize_for_scope(&self.root);

        for excluded in &self.scope.exclude_domains {
            let excluded = normalize_for_scope(excluded);
            if d == excluded || d.ends_with(&format!(".{excluded}")) {
                return false;
            }
        }

        if !self.scope.only_in_scope {
            return true;
        }

        if d == root {
            return true;
        }

        if self.scope.include_subdomains && d.ends_with(&format!(".{root}")) {
            if self.scope.max_depth == 0 {
                return true;
            }
            let prefix = d.trim_end_matches(&format!(".{root}"));
            let depth = prefix.split('.').count() as u32;
            return depth <= self.scope.max_depth;
        }

        false
    }
}

fn normalize_for_scope(d: &str) -> String {
    d.trim().trim_end_matches('.').to_lowercase()
}

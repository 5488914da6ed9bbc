// SPDX-License-Identifier: MIT OR Apache-2.0
//! Static metadata a source advertises to the registry.

use aethonx_core::{ArtifactType, ScanMode};
use serde::{Deserialize, Serialize};

/// How a source is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Api,
    Cli,
    Builtin,
    File,
    Database,
}

/// Which scan modes a source is willing to run under. Distinct from
/// [`ScanMode`] (a target's requested aggressiveness): a descriptor's mode
/// is a three-value vocabulary of its own, with `both` as the wire tag for
/// a source willing to run in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Passive,
    Active,
    #[serde(rename = "both")]
    Both,
}

impl SourceMode {
    /// Whether a source declaring `self` may run under a target requesting
    /// `scan_mode`.
    #[must_use]
    pub fn compatible_with(self, scan_mode: ScanMode) -> bool {
        match self {
            SourceMode::Passive => matches!(scan_mode, ScanMode::Passive | ScanMode::Hybrid),
            SourceMode::Active => matches!(scan_mode, ScanMode::Active | ScanMode::Hybrid),
            SourceMode::Both => true,
        }
    }
}

/// Static metadata describing a source, independent of any running instance.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SourceDescriptor {
    pub name: String,
    pub description: String,
    pub version: String,
    pub mode: SourceMode,
    #[serde(rename = "type")]
    pub ty: SourceType,
    pub requires_auth: bool,
    pub rate_limit_hint: Option<u32>,
    pub input_artifact_types: Vec<ArtifactType>,
    pub output_artifact_types: Vec<ArtifactType>,
    pub priority: i32,
    pub stage_hint: i32,
}

impl SourceDescriptor {
    /// A descriptor with no input types is a Stage-0 producer: it needs no
    /// upstream artifacts to run.
    #[must_use]
    pub fn is_stage_zero(&self) -> bool {
        self.input_artifact_types.is_empty()
    }
}

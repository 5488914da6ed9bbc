// SPDX-License-Identifier: MIT OR Apache-2.0
//! AethonX: a staged reconnaissance pipeline and artifact graph.
//!
//! This crate is a thin facade over the workspace's members — the domain
//! model ([`aethonx_core`]), the indexed graph ([`aethonx_graph`]), the
//! collector contract ([`aethonx_source`]), and the orchestrator
//! ([`aethonx_runtime`]) — re-exported here for callers that want a single
//! dependency.

pub use aethonx_core as core;
pub use aethonx_error as error;
pub use aethonx_graph as graph;
pub use aethonx_runtime as runtime;
pub use aethonx_source as source;

pub use aethonx_core::{Artifact, ArtifactCategory, ArtifactType, Relation, RelationType, ScanMode, ScanResult, Scope, Target};
pub use aethonx_error::{AethonError, ErrorCategory, ErrorCode};
pub use aethonx_graph::{Graph, GraphStats};
pub use aethonx_runtime::{Pipeline, PipelineConfig, RegisteredSource};
pub use aethonx_source::{
    CancellationReason, CancellationToken, ScanContext, Source, SourceConfig, SourceDescriptor, SourceMode,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_reexports_resolve_to_the_same_types_as_the_member_crates() {
        let target = Target::new("example.com", ScanMode::Passive);
        assert!(target.validate().is_ok());
        let artifact = Artifact::new(ArtifactType::Domain, "example.com", "crtsh");
        assert_eq!(artifact.ty.category(), ArtifactCategory::Infrastructure);
    }
}

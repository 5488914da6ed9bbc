// SPDX-License-Identifier: MIT OR Apache-2.0
//! The artifact/relation domain model: normalization, validation, merge
//! semantics, and per-key deduplication.
//!
//! This crate has no knowledge of sources, stages, or orchestration — see
//! `aethonx-source` and `aethonx-runtime` for those.

pub mod artifact;
pub mod artifact_type;
pub mod dedup;
pub mod metadata;
pub mod normalize;
pub mod relation;
pub mod scan_result;
pub mod target;

pub use artifact::Artifact;
pub use artifact_type::{ArtifactCategory, ArtifactType};
pub use metadata::TypedMetadata;
pub use relation::{Relation, RelationType};
pub use scan_result::{ErrorEntry, ScanMetadata, ScanResult, Warning};
pub use target::{ScanMode, Scope, Target};

// SPDX-License-Identifier: MIT OR Apache-2.0
//! The mandatory `Source` contract and its optional capabilities.
//!
//! Sources opt into extended behavior (input consumption, streaming, health
//! checks, rate limiting) without a wide mandatory interface: each capability
//! is a separate trait, and the orchestrator probes for it at runtime via the
//! default methods below rather than requiring every source to implement a
//! monolithic interface.

use async_trait::async_trait;
use tokio::sync::mpsc;

use aethonx_core::{Artifact, ScanResult, Target};
use aethonx_error::AethonError;

use crate::context::ScanContext;
use crate::descriptor::{SourceMode, SourceType};

/// The contract every collector must implement.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier, used as the `sources` entry on artifacts it yields.
    fn name(&self) -> &str;

    /// Which scan modes this source is compatible with.
    fn mode(&self) -> SourceMode;

    /// How this source is invoked.
    fn source_type(&self) -> SourceType;

    /// Run against `target`, producing a complete [`ScanResult`].
    async fn run(&self, ctx: &ScanContext, target: &Target) -> Result<ScanResult, AethonError>;

    /// Release any held resources. A source already closed is not an error.
    async fn close(&self) -> Result<(), AethonError> {
        Ok(())
    }

    /// Probe for the [`InputConsumer`] capability.
    fn as_input_consumer(&self) -> Option<&dyn InputConsumer> {
        None
    }

    /// Probe for the [`AdvancedSource`] capability.
    fn as_advanced(&self) -> Option<&dyn AdvancedSource> {
        None
    }

    /// Probe for the [`StreamingSource`] capability.
    fn as_streaming(&self) -> Option<&dyn StreamingSource> {
        None
    }

    /// Probe for the [`RateLimitedSource`] capability.
    fn as_rate_limited(&self) -> Option<&dyn RateLimitedSource> {
        None
    }
}

/// Sources that declare non-empty `input_artifact_types` implement this and
/// are invoked via [`InputConsumer::run_with_input`] in preference to
/// [`Source::run`].
#[async_trait]
pub trait InputConsumer: Send + Sync {
    async fn run_with_input(
        &self,
        ctx: &ScanContext,
        target: &Target,
        filtered_input: &[Artifact],
    ) -> Result<ScanResult, AethonError>;
}

/// Lifecycle hooks for sources with out-of-process setup or health state.
#[async_trait]
pub trait AdvancedSource: Send + Sync {
    async fn initialize(&self, ctx: &ScanContext) -> Result<(), AethonError>;
    fn validate(&self) -> Result<(), AethonError>;
    async fn health_check(&self, ctx: &ScanContext) -> Result<(), AethonError>;
}

/// A streaming variant of `run`: artifacts arrive incrementally and progress
/// updates are delivered on a side channel. Progress updates are dropped, not
/// blocked on, when the channel is full.
#[async_trait]
pub trait StreamingSource: Send + Sync {
    async fn stream(
        &self,
        ctx: &ScanContext,
        target: &Target,
    ) -> Result<(mpsc::Receiver<Artifact>, mpsc::Receiver<AethonError>), AethonError>;

    fn progress_channel(&self) -> mpsc::Receiver<String>;
}

/// Runtime-adjustable request rate.
pub trait RateLimitedSource: Send + Sync {
    fn set_rate_limit(&self, requests_per_second: f64);
    fn rate_limit(&self) -> f64;
}

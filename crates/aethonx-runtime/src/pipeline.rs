// SPDX-License-Identifier: MIT OR Apache-2.0
//! The control plane: `Pipeline::run` ties the resolver, executor, spill
//! service, graph, and notifiers into the scan's main loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use aethonx_core::dedup::deduplicate;
use aethonx_core::{ArtifactType, ScanResult, Target};
use aethonx_error::{AethonError, ErrorCode};
use aethonx_graph::Graph;
use aethonx_source::{ScanContext, Source};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::executor::{execute_stage, fold_stage_results};
use crate::notify::{Event, NotifierHub, Severity};
use crate::resolver::resolve_stages;
use crate::spill::{clear_partial_files, consolidate_into_result, load_partial_results};
use crate::writer::StreamingWriter;

/// A source paired with the static metadata the resolver and filter need.
pub struct RegisteredSource {
    pub descriptor: aethonx_source::SourceDescriptor,
    pub source: Arc<dyn Source>,
}

/// Tunables for a [`Pipeline`] run, independent of any single target.
pub struct PipelineConfig {
    pub max_workers: usize,
    /// Spill the accumulator once its artifact count reaches this threshold.
    /// `None` disables spilling.
    pub spill_threshold: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_workers: 4, spill_threshold: None }
    }
}

/// Orchestrates a full scan: resolves stages, fans sources out within each,
/// folds and dedups incrementally, and finalizes the artifact graph.
pub struct Pipeline {
    sources: Vec<RegisteredSource>,
    notifiers: Arc<NotifierHub>,
    writer: Option<StreamingWriter>,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        sources: Vec<RegisteredSource>,
        notifiers: NotifierHub,
        writer: Option<StreamingWriter>,
        config: PipelineConfig,
    ) -> Self {
        Self { sources, notifiers: Arc::new(notifiers), writer, config }
    }

    /// Run a full scan against `target`.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`AethonError`] if `target` fails validation or no
    /// registered source is compatible with its scan mode.
    #[instrument(skip(self, ctx), fields(target = %target.root))]
    pub async fn run(&self, ctx: &ScanContext, target: &Target) -> Result<ScanResult, AethonError> {
        target.validate()?;

        let compatible: Vec<&RegisteredSource> =
            self.sources.iter().filter(|s| s.descriptor.mode.compatible_with(target.mode)).collect();
        if compatible.is_empty() {
            return Err(AethonError::fatal(
                ErrorCode::NoSourcesAvailable,
                format!("no registered source is compatible with mode {:?}", target.mode),
            ));
        }

        info!(target = %target.root, sources = compatible.len(), "scan started");
        self.notifiers.dispatch(&Event::new("scan.started", "pipeline", Severity::Info)).await;

        let descriptors: Vec<_> = compatible.iter().map(|s| s.descriptor.clone()).collect();
        let stages = resolve_stages(&descriptors)?;

        let by_name: HashMap<String, Arc<dyn Source>> =
            compatible.iter().map(|s| (s.descriptor.name.clone(), Arc::clone(&s.source))).collect();
        let input_types: HashMap<String, Vec<ArtifactType>> =
            descriptors.iter().map(|d| (d.name.clone(), d.input_artifact_types.clone())).collect();

        let mut accumulated = ScanResult::new(target.clone());
        let mut spilled = false;

        for (stage_id, stage) in stages.iter().enumerate() {
            if ctx.is_cancelled() {
                warn!(stage = stage_id, "scan cancelled; not starting remaining stages");
                break;
            }

            info!(stage = stage_id, name = %stage.name, "stage started");
            self.notifiers
                .dispatch(
                    &Event::new("stage.started", "pipeline", Severity::Info)
                        .with_data(json!({ "stage": stage_id, "name": stage.name })),
                )
                .await;
            let stage_start = Instant::now();

            let stage_sources: Vec<Arc<dyn Source>> =
                stage.sources.iter().filter_map(|name| by_name.get(name).cloned()).collect();
            let results = execute_stage(
                ctx,
                target,
                &stage_sources,
                &input_types,
                &accumulated,
                self.config.max_workers,
                &self.notifiers,
            )
            .await;
            let stage_result = fold_stage_results(target, results);

            for artifact in stage_result.artifacts.iter().filter(|a| a.is_valid()) {
                self.notifiers
                    .dispatch(
                        &Event::new("artifact.validated", "pipeline", Severity::Info).with_data(
                            json!({ "type": artifact.ty.as_str(), "value": artifact.value }),
                        ),
                    )
                    .await;
            }

            accumulated.artifacts.extend(stage_result.artifacts);
            accumulated.warnings.extend(stage_result.warnings);
            accumulated.errors.extend(stage_result.errors);
            accumulated.artifacts = deduplicate(std::mem::take(&mut accumulated.artifacts));

            if let (Some(writer), Some(threshold)) = (&self.writer, self.config.spill_threshold) {
                if accumulated.artifacts.len() >= threshold {
                    match writer.write_partial(&format!("stage_{stage_id}"), &target.root, &accumulated)
                    {
                        Ok(_) => {
                            accumulated.artifacts.clear();
                            spilled = true;
                        }
                        Err(e) => warn!(stage = stage_id, error = %e, "failed to spill stage output"),
                    }
                }
            }

            let stage_duration_ms = stage_start.elapsed().as_millis() as u64;
            info!(stage = stage_id, duration_ms = stage_duration_ms, "stage finished");
            self.notifiers
                .dispatch(
                    &Event::new("stage.finished", "pipeline", Severity::Info)
                        .with_data(json!({ "stage": stage_id, "duration_ms": stage_duration_ms })),
                )
                .await;
        }

        if spilled {
            if let Some(writer) = &self.writer {
                let dir = writer.target_dir(&target.root);
                let glob = writer.pattern(&target.root);
                match load_partial_results(&dir, &glob) {
                    Ok(partials) => {
                        consolidate_into_result(&mut accumulated, partials);
                        accumulated.artifacts = deduplicate(std::mem::take(&mut accumulated.artifacts));
                    }
                    Err(e) => warn!(error = %e, "failed to load spill files for final consolidation"),
                }
            }
        }

        let graph = Graph::build(&accumulated.artifacts);
        let stats = graph.stats();
        accumulated.metadata.total_relations = stats.total_relations;
        accumulated.metadata.relations_by_type = stats.relations_by_type;
        accumulated.metadata.total_sources = compatible.len();
        accumulated.metadata.sources_invoked =
            stages.iter().flat_map(|s| s.sources.iter().cloned()).collect();

        accumulated.finalize();

        if let Some(writer) = &self.writer {
            clear_partial_files(&writer.target_dir(&target.root), &writer.pattern(&target.root));
        }

        let completion_event = if ctx.is_cancelled() {
            let reason = ctx.cancellation.reason().map(|r| r.as_str().to_string());
            info!(target = %target.root, reason = ?reason, "scan canceled");
            Event::new("scan.canceled", "pipeline", Severity::Warning)
                .with_data(json!({ "reason": reason }))
        } else if accumulated.has_fatal_errors() {
            info!(target = %target.root, "scan failed");
            Event::new("scan.failed", "pipeline", Severity::Error)
        } else {
            info!(target = %target.root, "scan completed");
            Event::new("scan.completed", "pipeline", Severity::Info)
        };
        self.notifiers.dispatch(&completion_event).await;

        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethonx_core::{ArtifactType, ScanMode};
    use aethonx_error::AethonError;
    use aethonx_source::{CancellationToken, SourceConfig, SourceMode, SourceType};
    use async_trait::async_trait;

    struct StubSource {
        name: String,
        mode: SourceMode,
        produces: ArtifactType,
    }

    #[async_trait]
    impl Source for StubSource {
        fn name(&self) -> &str {
            &self.name
        }
        fn mode(&self) -> SourceMode {
            self.mode
        }
        fn source_type(&self) -> SourceType {
            SourceType::Builtin
        }
        async fn run(&self, _ctx: &ScanContext, target: &Target) -> Result<ScanResult, AethonError> {
            let mut result = ScanResult::new(target.clone());
            result.artifacts.push(aethonx_core::Artifact::new(
                self.produces,
                &format!("{}.{}", self.name, target.root),
                &self.name,
            ));
            Ok(result)
        }
    }

    fn descriptor(
        name: &str,
        mode: SourceMode,
        inputs: Vec<ArtifactType>,
        outputs: Vec<ArtifactType>,
    ) -> aethonx_source::SourceDescriptor {
        aethonx_source::SourceDescriptor {
            name: name.to_string(),
            description: String::new(),
            version: "0.1.0".into(),
            mode,
            ty: SourceType::Builtin,
            requires_auth: false,
            rate_limit_hint: None,
            input_artifact_types: inputs,
            output_artifact_types: outputs,
            priority: 0,
            stage_hint: 0,
        }
    }

    fn registered(
        name: &str,
        mode: SourceMode,
        produces: ArtifactType,
        inputs: Vec<ArtifactType>,
        outputs: Vec<ArtifactType>,
    ) -> RegisteredSource {
        RegisteredSource {
            descriptor: descriptor(name, mode, inputs, outputs),
            source: Arc::new(StubSource { name: name.to_string(), mode, produces }),
        }
    }

    #[tokio::test]
    async fn scenario_b_two_stage_pipeline_runs_in_order() {
        let sources = vec![
            registered("crtsh", SourceMode::Passive, ArtifactType::Subdomain, vec![], vec![ArtifactType::Subdomain]),
            registered(
                "resolver",
                SourceMode::Passive,
                ArtifactType::Ip,
                vec![ArtifactType::Subdomain],
                vec![ArtifactType::Ip],
            ),
        ];
        let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("example.com", ScanMode::Passive);

        let result = pipeline.run(&ctx, &target).await.unwrap();
        assert!(result.artifacts.iter().any(|a| a.ty == ArtifactType::Subdomain));
        assert!(result.artifacts.iter().any(|a| a.ty == ArtifactType::Ip));
        assert_eq!(result.metadata.total_sources, 2);
    }

    #[tokio::test]
    async fn scenario_c_cyclic_dependency_fails_fast() {
        let sources = vec![
            registered("a", SourceMode::Passive, ArtifactType::Domain, vec![ArtifactType::Ip], vec![ArtifactType::Domain]),
            registered("b", SourceMode::Passive, ArtifactType::Ip, vec![ArtifactType::Domain], vec![ArtifactType::Ip]),
        ];
        let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("example.com", ScanMode::Passive);

        let err = pipeline.run(&ctx, &target).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CyclicDependency);
    }

    #[tokio::test]
    async fn invalid_target_fails_before_any_source_runs() {
        let pipeline = Pipeline::new(vec![], NotifierHub::new(vec![]), None, PipelineConfig::default());
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("", ScanMode::Passive);

        let err = pipeline.run(&ctx, &target).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyTarget);
    }

    #[tokio::test]
    async fn no_compatible_sources_fails_fast() {
        let sources =
            vec![registered("nmap", SourceMode::Active, ArtifactType::Port, vec![], vec![ArtifactType::Port])];
        let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("example.com", ScanMode::Passive);

        let err = pipeline.run(&ctx, &target).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoSourcesAvailable);
    }

    #[tokio::test]
    async fn final_metadata_reports_relation_stats_from_graph() {
        let sources =
            vec![registered("crtsh", SourceMode::Passive, ArtifactType::Subdomain, vec![], vec![ArtifactType::Subdomain])];
        let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("example.com", ScanMode::Passive);

        let result = pipeline.run(&ctx, &target).await.unwrap();
        assert!(result.metadata.finished_at.is_some());
        assert_eq!(result.metadata.total_relations, 0);
    }

    #[tokio::test]
    async fn spilling_mid_scan_does_not_lose_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            registered("crtsh", SourceMode::Passive, ArtifactType::Subdomain, vec![], vec![ArtifactType::Subdomain]),
            registered(
                "resolver",
                SourceMode::Passive,
                ArtifactType::Ip,
                vec![ArtifactType::Subdomain],
                vec![ArtifactType::Ip],
            ),
        ];
        let writer = StreamingWriter::new(dir.path());
        let config = PipelineConfig { max_workers: 4, spill_threshold: Some(1) };
        let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), Some(writer), config);
        let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
        let target = Target::new("example.com", ScanMode::Passive);

        let result = pipeline.run(&ctx, &target).await.unwrap();
        assert_eq!(result.artifacts.len(), 2);
    }
}

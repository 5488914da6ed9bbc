// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-stage, semaphore-gated fan-out over a stage's member sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use aethonx_core::{ArtifactType, ScanResult, Target};
use aethonx_error::ErrorCode;
use aethonx_source::{ScanContext, Source};

use crate::notify::{Event, NotifierHub, Severity};

/// Outcome of running a single source within a stage.
pub struct SourceExecutionResult {
    pub source_name: String,
    pub scan_result: Option<ScanResult>,
    pub error: Option<String>,
    pub duration: Duration,
    pub artifact_count: usize,
}

/// Build the filtered input a source with non-empty `input_artifact_types`
/// should see: a copy of `accumulated` carrying only matching-typed
/// artifacts. A source with no declared input types receives an empty result.
#[must_use]
pub fn filter_input(
    accumulated: &ScanResult,
    input_types: &[ArtifactType],
) -> ScanResult {
    let mut filtered = ScanResult::new(accumulated.target.clone());
    if input_types.is_empty() {
        return filtered;
    }
    filtered.artifacts =
        accumulated.artifacts.iter().filter(|a| input_types.contains(&a.ty)).cloned().collect();
    filtered
}

/// Run a single source to completion, dispatching `source.started` before
/// and `source.completed`/`source.failed`/`source.timeout` after, plus one
/// `artifact.discovered` per artifact it yields.
#[instrument(skip(ctx, source, target, filtered, notifiers), fields(source = %source.name()))]
async fn run_one_source(
    ctx: ScanContext,
    source: Arc<dyn Source>,
    target: Target,
    filtered: ScanResult,
    notifiers: Arc<NotifierHub>,
) -> SourceExecutionResult {
    let name = source.name().to_string();
    notifiers
        .dispatch(&Event::new("source.started", name.clone(), Severity::Info))
        .await;

    let start = Instant::now();
    let outcome = if let Some(consumer) = source.as_input_consumer() {
        consumer.run_with_input(&ctx, &target, &filtered.artifacts).await
    } else {
        source.run(&ctx, &target).await
    };
    let duration = start.elapsed();

    match outcome {
        Ok(result) => {
            info!(source = %name, artifacts = result.artifacts.len(), "source completed");
            for artifact in &result.artifacts {
                notifiers
                    .dispatch(
                        &Event::new("artifact.discovered", name.clone(), Severity::Info).with_data(
                            json!({ "type": artifact.ty.as_str(), "value": artifact.value }),
                        ),
                    )
                    .await;
            }
            notifiers
                .dispatch(
                    &Event::new("source.completed", name.clone(), Severity::Info)
                        .with_data(json!({ "artifacts": result.artifacts.len() })),
                )
                .await;
            SourceExecutionResult {
                source_name: name,
                artifact_count: result.artifacts.len(),
                scan_result: Some(result),
                error: None,
                duration,
            }
        }
        Err(e) => {
            let kind = if e.code == ErrorCode::Timeout { "source.timeout" } else { "source.failed" };
            warn!(source = %name, error = %e, "source failed");
            notifiers
                .dispatch(
                    &Event::new(kind, name.clone(), Severity::Warning)
                        .with_data(json!({ "error": e.to_string() })),
                )
                .await;
            SourceExecutionResult {
                source_name: name,
                scan_result: None,
                error: Some(e.to_string()),
                duration,
                artifact_count: 0,
            }
        }
    }
}

/// Run every source in `stage_sources` concurrently, gated by a semaphore of
/// size `max_workers`. A source implementing [`aethonx_source::InputConsumer`]
/// is invoked via `run_with_input`; otherwise via `run`. Errors are collected,
/// never cancel peers, unless `ctx` itself is cancelled.
#[instrument(skip(ctx, target, stage_sources, input_types, accumulated, notifiers))]
pub async fn execute_stage(
    ctx: &ScanContext,
    target: &Target,
    stage_sources: &[Arc<dyn Source>],
    input_types: &HashMap<String, Vec<ArtifactType>>,
    accumulated: &ScanResult,
    max_workers: usize,
    notifiers: &Arc<NotifierHub>,
) -> Vec<SourceExecutionResult> {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut handles = Vec::with_capacity(stage_sources.len());

    for source in stage_sources {
        if ctx.is_cancelled() {
            break;
        }
        let source = Arc::clone(source);
        let ctx = ctx.clone();
        let target = target.clone();
        let semaphore = Arc::clone(&semaphore);
        let notifiers = Arc::clone(notifiers);
        let types = input_types.get(source.name()).cloned().unwrap_or_default();
        let filtered = filter_input(accumulated, &types);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            run_one_source(ctx, source, target, filtered, notifiers).await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(result) = handle.await {
            results.push(result);
        }
    }
    results
}

/// Fold a stage's per-source results into a single [`ScanResult`]. Failed
/// sources contribute a non-fatal `ErrorEntry` tagged with their name instead
/// of artifacts.
#[must_use]
pub fn fold_stage_results(target: &Target, results: Vec<SourceExecutionResult>) -> ScanResult {
    let mut folded = ScanResult::new(target.clone());
    for result in results {
        match result.scan_result {
            Some(scan_result) => {
                folded.artifacts.extend(scan_result.artifacts);
                folded.warnings.extend(scan_result.warnings);
                folded.errors.extend(scan_result.errors);
            }
            None => {
                folded.add_error(
                    result.source_name,
                    result.error.unwrap_or_else(|| "source failed with no message".to_string()),
                    false,
                );
            }
        }
    }
    folded
}

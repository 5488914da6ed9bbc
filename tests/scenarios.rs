// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end exercises of the named scenarios through the public facade,
//! as opposed to the per-crate unit coverage of their individual pieces.

use std::sync::Arc;

use aethonx::core::{Artifact, ArtifactType, ScanMode, ScanResult, Target};
use aethonx::error::AethonError;
use aethonx::runtime::{NotifierHub, Pipeline, PipelineConfig, RegisteredSource};
use aethonx::source::{ScanContext, SourceConfig, SourceDescriptor, SourceMode, SourceType};
use aethonx::CancellationToken;
use async_trait::async_trait;

struct CrtShStub;

#[async_trait]
impl aethonx::Source for CrtShStub {
    fn name(&self) -> &str {
        "crtsh"
    }
    fn mode(&self) -> SourceMode {
        SourceMode::Passive
    }
    fn source_type(&self) -> SourceType {
        SourceType::Api
    }
    async fn run(&self, _ctx: &ScanContext, target: &Target) -> Result<ScanResult, AethonError> {
        let mut result = ScanResult::new(target.clone());
        result
            .artifacts
            .push(Artifact::new(ArtifactType::Subdomain, &format!("TEST.{}", target.root), "crtsh"));
        result
            .artifacts
            .push(Artifact::new(ArtifactType::Subdomain, &format!("test.{}", target.root), "rdap"));
        Ok(result)
    }
}

struct ResolverStub;

#[async_trait]
impl aethonx::Source for ResolverStub {
    fn name(&self) -> &str {
        "resolver"
    }
    fn mode(&self) -> SourceMode {
        SourceMode::Passive
    }
    fn source_type(&self) -> SourceType {
        SourceType::Builtin
    }
    async fn run(&self, _ctx: &ScanContext, target: &Target) -> Result<ScanResult, AethonError> {
        Ok(ScanResult::new(target.clone()))
    }
}

fn descriptor(name: &str, inputs: Vec<ArtifactType>, outputs: Vec<ArtifactType>) -> SourceDescriptor {
    SourceDescriptor {
        name: name.to_string(),
        description: String::new(),
        version: "0.1.0".into(),
        mode: SourceMode::Passive,
        ty: SourceType::Api,
        requires_auth: false,
        rate_limit_hint: None,
        input_artifact_types: inputs,
        output_artifact_types: outputs,
        priority: 0,
        stage_hint: 0,
    }
}

#[tokio::test]
async fn scenario_a_dedup_merges_sources_across_a_full_scan() {
    let sources = vec![RegisteredSource {
        descriptor: descriptor("crtsh", vec![], vec![ArtifactType::Subdomain]),
        source: Arc::new(CrtShStub),
    }];
    let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
    let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
    let target = Target::new("example.com", ScanMode::Passive);

    let result = pipeline.run(&ctx, &target).await.unwrap();
    let subdomains: Vec<_> = result.artifacts.iter().filter(|a| a.ty == ArtifactType::Subdomain).collect();
    assert_eq!(subdomains.len(), 1, "case-insensitive duplicates across sources must merge into one artifact");
    assert_eq!(subdomains[0].sources, vec!["crtsh".to_string(), "rdap".to_string()]);
}

#[tokio::test]
async fn scenario_b_two_stage_pipeline_completes_and_reports_both_stage_outputs() {
    let sources = vec![
        RegisteredSource {
            descriptor: descriptor("crtsh", vec![], vec![ArtifactType::Subdomain]),
            source: Arc::new(CrtShStub),
        },
        RegisteredSource {
            descriptor: descriptor("resolver", vec![ArtifactType::Subdomain], vec![ArtifactType::Ip]),
            source: Arc::new(ResolverStub),
        },
    ];
    let pipeline = Pipeline::new(sources, NotifierHub::new(vec![]), None, PipelineConfig::default());
    let ctx = ScanContext::new(CancellationToken::new(), SourceConfig::default());
    let target = Target::new("example.com", ScanMode::Passive);

    let result = pipeline.run(&ctx, &target).await.unwrap();
    assert_eq!(result.metadata.sources_invoked, vec!["crtsh".to_string(), "resolver".to_string()]);
}

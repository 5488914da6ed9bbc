// SPDX-License-Identifier: MIT OR Apache-2.0
use aethonx_core::{Artifact, ArtifactType};
use aethonx_core::relation::RelationType;
use aethonx_graph::Graph;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn build_chain(depth: usize) -> Vec<Artifact> {
    let mut artifacts: Vec<Artifact> = (0..depth)
        .map(|i| Artifact::new(ArtifactType::Subdomain, &format!("host{i}.example.com"), "bench"))
        .collect();
    let ids: Vec<String> = artifacts.iter().map(|a| a.id.clone()).collect();
    for i in 0..artifacts.len().saturating_sub(1) {
        let next_id = ids[i + 1].clone();
        artifacts[i].add_relation(next_id, RelationType::ResolvesTo, 1.0, "bench");
    }
    artifacts
}

fn bench_find_path(c: &mut Criterion) {
    let artifacts = build_chain(500);
    let graph = Graph::build(&artifacts);
    let from = artifacts.first().unwrap().id.clone();
    let to = artifacts.last().unwrap().id.clone();

    c.bench_function("find_path_500_chain", |b| {
        b.iter(|| black_box(graph.find_path(&from, &to)))
    });
}

fn bench_get_neighbors(c: &mut Criterion) {
    let artifacts = build_chain(500);
    let graph = Graph::build(&artifacts);
    let from = artifacts.first().unwrap().id.clone();

    c.bench_function("get_neighbors_depth_50_of_500_chain", |b| {
        b.iter(|| black_box(graph.get_neighbors(&from, 50)))
    });
}

criterion_group!(benches, bench_find_path, bench_get_neighbors);
criterion_main!(benches);

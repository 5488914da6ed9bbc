// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable, owning artifact graph built once per scan at finalization.
//!
//! Artifacts are stored flat, addressed by id; relations reference
//! `target_id` rather than pointers, so cycles (e.g. `has_cname` chains) are
//! inert — every traversal uses a visited-set and is cycle-safe.

use std::collections::{BTreeMap, HashMap, VecDeque};

use aethonx_core::relation::{Relation, RelationType};
use aethonx_core::Artifact;
use serde::{Deserialize, Serialize};

/// Snapshot counters describing a [`Graph`]'s shape.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GraphStats {
    pub total_artifacts: usize,
    pub total_relations: usize,
    pub relations_by_type: BTreeMap<String, usize>,
    pub unique_relation_types: usize,
    pub fwd_index_size: usize,
    pub rev_index_size: usize,
}

/// A read-only, indexed view over a finished scan's artifacts.
///
/// Construct once from a finalized artifact slice; there is no mutation API.
pub struct Graph {
    by_id: HashMap<String, Artifact>,
    forward: HashMap<RelationType, HashMap<String, Vec<String>>>,
    reverse: HashMap<RelationType, HashMap<String, Vec<String>>>,
}

impl Graph {
    /// Build a graph from a finished artifact slice.
    #[must_use]
    pub fn build(artifacts: &[Artifact]) -> Self {
        let mut by_id = HashMap::with_capacity(artifacts.len());
        let mut forward: HashMap<RelationType, HashMap<String, Vec<String>>> = HashMap::new();
        let mut reverse: HashMap<RelationType, HashMap<String, Vec<String>>> = HashMap::new();

        for artifact in artifacts {
            for relation in &artifact.relations {
                forward
                    .entry(relation.kind)
                    .or_default()
                    .entry(artifact.id.clone())
                    .or_insert_with(Vec::new)
                    .push(relation.target_id.clone());
                reverse
                    .entry(relation.kind)
                    .or_default()
                    .entry(relation.target_id.clone())
                    .or_insert_with(Vec::new)
                    .push(artifact.id.clone());
            }
            by_id.insert(artifact.id.clone(), artifact.clone());
        }

        Self { by_id, forward, reverse }
    }

    /// O(1) lookup by id.
    #[must_use]
    pub fn get_artifact(&self, id: &str) -> Option<&Artifact> {
        self.by_id.get(id)
    }

    /// Artifacts `id` points to via relations of type `rel`.
    #[must_use]
    pub fn get_related(&self, id: &str, rel: RelationType) -> Vec<&Artifact> {
        self.forward
            .get(&rel)
            .and_then(|m| m.get(id))
            .into_iter()
            .flatten()
            .filter_map(|target_id| self.by_id.get(target_id))
            .collect()
    }

    /// Artifacts that point to `id` via relations of type `rel`.
    #[must_use]
    pub fn get_reverse_related(&self, id: &str, rel: RelationType) -> Vec<&Artifact> {
        self.reverse
            .get(&rel)
            .and_then(|m| m.get(id))
            .into_iter()
            .flatten()
            .filter_map(|source_id| self.by_id.get(source_id))
            .collect()
    }

    /// Every outgoing relation recorded on the artifact with id `id`.
    #[must_use]
    pub fn get_all_relations(&self, id: &str) -> Vec<&Relation> {
        self.by_id.get(id).map(|a| a.relations.iter().collect()).unwrap_or_default()
    }

    /// Iterative, level-by-level BFS out to `depth` hops. Each artifact is
    /// visited at most once; `depth < 1` returns nothing.
    #[must_use]
    pub fn get_neighbors(&self, id: &str, depth: u32) -> Vec<&Artifact> {
        if depth < 1 || !self.by_id.contains_key(id) {
            return Vec::new();
        }

        let mut visited: std::collections::HashSet<String> = std::collections::HashSet::new();
        visited.insert(id.to_string());
        let mut frontier = vec![id.to_string()];
        let mut out = Vec::new();

        for _ in 0..depth {
            let mut next_frontier = Vec::new();
            for node in &frontier {
                if let Some(artifact) = self.by_id.get(node) {
                    for relation in &artifact.relations {
                        if visited.insert(relation.target_id.clone()) {
                            next_frontier.push(relation.target_id.clone());
                        }
                    }
                }
            }
            for node_id in &next_frontier {
                if let Some(artifact) = self.by_id.get(node_id) {
                    out.push(artifact);
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        out
    }

    /// BFS shortest path from `from` to `to`, returned as the ordered
    /// sequence of relations traversed. Empty when `from == to` or `to` is
    /// unreachable.
    #[must_use]
    pub fn find_path(&self, from: &str, to: &str) -> Vec<Relation> {
        if from == to || !self.by_id.contains_key(from) {
            return Vec::new();
        }

        let mut visited: std::collections::HashSet<String> = std::collections::HashSet::new();
        visited.insert(from.to_string());
        let mut parent: HashMap<String, (String, Relation)> = HashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(from.to_string());

        while let Some(node) = queue.pop_front() {
            if node == to {
                break;
            }
            let Some(artifact) = self.by_id.get(&node) else { continue };
            for relation in &artifact.relations {
                if visited.insert(relation.target_id.clone()) {
                    parent.insert(relation.target_id.clone(), (node.clone(), relation.clone()));
                    queue.push_back(relation.target_id.clone());
                }
            }
        }

        if !parent.contains_key(to) && from != to {
            return Vec::new();
        }

        let mut edges = Vec::new();
        let mut cursor = to.to_string();
        while let Some((prev, relation)) = parent.get(&cursor) {
            edges.push(relation.clone());
            cursor = prev.clone();
        }
        edges.reverse();
        edges
    }

    /// Linear scan for artifacts of a given type (no type index by default).
    #[must_use]
    pub fn find_by_type(&self, ty: aethonx_core::ArtifactType) -> Vec<&Artifact> {
        self.by_id.values().filter(|a| a.ty == ty).collect()
    }

    /// Snapshot counters describing this graph's shape.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut relations_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_relations = 0usize;
        for artifact in self.by_id.values() {
            for relation in &artifact.relations {
                *relations_by_type.entry(relation.kind.as_str().to_string()).or_insert(0) += 1;
                total_relations += 1;
            }
        }
        GraphStats {
            total_artifacts: self.by_id.len(),
            total_relations,
            unique_relation_types: relations_by_type.len(),
            relations_by_type,
            fwd_index_size: self.forward.values().map(HashMap::len).sum(),
            rev_index_size: self.reverse.values().map(HashMap::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethonx_core::artifact_type::ArtifactType;

    fn artifact(ty: ArtifactType, value: &str) -> Artifact {
        Artifact::new(ty, value, "x")
    }

    /// Builds the fixture from Scenario F: `D -> (none)`, `SD
    /// --resolves_to--> IP --owned_by--> ASN`.
    fn scenario_f() -> (Graph, String, String, String, String) {
        let d = artifact(ArtifactType::Domain, "example.com");
        let mut sd = artifact(ArtifactType::Subdomain, "test.example.com");
        let ip = artifact(ArtifactType::Ip, "1.2.3.4");
        let mut ip_with_rel = ip.clone();
        let asn = artifact(ArtifactType::Asn, "AS15169");

        sd.add_relation(ip.id.clone(), RelationType::ResolvesTo, 0.9, "dns");
        ip_with_rel.add_relation(asn.id.clone(), RelationType::OwnedBy, 0.9, "rdap");

        let artifacts = vec![d.clone(), sd.clone(), ip_with_rel.clone(), asn.clone()];
        (Graph::build(&artifacts), d.id, sd.id, ip_with_rel.id, asn.id)
    }

    #[test]
    fn get_artifact_is_found_by_id() {
        let (graph, d_id, ..) = scenario_f();
        assert!(graph.get_artifact(&d_id).is_some());
        assert!(graph.get_artifact("missing").is_none());
    }

    #[test]
    fn scenario_f_find_path_returns_two_edges_in_order() {
        let (graph, _d, sd_id, ip_id, asn_id) = scenario_f();
        let path = graph.find_path(&sd_id, &asn_id);
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].kind, RelationType::ResolvesTo);
        assert_eq!(path[0].target_id, ip_id);
        assert_eq!(path[1].kind, RelationType::OwnedBy);
        assert_eq!(path[1].target_id, asn_id);
    }

    #[test]
    fn find_path_from_self_is_empty() {
        let (graph, _d, sd_id, ..) = scenario_f();
        assert!(graph.find_path(&sd_id, &sd_id).is_empty());
    }

    #[test]
    fn find_path_to_unreachable_is_empty() {
        let (graph, d_id, sd_id, ..) = scenario_f();
        assert!(graph.find_path(&d_id, &sd_id).is_empty());
    }

    #[test]
    fn scenario_f_get_neighbors_depth_two_includes_ip_and_asn() {
        let (graph, _d, sd_id, ip_id, asn_id) = scenario_f();
        let neighbors = graph.get_neighbors(&sd_id, 2);
        let ids: Vec<_> = neighbors.iter().map(|a| a.id.clone()).collect();
        assert!(ids.contains(&ip_id));
        assert!(ids.contains(&asn_id));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn get_neighbors_depth_zero_is_empty() {
        let (graph, _d, sd_id, ..) = scenario_f();
        assert!(graph.get_neighbors(&sd_id, 0).is_empty());
    }

    #[test]
    fn scenario_f_reverse_related_finds_source() {
        let (graph, _d, sd_id, ip_id, _asn) = scenario_f();
        let reverse = graph.get_reverse_related(&ip_id, RelationType::ResolvesTo);
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[0].id, sd_id);
    }

    #[test]
    fn forward_and_reverse_indices_agree() {
        let (graph, _d, sd_id, ip_id, _asn) = scenario_f();
        let forward = graph.get_related(&sd_id, RelationType::ResolvesTo);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].id, ip_id);
    }

    #[test]
    fn find_by_type_linear_scan() {
        let (graph, ..) = scenario_f();
        assert_eq!(graph.find_by_type(ArtifactType::Asn).len(), 1);
        assert_eq!(graph.find_by_type(ArtifactType::Domain).len(), 1);
    }

    #[test]
    fn stats_report_totals() {
        let (graph, ..) = scenario_f();
        let stats = graph.stats();
        assert_eq!(stats.total_artifacts, 4);
        assert_eq!(stats.total_relations, 2);
        assert_eq!(stats.unique_relation_types, 2);
    }

    #[test]
    fn cyclic_relations_do_not_loop_bfs() {
        let mut a = artifact(ArtifactType::Domain, "a.com");
        let mut b = artifact(ArtifactType::Domain, "b.com");
        a.add_relation(b.id.clone(), RelationType::HasCname, 0.5, "dns");
        b.add_relation(a.id.clone(), RelationType::HasCname, 0.5, "dns");

        let graph = Graph::build(&[a.clone(), b.clone()]);
        let neighbors = graph.get_neighbors(&a.id, 5);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].id, b.id);
    }
}

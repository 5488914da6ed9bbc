// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage resolution: partitions sources into dependency-respecting levels.

use std::collections::{BTreeSet, HashMap, VecDeque};

use aethonx_error::{AethonError, ErrorCode};
use aethonx_source::{SourceDescriptor, SourceMode, SourceType};

/// One level of the resolved pipeline: a cosmetic name plus its member
/// source names. Stage identity is the index in the returned `Vec`, not the
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub sources: Vec<String>,
}

/// Partition `descriptors` into dependency-ordered stages.
///
/// A source with non-empty `input_artifact_types` depends on every other
/// source that declares one of those types in its `output_artifact_types`.
/// Two sources in the same stage have no mutual dependency; every dependency
/// edge points from an earlier stage to a later one.
///
/// # Errors
///
/// Returns [`ErrorCode::CyclicDependency`] listing the unprocessed source
/// names if the dependency graph has a cycle.
pub fn resolve_stages(descriptors: &[SourceDescriptor]) -> Result<Vec<Stage>, AethonError> {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, u32> = HashMap::new();
    for d in descriptors {
        in_degree.entry(d.name.as_str()).or_insert(0);
    }

    for consumer in descriptors {
        if consumer.input_artifact_types.is_empty() {
            continue;
        }
        for producer in descriptors {
            if producer.name == consumer.name {
                continue;
            }
            let provides = producer
                .output_artifact_types
                .iter()
                .any(|t| consumer.input_artifact_types.contains(t));
            if provides {
                successors.entry(producer.name.as_str()).or_default().push(consumer.name.as_str());
                *in_degree.entry(consumer.name.as_str()).or_insert(0) += 1;
            }
        }
    }

    let by_name: HashMap<&str, &SourceDescriptor> =
        descriptors.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut queue_sorted: Vec<&str> = queue.drain(..).collect();
    queue_sorted.sort_unstable();
    let mut queue: VecDeque<&str> = queue_sorted.into();

    let mut stages = Vec::new();
    let mut processed = 0usize;

    while !queue.is_empty() {
        let mut level: Vec<&str> = queue.drain(..).collect();
        level.sort_unstable();
        processed += level.len();

        let mut next_round = BTreeSet::new();
        for &name in &level {
            if let Some(succ) = successors.get(name) {
                for &s in succ {
                    let deg = in_degree.get_mut(s).expect("successor must have an in-degree entry");
                    *deg -= 1;
                    if *deg == 0 {
                        next_round.insert(s);
                    }
                }
            }
        }

        stages.push(build_stage(&level, &by_name));
        queue = next_round.into_iter().collect();
    }

    if processed < descriptors.len() {
        let unprocessed: Vec<String> = in_degree
            .iter()
            .filter(|(_, deg)| **deg > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(AethonError::fatal(
            ErrorCode::CyclicDependency,
            format!("cyclic source dependency among: {}", unprocessed.join(", ")),
        ));
    }

    Ok(stages)
}

fn build_stage(members: &[&str], by_name: &HashMap<&str, &SourceDescriptor>) -> Stage {
    let sources: Vec<String> = members.iter().map(|s| s.to_string()).collect();
    let descriptors: Vec<&SourceDescriptor> =
        members.iter().filter_map(|name| by_name.get(name).copied()).collect();
    Stage { name: name_stage(&descriptors), sources }
}

fn name_stage(members: &[&SourceDescriptor]) -> String {
    if members.is_empty() {
        return "Empty Stage".to_string();
    }
    let all_passive = members.iter().all(|d| d.mode == SourceMode::Passive);
    let all_active_cli =
        members.iter().all(|d| d.mode == SourceMode::Active && d.ty == SourceType::Cli);
    if all_passive {
        "Surface Discovery".to_string()
    } else if all_active_cli {
        "Deep Scanning".to_string()
    } else {
        "Hybrid Enumeration".to_string()
    }
}

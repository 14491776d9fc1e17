//! Substitutions: pairs of same-relation edges that differ by exactly one
//! participant on each side, suggesting the two differing entities are interchangeable
//! in that relation.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SubstitutionsConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

fn jaccard(a: &BTreeSet<NodeId>, b: &BTreeSet<NodeId>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &SubstitutionsConfig,
    rng_seed: u64,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("substitutions", None);

    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut sample: Vec<EdgeId> = store.edges().map(|e| e.id.clone()).collect();
    sample.shuffle(&mut rng);
    sample.truncate(config.substitution_sample_cap.min(sample.len()));
    sample.sort();

    let mut by_relation: HashMap<String, Vec<EdgeId>> = HashMap::new();
    for id in &sample {
        if let Some(edge) = store.get_edge(id) {
            by_relation.entry(edge.relation_lower()).or_default().push(id.clone());
        }
    }

    let mut insights = Vec::new();
    for group in by_relation.values() {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let Some(e1) = store.get_edge(&group[i]) else { continue };
                let Some(e2) = store.get_edge(&group[j]) else { continue };
                let nodes1 = e1.all_nodes();
                let nodes2 = e2.all_nodes();
                let intersection: BTreeSet<NodeId> =
                    nodes1.intersection(&nodes2).cloned().collect();
                let diff1: Vec<&NodeId> = nodes1.difference(&intersection).collect();
                let diff2: Vec<&NodeId> = nodes2.difference(&intersection).collect();
                if diff1.len() != 1 || diff2.len() != 1 {
                    continue;
                }
                let j = jaccard(&nodes1, &nodes2);
                if j < config.substitution_similarity_threshold {
                    continue;
                }
                let seeds = vec![diff1[0].clone(), diff2[0].clone()];
                let witness_edges = vec![e1.id.clone(), e2.id.clone()];
                let witness_nodes: Vec<NodeId> =
                    nodes1.union(&nodes2).cloned().collect();
                let (breakdown, final_score) =
                    score::score(&seeds, witness_edges.len(), store, index);
                let label_of = |id: &NodeId| {
                    store
                        .get_node(id)
                        .map(|n| n.label.clone())
                        .unwrap_or_else(|| id.to_string())
                };
                insights.push(Insight {
                    id: ids.next(InsightType::Substitution),
                    insight_type: InsightType::Substitution,
                    seed_labels: seeds.iter().map(label_of).collect(),
                    evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
                    witness_edges,
                    witness_nodes,
                    seeds,
                    score: final_score,
                    score_breakdown: breakdown,
                    novelty_tags: vec![format!("jaccard={j:.2}")],
                    description: format!(
                        "{} may substitute for {} in \"{}\" relations",
                        label_of(diff1[0]),
                        label_of(diff2[0]),
                        e1.relation_lower()
                    ),
                    llm: LlmSlot::default(),
                    created_utc: Utc::now(),
                });
                if insights.len() >= config.substitution_max_candidates {
                    progress.finish();
                    return insights;
                }
            }
        }
    }

    progress.finish();
    insights
}

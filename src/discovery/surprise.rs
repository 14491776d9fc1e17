//! Surprise edges: edges whose participants are far less likely to co-occur than
//! their individual degrees would predict under independence.

use chrono::Utc;

use crate::config::SurpriseConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

const EPSILON: f64 = 1e-10;

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &SurpriseConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("surprise", Some(store.edge_count() as u64));

    let total_edges = store.edge_count() as f64;
    let mut candidates: Vec<(EdgeId, Vec<NodeId>, f64)> = Vec::new();
    for edge in store.edges() {
        let nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
        let expected: f64 = if total_edges > 0.0 {
            nodes.iter().map(|n| store.degree(n) as f64 / total_edges).product()
        } else {
            0.0
        };
        if expected < config.surprise_max_expected_cooccurrence {
            let surprise = 1.0 / (expected + EPSILON);
            candidates.push((edge.id.clone(), nodes, surprise));
        }
        progress.advance(1);
    }
    candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap().then_with(|| a.0.cmp(&b.0)));
    candidates.truncate(config.surprise_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (edge_id, nodes, surprise) in candidates {
        let witness_edges = vec![edge_id.clone()];
        let (breakdown, final_score) = score::score(&nodes, 1, store, index);
        let labels: Vec<String> = nodes
            .iter()
            .map(|n| {
                store
                    .get_node(n)
                    .map(|node| node.label.clone())
                    .unwrap_or_else(|| n.to_string())
            })
            .collect();
        insights.push(Insight {
            id: ids.next(InsightType::SurpriseEdge),
            insight_type: InsightType::SurpriseEdge,
            seed_labels: labels.clone(),
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes: nodes.clone(),
            seeds: nodes,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("surprise={surprise:.2}")],
            description: format!("Unexpected co-occurrence of {}", labels.join(", ")),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    insights
}

//! Motifs: node pairs that co-occur across edges far more often than their degrees
//! alone would predict.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::config::MotifsConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot, ScoreBreakdown};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &MotifsConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("motifs", Some(store.edge_count() as u64));

    let total_edges = store.edge_count() as f64;
    let mut counts: HashMap<(NodeId, NodeId), Vec<EdgeId>> = HashMap::new();
    for edge in store.edges() {
        let mut nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
        nodes.truncate(10);
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                counts
                    .entry((nodes[i].clone(), nodes[j].clone()))
                    .or_default()
                    .push(edge.id.clone());
            }
        }
        progress.advance(1);
    }

    let mut candidates: Vec<(NodeId, NodeId, Vec<EdgeId>, f64)> = Vec::new();
    for ((a, b), edges) in counts {
        let observed = edges.len() as f64;
        if observed < config.motif_min_support as f64 {
            continue;
        }
        let expected = if total_edges > 0.0 {
            (store.degree(&a) as f64 / total_edges) * (store.degree(&b) as f64 / total_edges)
                * total_edges
        } else {
            0.0
        };
        let lift = if expected > 0.0 { observed / expected } else { 0.0 };
        if lift >= config.motif_min_lift {
            candidates.push((a, b, edges, lift));
        }
    }
    candidates.sort_by(|x, y| {
        y.3.partial_cmp(&x.3)
            .unwrap()
            .then_with(|| (x.0.clone(), x.1.clone()).cmp(&(y.0.clone(), y.1.clone())))
    });
    candidates.truncate(config.motif_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (a, b, edges, lift) in candidates {
        let seeds = vec![a.clone(), b.clone()];
        let witness_nodes: Vec<NodeId> = edges
            .iter()
            .filter_map(|e| store.get_edge(e))
            .flat_map(|e| e.all_nodes())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        // The observed/expected lift is the novelty signal, not co-occurrence.
        let breakdown = ScoreBreakdown {
            support: score::support_component(edges.len()),
            novelty: lift,
            specificity: score::specificity_component(&seeds, store),
        };
        let final_score = score::combine(breakdown);
        let label_of = |id: &NodeId| {
            store
                .get_node(id)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| id.to_string())
        };
        insights.push(Insight {
            id: ids.next(InsightType::Motif),
            insight_type: InsightType::Motif,
            seed_labels: vec![label_of(&a), label_of(&b)],
            evidence_chunk_ids: evidence_chunk_ids(store, &edges),
            witness_edges: edges,
            witness_nodes,
            seeds,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("lift={lift:.2}")],
            description: format!("{} and {} co-occur with lift {lift:.2}", label_of(&a), label_of(&b)),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    insights
}

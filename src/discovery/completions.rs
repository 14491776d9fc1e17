//! Completions: entity pairs that co-occur across several edges, each time alongside
//! a different "third" entity — suggesting the pattern could be completed further.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::config::CompletionsConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot, ScoreBreakdown};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &CompletionsConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("completions", Some(store.edge_count() as u64));

    let mut pair_edges: HashMap<(NodeId, NodeId), Vec<EdgeId>> = HashMap::new();
    for edge in store.edges() {
        let nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let key = (nodes[i].clone(), nodes[j].clone());
                pair_edges.entry(key).or_default().push(edge.id.clone());
            }
        }
        progress.advance(1);
    }

    let mut candidates: Vec<(NodeId, NodeId, Vec<EdgeId>, BTreeSet<NodeId>)> = Vec::new();
    for ((a, b), shared_edges) in pair_edges {
        if shared_edges.len() < config.completion_min_shared_edges {
            continue;
        }
        let mut thirds: BTreeSet<NodeId> = BTreeSet::new();
        for edge_id in &shared_edges {
            if let Some(edge) = store.get_edge(edge_id) {
                for n in edge.all_nodes() {
                    if n != a && n != b {
                        thirds.insert(n);
                    }
                }
            }
        }
        if thirds.len() >= 2 {
            candidates.push((a, b, shared_edges, thirds));
        }
    }
    candidates.sort_by(|x, y| {
        y.3.len()
            .cmp(&x.3.len())
            .then_with(|| (x.0.clone(), x.1.clone()).cmp(&(y.0.clone(), y.1.clone())))
    });
    candidates.truncate(config.completion_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (a, b, shared_edges, thirds) in candidates {
        let seeds = vec![a.clone(), b.clone()];
        let mut witness_nodes: Vec<NodeId> = seeds.clone();
        witness_nodes.extend(thirds.iter().cloned());
        // The third-entity set size is the novelty signal, not co-occurrence.
        let breakdown = ScoreBreakdown {
            support: score::support_component(shared_edges.len()),
            novelty: thirds.len() as f64,
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
            id: ids.next(InsightType::Completion),
            insight_type: InsightType::Completion,
            seed_labels: vec![label_of(&a), label_of(&b)],
            evidence_chunk_ids: evidence_chunk_ids(store, &shared_edges),
            witness_edges: shared_edges,
            witness_nodes,
            seeds,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: thirds.iter().map(label_of).collect(),
            description: format!(
                "{} and {} co-occur with {} distinct third entities",
                label_of(&a),
                label_of(&b),
                thirds.len()
            ),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    #[test]
    fn emits_completion_when_third_set_has_two_members() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A", "B"], "rel", &["X"], Provenance::default(), 1.0);
        g.add_edge(&["A", "B"], "rel", &["Y"], Provenance::default(), 1.0);
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = CompletionsConfig {
            completion_min_shared_edges: 1,
            completion_max_candidates: 10,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].novelty_tags.len(), 2);
    }

    #[test]
    fn no_completion_with_single_third_entity() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A", "B"], "rel", &["X"], Provenance::default(), 1.0);
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = CompletionsConfig {
            completion_min_shared_edges: 1,
            completion_max_candidates: 10,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(insights.is_empty());
    }
}

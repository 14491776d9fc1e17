//! Bridges: nodes whose incident edges span multiple s-components.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;

use crate::config::BridgesConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

/// Emit one insight per node whose incident edges touch >= 2 distinct s-components at
/// `config.bridge_s_threshold`, ranked by the number of components spanned.
pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &BridgesConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("bridges", Some(store.node_count() as u64));

    let components = index.s_components_for(config.bridge_s_threshold);
    let mut edge_component: HashMap<EdgeId, usize> = HashMap::new();
    for (i, component) in components.iter().enumerate() {
        for edge_id in component {
            edge_component.insert(edge_id.clone(), i);
        }
    }

    let mut candidates: Vec<(NodeId, usize, Vec<EdgeId>)> = Vec::new();
    for node in store.nodes() {
        let incident = store.incident_edges(&node.id);
        let spanned: HashSet<usize> = incident
            .iter()
            .filter_map(|e| edge_component.get(e))
            .copied()
            .collect();
        if spanned.len() >= 2 {
            candidates.push((node.id.clone(), spanned.len(), incident.to_vec()));
        }
        progress.advance(1);
    }
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    candidates.truncate(config.bridge_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (node_id, span, incident) in candidates {
        let witness_nodes: Vec<NodeId> = incident
            .iter()
            .filter_map(|e| store.get_edge(e))
            .flat_map(|e| e.all_nodes())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let seeds = vec![node_id.clone()];
        let (breakdown, score) = score::score(&seeds, incident.len(), store, index);
        let label = store
            .get_node(&node_id)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| node_id.to_string());
        insights.push(Insight {
            id: ids.next(InsightType::Bridge),
            insight_type: InsightType::Bridge,
            seed_labels: vec![label.clone()],
            evidence_chunk_ids: evidence_chunk_ids(store, &incident),
            witness_edges: incident,
            witness_nodes,
            seeds,
            score,
            score_breakdown: breakdown,
            novelty_tags: Vec::new(),
            description: format!("{label} bridges {span} s-components"),
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

    fn sample_store() -> Hypergraph {
        let mut g = Hypergraph::new();
        g.add_edge(&["A"], "rel1", &["B"], Provenance::default(), 1.0);
        g.add_edge(&["C"], "rel2", &["D"], Provenance::default(), 1.0);
        // E is shared only by coincidence of being in both otherwise-disjoint edges.
        g.add_edge(&["B"], "rel3", &["E"], Provenance::default(), 1.0);
        g.add_edge(&["E"], "rel4", &["D"], Provenance::default(), 1.0);
        g
    }

    #[test]
    fn finds_node_spanning_disconnected_components_at_s2() {
        let store = sample_store();
        let index = HypergraphIndex::build(&store, &[2], "test.json");
        let config = BridgesConfig {
            bridge_s_threshold: 2,
            bridge_max_candidates: 10,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&store, &index, &config, &mut ids, &crate::progress::NoopReporter);
        // At s=2 every edge is its own component (no pair shares 2 nodes), so every
        // node with degree >= 2 spans >= 2 components.
        assert!(insights.iter().any(|i| i.seeds == vec![NodeId::from("b")]));
    }

    #[test]
    fn respects_max_candidates_cap() {
        let store = sample_store();
        let index = HypergraphIndex::build(&store, &[2], "test.json");
        let config = BridgesConfig {
            bridge_s_threshold: 2,
            bridge_max_candidates: 1,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&store, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(insights.len() <= 1);
    }
}

//! Author reference chains: two-hop citation chains `A -> B -> C` through
//! reference-like relations between person-like entities.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::config::AuthorChainsConfig;
use crate::discovery::{evidence_chunk_ids, is_person_like_label, is_reference_like_relation, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

fn citation_adjacency(store: &Hypergraph) -> HashMap<NodeId, Vec<(NodeId, EdgeId)>> {
    let mut adjacency: HashMap<NodeId, Vec<(NodeId, EdgeId)>> = HashMap::new();
    for edge in store.edges() {
        if !is_reference_like_relation(&edge.relation) {
            continue;
        }
        for citer in &edge.sources {
            let Some(citer_node) = store.get_node(citer) else { continue };
            if !is_person_like_label(&citer_node.label) {
                continue;
            }
            for cited in &edge.targets {
                let Some(cited_node) = store.get_node(cited) else { continue };
                if !is_person_like_label(&cited_node.label) {
                    continue;
                }
                adjacency
                    .entry(citer.clone())
                    .or_default()
                    .push((cited.clone(), edge.id.clone()));
            }
        }
    }
    adjacency
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &AuthorChainsConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("author_chains", None);

    let adjacency = citation_adjacency(store);
    let mut chains: Vec<(NodeId, NodeId, NodeId, Vec<EdgeId>)> = Vec::new();

    let mut citers: Vec<&NodeId> = adjacency.keys().collect();
    citers.sort();
    for a in citers {
        let Some(first_hop) = adjacency.get(a) else { continue };
        for (b, edge_ab) in first_hop {
            let Some(second_hop) = adjacency.get(b) else { continue };
            for (c, edge_bc) in second_hop {
                if a == b || b == c || a == c {
                    continue;
                }
                chains.push((a.clone(), b.clone(), c.clone(), vec![edge_ab.clone(), edge_bc.clone()]));
            }
        }
    }

    chains.sort_by(|x, y| (x.0.clone(), x.1.clone(), x.2.clone()).cmp(&(y.0.clone(), y.1.clone(), y.2.clone())));
    chains.truncate(config.author_chain_max_candidates);

    let mut insights = Vec::with_capacity(chains.len());
    for (a, b, c, witness_edges) in chains {
        let seeds = vec![a.clone(), b.clone(), c.clone()];
        let witness_nodes: Vec<NodeId> = witness_edges
            .iter()
            .filter_map(|e| store.get_edge(e))
            .flat_map(|e| e.all_nodes())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let (breakdown, final_score) = score::score(&seeds, witness_edges.len(), store, index);
        let label_of = |id: &NodeId| {
            store
                .get_node(id)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| id.to_string())
        };
        insights.push(Insight {
            id: ids.next(InsightType::AuthorReferenceChain),
            insight_type: InsightType::AuthorReferenceChain,
            seed_labels: vec![label_of(&a), label_of(&b), label_of(&c)],
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes,
            seeds,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: Vec::new(),
            description: format!(
                "{} references {}, who in turn references {}",
                label_of(&a),
                label_of(&b),
                label_of(&c)
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
    fn finds_two_hop_citation_chain() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A. Smith"], "cites", &["B. Jones"], Provenance::default(), 1.0);
        g.add_edge(&["B. Jones"], "cites", &["C. Lee"], Provenance::default(), 1.0);
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = AuthorChainsConfig { author_chain_max_candidates: 50 };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].seed_labels, vec!["A. Smith", "B. Jones", "C. Lee"]);
    }

    #[test]
    fn non_person_labels_never_enter_the_adjacency() {
        let mut g = Hypergraph::new();
        g.add_edge(&["acme labs"], "cites", &["beta labs"], Provenance::default(), 1.0);
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = AuthorChainsConfig { author_chain_max_candidates: 50 };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(insights.is_empty());
    }
}

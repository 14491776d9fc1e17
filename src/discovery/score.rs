//! The generic scoring formula shared by most operators:
//! `score = 0.4*support' + 0.35*novelty' + 0.25*specificity'`.

use crate::index::HypergraphIndex;
use crate::insight::ScoreBreakdown;
use crate::store::Hypergraph;
use crate::types::NodeId;

const SUPPORT_WEIGHT: f64 = 0.4;
const NOVELTY_WEIGHT: f64 = 0.35;
const SPECIFICITY_WEIGHT: f64 = 0.25;

pub fn support_component(witness_edge_count: usize) -> f64 {
    (1.0 + witness_edge_count as f64).log10()
}

/// `1 / (1 + log(1 + avg_cooccurrence(pairs(seeds))))` with fewer than two seeds
/// falling back to the neutral 0.5.
pub fn novelty_component(seeds: &[NodeId], index: &HypergraphIndex) -> f64 {
    if seeds.len() < 2 {
        return 0.5;
    }
    let mut total = 0u64;
    let mut pairs = 0u64;
    for i in 0..seeds.len() {
        for j in (i + 1)..seeds.len() {
            total += index.get_cooccurrence(&seeds[i], &seeds[j]);
            pairs += 1;
        }
    }
    let avg = if pairs == 0 { 0.0 } else { total as f64 / pairs as f64 };
    1.0 / (1.0 + (1.0 + avg).ln())
}

/// `1 / (1 + log(1 + avg_degree(seeds)))` with an empty seed set falling back to 0.5.
pub fn specificity_component(seeds: &[NodeId], store: &Hypergraph) -> f64 {
    if seeds.is_empty() {
        return 0.5;
    }
    let avg_degree: f64 =
        seeds.iter().map(|s| store.degree(s) as f64).sum::<f64>() / seeds.len() as f64;
    1.0 / (1.0 + (1.0 + avg_degree).ln())
}

pub fn combine(breakdown: ScoreBreakdown) -> f64 {
    SUPPORT_WEIGHT * breakdown.support
        + NOVELTY_WEIGHT * breakdown.novelty
        + SPECIFICITY_WEIGHT * breakdown.specificity
}

/// Compute the full breakdown and the combined score for an operator that uses the
/// generic formula (i.e. not diffusion or TransE, which override the score directly).
pub fn score(
    seeds: &[NodeId],
    witness_edge_count: usize,
    store: &Hypergraph,
    index: &HypergraphIndex,
) -> (ScoreBreakdown, f64) {
    let breakdown = ScoreBreakdown {
        support: support_component(witness_edge_count),
        novelty: novelty_component(seeds, index),
        specificity: specificity_component(seeds, store),
    };
    let score = combine(breakdown);
    (breakdown, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn novelty_falls_back_to_neutral_with_fewer_than_two_seeds() {
        let index = HypergraphIndex {
            meta: crate::index::IndexMeta {
                created_utc: chrono::Utc::now(),
                source_graph_path: String::new(),
                node_count: 0,
                edge_count: 0,
            },
            relation_to_edges: Default::default(),
            label_to_nodes: Default::default(),
            s_components: Default::default(),
            degree_ranked_nodes: Vec::new(),
            entity_cooccurrence: Default::default(),
        };
        assert_eq!(novelty_component(&[], &index), 0.5);
        assert_eq!(novelty_component(&[NodeId::from("a")], &index), 0.5);
    }

    #[test]
    fn specificity_falls_back_to_neutral_with_no_seeds() {
        let store = Hypergraph::new();
        assert_eq!(specificity_component(&[], &store), 0.5);
    }

    #[test]
    fn support_grows_with_witness_count() {
        assert!(support_component(10) > support_component(1));
        assert_eq!(support_component(0), 0.0);
    }
}

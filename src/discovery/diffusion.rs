//! Diffusion: personalized PageRank from each top-degree seed over the node-neighbor
//! graph induced by hyperedge cliques. The diffusion score overrides the generic
//! scoring formula — it carries its own well-calibrated signal.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::config::DiffusionConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot, ScoreBreakdown};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

/// A petgraph `DiGraph` over the node-neighbor graph induced by hyperedge cliques, with
/// `NodeId` <-> `NodeIndex` maps. Edge weight is the number of hyperedges that co-place
/// the pair.
struct CliqueGraph {
    graph: DiGraph<NodeId, f64>,
    node_to_index: HashMap<NodeId, NodeIndex>,
    index_to_node: HashMap<NodeIndex, NodeId>,
}

fn build_clique_graph(store: &Hypergraph) -> CliqueGraph {
    let mut graph = DiGraph::<NodeId, f64>::new();
    let mut node_to_index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut index_to_node: HashMap<NodeIndex, NodeId> = HashMap::new();

    for node in store.nodes() {
        let idx = graph.add_node(node.id.clone());
        node_to_index.insert(node.id.clone(), idx);
        index_to_node.insert(idx, node.id.clone());
    }

    for edge in store.edges() {
        let nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
        for i in 0..nodes.len() {
            for j in 0..nodes.len() {
                if i == j {
                    continue;
                }
                let (a, b) = (node_to_index[&nodes[i]], node_to_index[&nodes[j]]);
                if let Some(existing) = graph.find_edge(a, b) {
                    graph[existing] += 1.0;
                } else {
                    graph.add_edge(a, b, 1.0);
                }
            }
        }
    }

    CliqueGraph { graph, node_to_index, index_to_node }
}

/// Personalized PageRank with teleportation back to `seed` rather than to a uniform
/// distribution. `petgraph::algo::page_rank` only computes the global variant, so the
/// per-seed reset step is done by hand over the same `DiGraph` shape.
fn personalized_pagerank(clique: &CliqueGraph, seed: &NodeId, damping: f64, iterations: u32) -> HashMap<NodeId, f64> {
    let n = clique.graph.node_count();
    if n == 0 {
        return HashMap::new();
    }
    let Some(&seed_idx) = clique.node_to_index.get(seed) else {
        return HashMap::new();
    };
    let indices: Vec<NodeIndex> = clique.graph.node_indices().collect();
    let uniform = 1.0 / n as f64;
    let mut rank: HashMap<NodeIndex, f64> = indices.iter().map(|&i| (i, uniform)).collect();

    for _ in 0..iterations {
        let mut next: HashMap<NodeIndex, f64> = indices.iter().map(|&i| (i, 0.0)).collect();
        for &from in &indices {
            let total_weight: f64 = clique.graph.edges(from).map(|e| *e.weight()).sum();
            if total_weight <= 0.0 {
                continue;
            }
            let rank_from = rank[&from];
            for edge in clique.graph.edges(from) {
                *next.get_mut(&edge.target()).unwrap() += damping * rank_from * (*edge.weight() / total_weight);
            }
        }
        *next.get_mut(&seed_idx).unwrap() += 1.0 - damping;
        rank = next;
    }

    rank.into_iter().map(|(idx, r)| (clique.index_to_node[&idx].clone(), r)).collect()
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &DiffusionConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    let seeds: Vec<NodeId> = index
        .get_top_hubs(config.diffusion_top_k)
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    progress.start("diffusion", Some(seeds.len() as u64));

    let clique = build_clique_graph(store);
    let mut insights = Vec::new();

    for seed in &seeds {
        let ranks = personalized_pagerank(&clique, seed, config.diffusion_damping, config.diffusion_iterations);
        let mut ranked: Vec<(NodeId, f64)> = ranks.into_iter().filter(|(n, _)| n != seed).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.diffusion_results_per_seed);

        for (target, pr_score) in ranked {
            let witness_edges: Vec<EdgeId> = {
                let mut edges: BTreeSet<EdgeId> = store.incident_edges(seed).iter().cloned().collect();
                edges.extend(store.incident_edges(&target).iter().cloned());
                edges.into_iter().collect()
            };
            let seeds_pair = vec![seed.clone(), target.clone()];
            let breakdown = ScoreBreakdown {
                support: score::support_component(witness_edges.len()),
                novelty: pr_score,
                specificity: score::specificity_component(&seeds_pair, store),
            };
            let label_of = |id: &NodeId| {
                store
                    .get_node(id)
                    .map(|n| n.label.clone())
                    .unwrap_or_else(|| id.to_string())
            };
            insights.push(Insight {
                id: ids.next(InsightType::Diffusion),
                insight_type: InsightType::Diffusion,
                seed_labels: vec![label_of(seed), label_of(&target)],
                evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
                witness_nodes: seeds_pair.clone(),
                witness_edges,
                seeds: seeds_pair,
                score: pr_score,
                score_breakdown: breakdown,
                novelty_tags: vec![format!("pagerank={pr_score:.4}")],
                description: format!(
                    "Diffusion from {} reaches {} with rank {pr_score:.4}",
                    label_of(seed),
                    label_of(&target)
                ),
                llm: LlmSlot::default(),
                created_utc: Utc::now(),
            });
        }
        progress.advance(1);
    }

    progress.finish();
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    #[test]
    fn diffuses_rank_to_multi_hop_neighbors() {
        let mut g = Hypergraph::new();
        g.add_edge(&["Hub"], "r", &["Mid"], Provenance::default(), 1.0);
        g.add_edge(&["Mid"], "r", &["Far"], Provenance::default(), 1.0);
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = DiffusionConfig {
            diffusion_iterations: 20,
            diffusion_damping: 0.85,
            diffusion_top_k: 5,
            diffusion_results_per_seed: 5,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(insights.iter().any(|i| i.seeds.contains(&NodeId::from("far"))));
    }
}

//! Path ranking: top-degree node pairs with no direct co-occurrence, connected
//! instead through one or more short s-connected paths.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::config::PathRankConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::error::Result;
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::path::k_shortest_s_paths;
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &PathRankConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Insight>> {
    progress.start("path_ranking", None);

    let top_nodes: Vec<NodeId> = index
        .get_top_hubs(config.path_rank_max_seed_nodes)
        .iter()
        .map(|(id, _)| id.clone())
        .collect();

    let mut candidates: Vec<(NodeId, NodeId, Vec<EdgeId>, f64)> = Vec::new();
    let mut pairs_checked = 0usize;
    'outer: for i in 0..top_nodes.len() {
        for j in (i + 1)..top_nodes.len() {
            if pairs_checked >= config.path_rank_max_pairs {
                break 'outer;
            }
            pairs_checked += 1;
            let a = &top_nodes[i];
            let b = &top_nodes[j];
            if index.get_cooccurrence(a, b) != 0 {
                continue;
            }
            let (paths, found) = k_shortest_s_paths(
                store,
                a,
                b,
                config.path_rank_min_intersection,
                config.path_rank_k,
                config.path_rank_max_hops,
            )?;
            if !found {
                continue;
            }
            let path_score: f64 = paths.iter().map(|p| 1.0 / p.len() as f64).sum();
            if path_score < config.path_rank_min_score {
                continue;
            }
            let witness_edges: Vec<EdgeId> = paths
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if witness_edges.len() < config.path_rank_min_evidence_edges {
                continue;
            }
            candidates.push((a.clone(), b.clone(), witness_edges, path_score));
        }
    }

    candidates.sort_by(|x, y| {
        y.3.partial_cmp(&x.3)
            .unwrap()
            .then_with(|| (x.0.clone(), x.1.clone()).cmp(&(y.0.clone(), y.1.clone())))
    });
    candidates.truncate(config.path_rank_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (a, b, witness_edges, path_score) in candidates {
        let seeds = vec![a.clone(), b.clone()];
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
            id: ids.next(InsightType::PathRanking),
            insight_type: InsightType::PathRanking,
            seed_labels: vec![label_of(&a), label_of(&b)],
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes,
            seeds,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("path_score={path_score:.2}")],
            description: format!(
                "{} and {} connect through {:.2} worth of short paths with no direct co-occurrence",
                label_of(&a),
                label_of(&b),
                path_score
            ),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    Ok(insights)
}

//! Community links: cross-component node pairs with no co-occurrence but similar
//! relation-type signatures within their own component — candidate bridges between
//! otherwise disconnected communities.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;

use crate::config::CommunityLinksConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

struct ComponentInfo {
    top_nodes: Vec<NodeId>,
    node_relations: HashMap<NodeId, HashSet<String>>,
    node_edges: HashMap<NodeId, Vec<EdgeId>>,
}

fn component_info(store: &Hypergraph, edges: &[EdgeId], top_n: usize) -> ComponentInfo {
    let mut local_degree: HashMap<NodeId, usize> = HashMap::new();
    let mut node_relations: HashMap<NodeId, HashSet<String>> = HashMap::new();
    let mut node_edges: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
    for edge_id in edges {
        let Some(edge) = store.get_edge(edge_id) else { continue };
        for node in edge.all_nodes() {
            *local_degree.entry(node.clone()).or_insert(0) += 1;
            node_relations.entry(node.clone()).or_default().insert(edge.relation_lower());
            node_edges.entry(node.clone()).or_default().push(edge_id.clone());
        }
    }
    let mut ranked: Vec<(NodeId, usize)> = local_degree.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_n);
    ComponentInfo {
        top_nodes: ranked.into_iter().map(|(n, _)| n).collect(),
        node_relations,
        node_edges,
    }
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &CommunityLinksConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("community_links", None);

    let components = index.s_components_for(config.community_s_threshold);
    let infos: Vec<ComponentInfo> = components
        .iter()
        .map(|edges| component_info(store, edges, config.community_top_nodes_per_component))
        .collect();

    let mut candidates: Vec<(NodeId, NodeId, f64, Vec<EdgeId>)> = Vec::new();
    for ci in 0..infos.len() {
        for cj in (ci + 1)..infos.len() {
            for a in &infos[ci].top_nodes {
                for b in &infos[cj].top_nodes {
                    if index.get_cooccurrence(a, b) != 0 {
                        continue;
                    }
                    let sig_a = &infos[ci].node_relations[a];
                    let sig_b = &infos[cj].node_relations[b];
                    let intersection = sig_a.intersection(sig_b).count();
                    let union = sig_a.union(sig_b).count();
                    let overlap = if union == 0 { 0.0 } else { intersection as f64 / union as f64 };
                    if overlap > config.community_min_relation_overlap {
                        let mut witness_edges: Vec<EdgeId> = infos[ci]
                            .node_edges
                            .get(a)
                            .cloned()
                            .unwrap_or_default();
                        witness_edges.extend(infos[cj].node_edges.get(b).cloned().unwrap_or_default());
                        witness_edges.sort();
                        witness_edges.dedup();
                        candidates.push((a.clone(), b.clone(), overlap, witness_edges));
                    }
                }
            }
        }
    }

    candidates.sort_by(|x, y| {
        y.2.partial_cmp(&x.2)
            .unwrap()
            .then_with(|| (x.0.clone(), x.1.clone()).cmp(&(y.0.clone(), y.1.clone())))
    });
    candidates.truncate(config.community_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (a, b, overlap, witness_edges) in candidates {
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
            id: ids.next(InsightType::CommunityLink),
            insight_type: InsightType::CommunityLink,
            seed_labels: vec![label_of(&a), label_of(&b)],
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes,
            seeds,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("relation_overlap={overlap:.2}")],
            description: format!(
                "{} and {} share a {:.0}% relation-type overlap across disconnected communities",
                label_of(&a),
                label_of(&b),
                overlap * 100.0
            ),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    insights
}

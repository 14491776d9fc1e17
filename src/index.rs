//! The precomputed index: a derived, disk-persistable snapshot over a frozen store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::path::s_connected_components;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub created_utc: DateTime<Utc>,
    pub source_graph_path: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Snapshot of derived structures over a store, built once and consulted read-only by
/// every discovery operator. Not rebuilt automatically if the source store changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypergraphIndex {
    pub meta: IndexMeta,
    pub relation_to_edges: BTreeMap<String, Vec<EdgeId>>,
    pub label_to_nodes: BTreeMap<String, Vec<NodeId>>,
    /// Keyed by `s` as a string so the map round-trips cleanly through JSON.
    pub s_components: BTreeMap<String, Vec<Vec<EdgeId>>>,
    pub degree_ranked_nodes: Vec<(NodeId, usize)>,
    /// Pair key is `min(a,b)|max(a,b)` over normalized ids.
    pub entity_cooccurrence: HashMap<String, u64>,
}

fn cooccurrence_key(a: &NodeId, b: &NodeId) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

impl HypergraphIndex {
    /// Build the full index from a store in one pass, per the configured `s_values`.
    /// `source_graph_path` is recorded for provenance only; staleness is never
    /// detected, callers must rebuild when the graph changes.
    pub fn build(store: &Hypergraph, s_values: &[u32], source_graph_path: impl Into<String>) -> Self {
        let mut relation_to_edges: BTreeMap<String, Vec<EdgeId>> = BTreeMap::new();
        let mut entity_cooccurrence: HashMap<String, u64> = HashMap::new();

        for edge in store.edges() {
            relation_to_edges
                .entry(edge.relation_lower())
                .or_default()
                .push(edge.id.clone());
            let nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
            for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    *entity_cooccurrence
                        .entry(cooccurrence_key(&nodes[i], &nodes[j]))
                        .or_insert(0) += 1;
                }
            }
        }
        for edges in relation_to_edges.values_mut() {
            edges.sort();
        }

        let mut label_to_nodes: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for node in store.nodes() {
            label_to_nodes
                .entry(node.label.to_lowercase())
                .or_default()
                .push(node.id.clone());
        }
        for nodes in label_to_nodes.values_mut() {
            nodes.sort();
        }

        let mut s_components: BTreeMap<String, Vec<Vec<EdgeId>>> = BTreeMap::new();
        for &s in s_values {
            let mut components = s_connected_components(store, s);
            for component in &mut components {
                component.sort();
            }
            components.sort();
            s_components.insert(s.to_string(), components);
        }

        let mut degree_ranked_nodes: Vec<(NodeId, usize)> = store
            .nodes()
            .map(|n| (n.id.clone(), n.degree()))
            .collect();
        degree_ranked_nodes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let index = Self {
            meta: IndexMeta {
                created_utc: Utc::now(),
                source_graph_path: source_graph_path.into(),
                node_count: store.node_count(),
                edge_count: store.edge_count(),
            },
            relation_to_edges,
            label_to_nodes,
            s_components,
            degree_ranked_nodes,
            entity_cooccurrence,
        };

        info!(
            nodes = index.meta.node_count,
            edges = index.meta.edge_count,
            relations = index.relation_to_edges.len(),
            "Built hypergraph index"
        );

        index
    }

    /// The degree-ranked node list, truncated to `cap` entries — used when writing to
    /// disk; the in-memory `degree_ranked_nodes` keeps the full ranking.
    pub fn degree_ranked_for_disk(&self, cap: usize) -> &[(NodeId, usize)] {
        let len = self.degree_ranked_nodes.len().min(cap);
        &self.degree_ranked_nodes[..len]
    }

    /// The co-occurrence map truncated to the top `cap` entries by count, ties broken
    /// by key — used when writing to disk; a reload therefore loses long-tail counts.
    pub fn cooccurrence_for_disk(&self, cap: usize) -> BTreeMap<String, u64> {
        let mut entries: Vec<(&String, &u64)> = self.entity_cooccurrence.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .take(cap)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    pub fn get_cooccurrence(&self, a: &NodeId, b: &NodeId) -> u64 {
        self.entity_cooccurrence
            .get(&cooccurrence_key(a, b))
            .copied()
            .unwrap_or(0)
    }

    pub fn get_top_hubs(&self, n: usize) -> &[(NodeId, usize)] {
        let len = self.degree_ranked_nodes.len().min(n);
        &self.degree_ranked_nodes[..len]
    }

    /// Node ids whose lowercased label starts with `prefix` (case-insensitive).
    pub fn find_nodes_by_prefix(&self, prefix: &str) -> Vec<NodeId> {
        let prefix = prefix.to_lowercase();
        let mut found = Vec::new();
        for (label, nodes) in &self.label_to_nodes {
            if label.starts_with(&prefix) {
                found.extend(nodes.iter().cloned());
            }
        }
        found.sort();
        found.dedup();
        found
    }

    pub fn edges_for_relation(&self, relation: &str) -> &[EdgeId] {
        self.relation_to_edges
            .get(&relation.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn s_components_for(&self, s: u32) -> &[Vec<EdgeId>] {
        self.s_components
            .get(&s.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    fn two_triangle_graph() -> Hypergraph {
        let mut g = Hypergraph::new();
        g.add_edge(&["A", "B"], "rel1", &["C"], Provenance::default(), 1.0);
        g.add_edge(&["C"], "rel2", &["D", "E"], Provenance::default(), 1.0);
        g.add_edge(&["B", "E"], "rel3", &["F"], Provenance::default(), 1.0);
        g
    }

    #[test]
    fn degree_ranking_matches_store_degrees() {
        let g = two_triangle_graph();
        let idx = HypergraphIndex::build(&g, &[2, 3, 4], "test.json");
        let b_degree = idx
            .degree_ranked_nodes
            .iter()
            .find(|(id, _)| *id == NodeId::from("b"))
            .unwrap()
            .1;
        assert_eq!(b_degree, 2);
    }

    #[test]
    fn cooccurrence_counts_shared_edges() {
        let g = two_triangle_graph();
        let idx = HypergraphIndex::build(&g, &[2], "test.json");
        assert_eq!(idx.get_cooccurrence(&NodeId::from("a"), &NodeId::from("b")), 1);
        assert_eq!(idx.get_cooccurrence(&NodeId::from("a"), &NodeId::from("f")), 0);
    }

    #[test]
    fn cooccurrence_key_is_order_independent() {
        assert_eq!(
            cooccurrence_key(&NodeId::from("a"), &NodeId::from("b")),
            cooccurrence_key(&NodeId::from("b"), &NodeId::from("a"))
        );
    }

    #[test]
    fn disk_cap_truncates_by_count() {
        let g = two_triangle_graph();
        let idx = HypergraphIndex::build(&g, &[2], "test.json");
        let capped = idx.cooccurrence_for_disk(1);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn prefix_lookup_is_case_insensitive() {
        let g = two_triangle_graph();
        let idx = HypergraphIndex::build(&g, &[2], "test.json");
        let found = idx.find_nodes_by_prefix("A");
        assert!(found.contains(&NodeId::from("a")));
    }

    #[test]
    fn s_components_are_sorted_and_cached_per_s() {
        let g = two_triangle_graph();
        let idx = HypergraphIndex::build(&g, &[1, 2], "test.json");
        assert_eq!(idx.s_components_for(1).len(), 1);
        assert_eq!(idx.s_components_for(2).len(), 3);
    }
}

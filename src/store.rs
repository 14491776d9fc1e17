//! The hypergraph store: owns nodes and directed hyperedges, maintains the
//! node→incident-edges index, deduplicates, and supports merging another store in.

use std::collections::{BTreeSet, HashMap};

use tracing::info;

use crate::error::{Result, StoreError};
use crate::normalize::normalize_id;
use crate::types::{EdgeId, HyperEdge, Node, NodeId, Provenance};
use crate::util::UnionFind;

/// Owns the node and edge maps. Mutated monotonically during ingestion; treated as
/// immutable once handed to [`crate::index::HypergraphIndex::build`].
#[derive(Debug, Default)]
pub struct Hypergraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, HyperEdge>,
    next_edge_seq: u64,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_edge(&self, id: &EdgeId) -> Option<&HyperEdge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &HyperEdge> {
        self.edges.values()
    }

    pub fn incident_edges(&self, node_id: &NodeId) -> &[EdgeId] {
        self.nodes
            .get(node_id)
            .map(|n| n.incident_edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn degree(&self, node_id: &NodeId) -> usize {
        self.incident_edges(node_id).len()
    }

    fn next_edge_id(&mut self) -> EdgeId {
        loop {
            self.next_edge_seq += 1;
            let candidate = EdgeId::from(format!("e{:06}", self.next_edge_seq));
            if !self.edges.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Advances the edge-id counter to at least the maximum numeric suffix among
    /// currently loaded edges, so ids minted after a bulk load never collide with
    /// high-numbered loaded ids. Called by loaders after inserting edges via
    /// `insert_edge_raw`.
    pub fn resync_edge_id_counter(&mut self) {
        let max_seq = self
            .edges
            .keys()
            .filter_map(|id| id.as_ref().strip_prefix('e'))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        if max_seq > self.next_edge_seq {
            self.next_edge_seq = max_seq;
        }
    }

    /// Insert a node with the given normalized id if absent, recording `label` as its
    /// display label the first time it's seen.
    fn ensure_node(&mut self, label: &str) -> NodeId {
        let id = normalize_id(label);
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| Node::new(id.clone(), label.trim()));
        id
    }

    /// Add a directed hyperedge from raw labels, creating any missing nodes.
    /// Returns the generated edge id.
    pub fn add_edge(
        &mut self,
        sources: &[&str],
        relation: &str,
        targets: &[&str],
        provenance: Provenance,
        confidence: f64,
    ) -> EdgeId {
        let source_ids: Vec<NodeId> = sources.iter().map(|s| self.ensure_node(s)).collect();
        let target_ids: Vec<NodeId> = targets.iter().map(|t| self.ensure_node(t)).collect();
        let id = self.next_edge_id();
        self.insert_edge_raw(HyperEdge {
            id: id.clone(),
            sources: source_ids,
            relation: relation.to_string(),
            targets: target_ids,
            properties: HashMap::new(),
            provenance,
            confidence,
            last_updated: chrono::Utc::now(),
        })
    }

    /// Insert an already-constructed node, preserving its label/properties/embedding.
    /// Used by subgraph extraction to avoid losing display labels to `insert_edge_raw`'s
    /// id-as-label fallback. A no-op if the node id is already present.
    pub fn insert_node_raw(&mut self, mut node: Node) -> NodeId {
        let id = node.id.clone();
        node.incident_edges.clear();
        self.nodes.entry(id.clone()).or_insert(node);
        id
    }

    /// Insert an already-constructed edge (used by the loader and by `merge`). Creates
    /// any referenced node ids that don't yet exist, using the node id itself as label.
    pub fn insert_edge_raw(&mut self, edge: HyperEdge) -> EdgeId {
        let id = edge.id.clone();
        for node_id in edge.all_nodes() {
            self.nodes
                .entry(node_id.clone())
                .or_insert_with(|| Node::new(node_id.clone(), node_id.0.clone()));
        }
        for node_id in edge.all_nodes() {
            let node = self.nodes.get_mut(&node_id).expect("just ensured");
            if !node.incident_edges.contains(&id) {
                node.incident_edges.push(id.clone());
            }
        }
        self.edges.insert(id.clone(), edge);
        id
    }

    /// Remove an edge by id. Reciprocally updates every participating node's incident
    /// list. No-op if the id doesn't exist.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<HyperEdge> {
        let edge = self.edges.remove(id)?;
        for node_id in edge.all_nodes() {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.incident_edges.retain(|e| e != id);
            }
        }
        Some(edge)
    }

    /// Remove a node and all its incident edges.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        for edge_id in node.incident_edges.clone() {
            self.remove_edge(&edge_id);
        }
        Some(node)
    }

    /// Validate the node/incident-edge invariants.
    pub fn check_invariants(&self) -> Result<()> {
        for edge in self.edges.values() {
            for node_id in edge.all_nodes() {
                let node = self.nodes.get(&node_id).ok_or_else(|| StoreError::DanglingReference {
                    edge: edge.id.to_string(),
                    node: node_id.to_string(),
                })?;
                let count = node.incident_edges.iter().filter(|e| **e == edge.id).count();
                if count != 1 {
                    return Err(StoreError::DanglingReference {
                        edge: edge.id.to_string(),
                        node: node_id.to_string(),
                    }
                    .into());
                }
            }
        }
        for node in self.nodes.values() {
            for edge_id in &node.incident_edges {
                let edge = self
                    .edges
                    .get(edge_id)
                    .ok_or_else(|| StoreError::EdgeNotFound(edge_id.to_string()))?;
                if !edge.contains_node(&node.id) {
                    return Err(StoreError::DanglingReference {
                        edge: edge_id.to_string(),
                        node: node.id.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Remove edges where `set(sources) == set(targets)`. Returns count removed.
    pub fn remove_self_loops(&mut self) -> usize {
        let loop_ids: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.is_self_loop())
            .map(|e| e.id.clone())
            .collect();
        for id in &loop_ids {
            self.remove_edge(id);
        }
        loop_ids.len()
    }

    /// Collapse edges with identical (relation, sorted-sources, sorted-targets) down to
    /// one representative. Returns count removed.
    pub fn merge_duplicate_edges(&mut self) -> usize {
        let mut seen: HashMap<(String, Vec<NodeId>, Vec<NodeId>), EdgeId> = HashMap::new();
        let mut to_remove = Vec::new();
        let mut ids: Vec<EdgeId> = self.edges.keys().cloned().collect();
        ids.sort();
        for id in ids {
            let edge = &self.edges[&id];
            let key = edge.dedup_key();
            if seen.contains_key(&key) {
                to_remove.push(id);
            } else {
                seen.insert(key, id);
            }
        }
        let removed = to_remove.len();
        for id in to_remove {
            self.remove_edge(&id);
        }
        removed
    }

    /// Build a similarity graph over nodes with embeddings (cosine similarity >=
    /// `threshold`), then for each connected component keep the highest-degree node
    /// (ties broken lexicographically by id) and re-home all incident edges from the
    /// rest.
    pub fn merge_similar_nodes(&mut self, threshold: f32) -> usize {
        let embedded: Vec<(NodeId, Vec<f32>)> = self
            .nodes
            .values()
            .filter_map(|n| n.embedding.clone().map(|e| (n.id.clone(), e)))
            .collect();

        let mut uf: UnionFind<NodeId> = UnionFind::new();
        for (id, _) in &embedded {
            uf.add(id);
        }
        for i in 0..embedded.len() {
            for j in (i + 1)..embedded.len() {
                let sim = cosine_similarity(&embedded[i].1, &embedded[j].1);
                if sim >= threshold {
                    uf.union(&embedded[i].0, &embedded[j].0);
                }
            }
        }

        let mut merged_count = 0;
        for component in uf.components() {
            if component.len() < 2 {
                continue;
            }
            let keep = component
                .iter()
                .max_by(|a, b| {
                    let da = self.degree(a);
                    let db = self.degree(b);
                    da.cmp(&db).then_with(|| b.cmp(a)) // tie-break: smaller (lexicographic) id wins
                })
                .cloned()
                .unwrap();
            for other in component {
                if other != keep {
                    self.rehome_node(&other, &keep);
                    merged_count += 1;
                }
            }
        }
        merged_count
    }

    /// Re-point every incident edge of `from` to `to`, then drop `from`.
    fn rehome_node(&mut self, from: &NodeId, to: &NodeId) {
        let Some(from_node) = self.nodes.remove(from) else {
            return;
        };
        for edge_id in from_node.incident_edges {
            if let Some(edge) = self.edges.get_mut(&edge_id) {
                for s in &mut edge.sources {
                    if s == from {
                        *s = to.clone();
                    }
                }
                for t in &mut edge.targets {
                    if t == from {
                        *t = to.clone();
                    }
                }
            }
            if let Some(to_node) = self.nodes.get_mut(to) {
                if !to_node.incident_edges.contains(&edge_id) {
                    to_node.incident_edges.push(edge_id);
                }
            }
        }
    }

    /// Fold `other` into `self`: nodes are unioned by normalized id, edges are
    /// re-homed, colliding edge ids are re-generated.
    pub fn merge(&mut self, other: &Hypergraph, deduplicate: bool) {
        for node in other.nodes.values() {
            self.nodes.entry(node.id.clone()).or_insert_with(|| {
                let mut n = Node::new(node.id.clone(), node.label.clone());
                n.embedding = node.embedding.clone();
                n.properties = node.properties.clone();
                n
            });
        }
        for edge in other.edges.values() {
            let mut incoming = edge.clone();
            if self.edges.contains_key(&incoming.id) {
                incoming.id = self.next_edge_id();
            }
            self.insert_edge_raw(incoming);
        }
        if deduplicate {
            self.merge_duplicate_edges();
        }
        info!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Merged hypergraph store"
        );
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= 1e-10 || norm_b <= 1e-10 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_triangle() -> Hypergraph {
        // A,B --rel1--> C ; C --rel2--> D,E ; B,E --rel3--> F
        let mut g = Hypergraph::new();
        g.add_edge(&["A", "B"], "rel1", &["C"], Provenance::default(), 1.0);
        g.add_edge(&["C"], "rel2", &["D", "E"], Provenance::default(), 1.0);
        g.add_edge(&["B", "E"], "rel3", &["F"], Provenance::default(), 1.0);
        g
    }

    #[test]
    fn degree_matches_incident_count() {
        let g = store_with_triangle();
        assert_eq!(g.degree(&NodeId::from("b")), 2);
        assert_eq!(g.degree(&NodeId::from("c")), 2);
        assert_eq!(g.degree(&NodeId::from("e")), 2);
        g.check_invariants().unwrap();
    }

    #[test]
    fn remove_node_cascades_to_edges() {
        let mut g = store_with_triangle();
        let edges_before = g.edge_count();
        g.remove_node(&NodeId::from("c"));
        assert_eq!(g.edge_count(), edges_before - 2);
        g.check_invariants().unwrap();
    }

    #[test]
    fn self_loop_removal_decrements_degree_and_count() {
        let mut g = Hypergraph::new();
        g.add_edge(&["X"], "r", &["X"], Provenance::default(), 1.0);
        let before_edges = g.edge_count();
        let before_degree = g.degree(&NodeId::from("x"));
        let removed = g.remove_self_loops();
        assert_eq!(removed, 1);
        assert_eq!(g.edge_count(), before_edges - 1);
        assert_eq!(g.degree(&NodeId::from("x")), before_degree - 1);
        for e in g.edges() {
            assert!(!e.is_self_loop());
        }
    }

    #[test]
    fn duplicate_edges_collapse_to_one() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A", "B"], "r", &["C"], Provenance::default(), 1.0);
        g.add_edge(&["A", "B"], "r", &["C"], Provenance::default(), 1.0);
        assert_eq!(g.edge_count(), 2);
        let removed = g.merge_duplicate_edges();
        assert_eq!(removed, 1);
        assert_eq!(g.edge_count(), 1);
        let remaining_id = g.edges().next().unwrap().id.clone();
        assert_eq!(g.incident_edges(&NodeId::from("a")).iter().filter(|e| **e == remaining_id).count(), 1);
        g.check_invariants().unwrap();
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A"], "r", &["B"], Provenance::default(), 1.0);
        g.add_edge(&["A"], "r", &["B"], Provenance::default(), 1.0);
        g.merge_duplicate_edges();
        let count_after_first = g.edge_count();
        let removed_second = g.merge_duplicate_edges();
        assert_eq!(removed_second, 0);
        assert_eq!(g.edge_count(), count_after_first);
    }

    #[test]
    fn merge_similar_nodes_keeps_highest_degree() {
        let mut g = Hypergraph::new();
        g.add_edge(&["Alpha"], "r", &["Beta"], Provenance::default(), 1.0);
        g.add_edge(&["Alpha"], "r", &["Gamma"], Provenance::default(), 1.0);
        g.add_edge(&["Beta"], "r", &["Delta"], Provenance::default(), 1.0);
        {
            let alpha = NodeId::from("alpha");
            let beta = NodeId::from("beta");
            g.nodes.get_mut(&alpha).unwrap().embedding = Some(vec![1.0, 0.0]);
            g.nodes.get_mut(&beta).unwrap().embedding = Some(vec![1.0, 0.0001]);
        }
        let merged = g.merge_similar_nodes(0.99);
        assert_eq!(merged, 1);
        // alpha has degree 2, beta has degree 2 (beta->delta, alpha->beta originally) -- alpha wins lexicographically on tie
        assert!(g.get_node(&NodeId::from("alpha")).is_some() || g.get_node(&NodeId::from("beta")).is_some());
        g.check_invariants().unwrap();
    }

    #[test]
    fn merge_stores_rehomes_and_regenerates_colliding_ids() {
        let mut g1 = Hypergraph::new();
        g1.add_edge(&["A"], "r", &["B"], Provenance::default(), 1.0);
        let mut g2 = Hypergraph::new();
        g2.add_edge(&["A"], "r", &["B"], Provenance::default(), 1.0);
        // Force an id collision between the two stores.
        let g2_edge_id = g2.edges().next().unwrap().id.clone();
        let mut forced = HyperEdge {
            id: g1.edges().next().unwrap().id.clone(),
            ..g2.get_edge(&g2_edge_id).unwrap().clone()
        };
        forced.relation = "r2".to_string();
        g2.edges.clear();
        g2.insert_edge_raw(forced);

        g1.merge(&g2, false);
        assert_eq!(g1.edge_count(), 2);
        g1.check_invariants().unwrap();
    }
}

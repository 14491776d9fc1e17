//! Read-only structural statistics over a [`Hypergraph`] — pure derivations from the
//! store that cost little to compute and round out a complete analysis surface.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::store::Hypergraph;
use crate::types::NodeId;

/// Structural summary of a hypergraph: size, edge/degree distributions, pairwise
/// overlap histogram, and an optional power-law fit over the degree distribution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HypergraphStatistics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub num_duplicate_edges: usize,

    pub avg_edge_size: f64,
    pub max_edge_size: usize,
    pub min_edge_size: usize,

    pub avg_node_degree: f64,
    pub max_node_degree: usize,
    pub min_node_degree: usize,

    pub max_edge_intersection: usize,
    pub num_pairs_overlap_1: usize,
    pub num_pairs_overlap_2: usize,
    pub num_pairs_overlap_3: usize,

    pub power_law_exponent: Option<f64>,
    pub power_law_r_squared: Option<f64>,
}

/// Pairwise edge-intersection sampling is capped at this many edges (taken in id
/// order) to keep `compute_statistics` sub-quadratic on large graphs.
const MAX_EDGES_FOR_PAIRWISE_OVERLAP: usize = 2_000;

impl Hypergraph {
    pub fn compute_statistics(&self) -> HypergraphStatistics {
        let num_nodes = self.node_count();
        let num_edges = self.edge_count();

        let mut dedup_keys: HashMap<(String, Vec<NodeId>, Vec<NodeId>), usize> = HashMap::new();
        let mut edge_sizes = Vec::with_capacity(num_edges);
        for edge in self.edges() {
            edge_sizes.push(edge.size());
            *dedup_keys.entry(edge.dedup_key()).or_insert(0) += 1;
        }
        let num_duplicate_edges = dedup_keys.values().filter(|&&count| count > 1).map(|&count| count - 1).sum();

        let (avg_edge_size, max_edge_size, min_edge_size) = summarize(&edge_sizes);

        let degrees: Vec<usize> = self.nodes().map(|n| self.degree(&n.id)).collect();
        let (avg_node_degree, max_node_degree, min_node_degree) = summarize(&degrees);

        let (max_edge_intersection, num_pairs_overlap_1, num_pairs_overlap_2, num_pairs_overlap_3) =
            pairwise_overlap_histogram(self);

        let (power_law_exponent, power_law_r_squared) = fit_power_law(&degrees).unzip();

        HypergraphStatistics {
            num_nodes,
            num_edges,
            num_duplicate_edges,
            avg_edge_size,
            max_edge_size,
            min_edge_size,
            avg_node_degree,
            max_node_degree,
            min_node_degree,
            max_edge_intersection,
            num_pairs_overlap_1,
            num_pairs_overlap_2,
            num_pairs_overlap_3,
            power_law_exponent,
            power_law_r_squared,
        }
    }

    /// Fraction of hyperedges fully contained within the "rich club" of nodes whose
    /// degree exceeds `degree_threshold`, normalized by the club's maximum possible
    /// pairwise connections.
    pub fn rich_club_coefficient(&self, degree_threshold: usize) -> f64 {
        let rich: HashSet<NodeId> = self
            .nodes()
            .filter(|n| self.degree(&n.id) > degree_threshold)
            .map(|n| n.id.clone())
            .collect();
        if rich.len() < 2 {
            return 0.0;
        }
        let internal_edges = self
            .edges()
            .filter(|e| e.all_nodes().iter().all(|n| rich.contains(n)))
            .count();
        let k = rich.len() as f64;
        internal_edges as f64 / (k * (k - 1.0) / 2.0)
    }

    /// For each of the `top_k` highest-degree nodes, how many of the *other* top-k
    /// hubs it co-occurs with in at least one edge — a measure of how tightly the hub
    /// set is itself interconnected.
    pub fn hub_integration_scores(&self, top_k: usize) -> HashMap<NodeId, usize> {
        let mut ranked: Vec<(NodeId, usize)> = self.nodes().map(|n| (n.id.clone(), self.degree(&n.id))).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_k);
        let hubs: Vec<NodeId> = ranked.into_iter().map(|(id, _)| id).collect();
        let hub_set: HashSet<NodeId> = hubs.iter().cloned().collect();

        let mut scores: HashMap<NodeId, HashSet<NodeId>> = hubs.iter().map(|h| (h.clone(), HashSet::new())).collect();
        for edge in self.edges() {
            let participants: Vec<NodeId> = edge.all_nodes().into_iter().filter(|n| hub_set.contains(n)).collect();
            for a in &participants {
                for b in &participants {
                    if a != b {
                        scores.get_mut(a).unwrap().insert(b.clone());
                    }
                }
            }
        }
        scores.into_iter().map(|(k, v)| (k, v.len())).collect()
    }

    /// Induced subgraph over `node_ids`: every edge whose full participant set is
    /// contained in `node_ids`, plus those nodes only.
    pub fn extract_subgraph(&self, node_ids: &HashSet<NodeId>) -> Hypergraph {
        let mut sub = Hypergraph::new();
        for id in node_ids {
            if let Some(node) = self.get_node(id) {
                sub.insert_node_raw(node.clone());
            }
        }
        for edge in self.edges() {
            if edge.all_nodes().iter().all(|n| node_ids.contains(n)) {
                sub.insert_edge_raw(edge.clone());
            }
        }
        sub
    }
}

fn summarize(values: &[usize]) -> (f64, usize, usize) {
    if values.is_empty() {
        return (0.0, 0, 0);
    }
    let sum: usize = values.iter().sum();
    let avg = sum as f64 / values.len() as f64;
    let max = *values.iter().max().unwrap();
    let min = *values.iter().min().unwrap();
    (avg, max, min)
}

fn pairwise_overlap_histogram(store: &Hypergraph) -> (usize, usize, usize, usize) {
    let edges: Vec<HashSet<NodeId>> = store
        .edges()
        .take(MAX_EDGES_FOR_PAIRWISE_OVERLAP)
        .map(|e| e.all_nodes().into_iter().collect())
        .collect();
    let mut max_intersection = 0;
    let mut overlap_1 = 0;
    let mut overlap_2 = 0;
    let mut overlap_3 = 0;
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let shared = edges[i].intersection(&edges[j]).count();
            if shared == 0 {
                continue;
            }
            max_intersection = max_intersection.max(shared);
            if shared >= 1 {
                overlap_1 += 1;
            }
            if shared >= 2 {
                overlap_2 += 1;
            }
            if shared >= 3 {
                overlap_3 += 1;
            }
        }
    }
    (max_intersection, overlap_1, overlap_2, overlap_3)
}

/// Least-squares fit of `log(frequency) = -exponent * log(degree) + c` over the degree
/// distribution's non-zero buckets. Returns `None` when fewer than two distinct
/// non-zero degrees are present (an underdetermined fit).
fn fit_power_law(degrees: &[usize]) -> Option<(f64, f64)> {
    let mut frequency: HashMap<usize, usize> = HashMap::new();
    for &d in degrees {
        if d > 0 {
            *frequency.entry(d).or_insert(0) += 1;
        }
    }
    if frequency.len() < 2 {
        return None;
    }
    let points: Vec<(f64, f64)> = frequency
        .into_iter()
        .map(|(d, f)| ((d as f64).ln(), (f as f64).ln()))
        .collect();
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();
    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < 1e-10 {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = points.iter().map(|(x, y)| (y - (slope * x + intercept)).powi(2)).sum();
    let r_squared = if ss_tot.abs() < 1e-10 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Some((-slope, r_squared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    fn star_graph() -> Hypergraph {
        let mut g = Hypergraph::new();
        for leaf in ["B", "C", "D"] {
            g.add_edge(&["A"], "link", &[leaf], Provenance::default(), 1.0);
        }
        g
    }

    #[test]
    fn statistics_reflect_degree_and_size() {
        let g = star_graph();
        let stats = g.compute_statistics();
        assert_eq!(stats.num_nodes, 4);
        assert_eq!(stats.num_edges, 3);
        assert_eq!(stats.max_edge_size, 2);
        assert_eq!(stats.max_node_degree, 3);
    }

    #[test]
    fn rich_club_is_zero_with_fewer_than_two_hubs() {
        let g = star_graph();
        assert_eq!(g.rich_club_coefficient(2), 0.0);
    }

    #[test]
    fn hub_integration_counts_pairwise_cooccurrence_within_the_hub_set() {
        let g = star_graph();
        let scores = g.hub_integration_scores(4);
        assert_eq!(scores[&NodeId::from("a")], 3);
        assert_eq!(scores[&NodeId::from("b")], 1);
    }

    #[test]
    fn extract_subgraph_keeps_only_fully_contained_edges() {
        let g = star_graph();
        let subset: HashSet<NodeId> = [NodeId::from("a"), NodeId::from("b")].into_iter().collect();
        let sub = g.extract_subgraph(&subset);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.node_count(), 2);
    }

    #[test]
    fn power_law_fit_needs_at_least_two_distinct_degrees() {
        let mut g = Hypergraph::new();
        g.add_edge(&["A"], "r", &["B"], Provenance::default(), 1.0);
        let stats = g.compute_statistics();
        assert!(stats.power_law_exponent.is_none());
    }
}

use std::collections::HashSet;

use hypergraph_core::discovery::{embedding, motifs};
use hypergraph_core::discovery::{score, IdAllocator};
use hypergraph_core::index::HypergraphIndex;
use hypergraph_core::io;
use hypergraph_core::path::{s_connected_components, shortest_s_path};
use hypergraph_core::progress::NoopReporter;
use hypergraph_core::config::{EmbeddingConfig, MotifsConfig};
use hypergraph_core::store::Hypergraph;
use hypergraph_core::types::{NodeId, Provenance};

fn two_triangle_graph() -> Hypergraph {
    let mut g = Hypergraph::new();
    g.add_edge(&["A", "B"], "rel1", &["C"], Provenance::default(), 1.0);
    g.add_edge(&["C"], "rel2", &["D", "E"], Provenance::default(), 1.0);
    g.add_edge(&["B", "E"], "rel3", &["F"], Provenance::default(), 1.0);
    g
}

#[test]
fn two_triangle_graph_has_expected_degrees_path_and_component() {
    let g = two_triangle_graph();
    assert_eq!(g.degree(&NodeId::from("b")), 2);
    assert_eq!(g.degree(&NodeId::from("c")), 2);
    assert_eq!(g.degree(&NodeId::from("e")), 2);

    let path = shortest_s_path(&g, &NodeId::from("a"), &NodeId::from("f"), 1).unwrap();
    assert!(path.found);
    assert_eq!(path.edges.len(), 3);

    let components = s_connected_components(&g, 1);
    assert_eq!(components.len(), 1);
    let all_nodes: HashSet<NodeId> = components[0]
        .iter()
        .filter_map(|e| g.get_edge(e))
        .flat_map(|e| e.all_nodes())
        .collect();
    assert_eq!(all_nodes.len(), 6);
}

#[test]
fn self_loop_removal_drops_exactly_one_edge_and_one_degree() {
    let mut g = Hypergraph::new();
    g.add_edge(&["X"], "r", &["X"], Provenance::default(), 1.0);
    let edges_before = g.edge_count();
    let degree_before = g.degree(&NodeId::from("x"));

    let removed = g.remove_self_loops();

    assert_eq!(removed, 1);
    assert_eq!(g.edge_count(), edges_before - 1);
    assert_eq!(g.degree(&NodeId::from("x")), degree_before - 1);
}

#[test]
fn duplicate_edges_collapse_to_a_single_id() {
    let mut g = Hypergraph::new();
    g.add_edge(&["A", "B"], "r", &["C"], Provenance::default(), 1.0);
    g.add_edge(&["A", "B"], "r", &["C"], Provenance::default(), 1.0);
    let edges_before = g.edge_count();

    let removed = g.merge_duplicate_edges();

    assert_eq!(removed, 1);
    assert_eq!(g.edge_count(), edges_before - 1);
    let remaining: Vec<_> = g.edges().collect();
    assert_eq!(remaining.len(), 1);
    let incident = g.incident_edges(&NodeId::from("a"));
    assert_eq!(incident.len(), 1);
}

#[test]
fn motif_lift_below_threshold_is_not_emitted() {
    let g = two_triangle_graph();
    let index = HypergraphIndex::build(&g, &[2, 3], "test.json");
    let config = MotifsConfig::default();
    let mut ids = IdAllocator::new("run1");
    let insights = motifs::run(&g, &index, &config, &mut ids, &NoopReporter);

    let b = NodeId::from("b");
    let e = NodeId::from("e");
    assert!(!insights
        .iter()
        .any(|i| i.seeds.contains(&b) && i.seeds.contains(&e)));
}

#[test]
fn completion_surfaces_the_growing_third_entity_set() {
    let mut g = two_triangle_graph();
    g.add_edge(&["A", "B"], "r", &["D"], Provenance::default(), 1.0);
    g.add_edge(&["A", "B"], "r", &["E"], Provenance::default(), 1.0);
    let index = HypergraphIndex::build(&g, &[2, 3], "test.json");
    let config = hypergraph_core::config::CompletionsConfig::default();
    let mut ids = IdAllocator::new("run1");
    let insights = hypergraph_core::discovery::completions::run(&g, &index, &config, &mut ids, &NoopReporter);

    let a = NodeId::from("a");
    let b = NodeId::from("b");
    let hit = insights.iter().find(|i| i.seeds.contains(&a) && i.seeds.contains(&b));
    assert!(hit.is_some());
    let third: HashSet<String> = hit.unwrap().novelty_tags.iter().cloned().collect();
    assert!(third.len() >= 2);
}

#[test]
fn transe_is_reproducible_for_a_fixed_seed_and_config() {
    let mut g = Hypergraph::new();
    g.add_edge(&["Ann"], "coauthor", &["Bo"], Provenance::default(), 1.0);
    g.add_edge(&["Bo"], "coauthor", &["Cy"], Provenance::default(), 1.0);
    g.add_edge(&["Cy"], "coauthor", &["Dee"], Provenance::default(), 1.0);
    let index = HypergraphIndex::build(&g, &[2], "test.json");
    let config = EmbeddingConfig {
        embedding_dim: 8,
        embedding_epochs: 3,
        embedding_min_neighbor_overlap: 0.0,
        embedding_min_score: 0.0,
        embedding_min_evidence_edges: 0,
        ..EmbeddingConfig::default()
    };

    let mut ids_a = IdAllocator::new("run1");
    let mut ids_b = IdAllocator::new("run1");
    let a = embedding::run(&g, &index, &config, 42, &mut ids_a, &NoopReporter);
    let b = embedding::run(&g, &index, &config, 42, &mut ids_b, &NoopReporter);

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.seeds, y.seeds);
        assert!((x.score - y.score).abs() < 1e-6);
    }
}

#[test]
fn json_round_trip_preserves_node_and_edge_counts() {
    let g = two_triangle_graph();
    let json = io::hypergraph_to_json(&g).unwrap();
    let back = io::hypergraph_from_json(&json).unwrap();
    assert_eq!(back.node_count(), g.node_count());
    assert_eq!(back.edge_count(), g.edge_count());
}

#[test]
fn score_components_are_finite_on_an_empty_seed_set() {
    let g = Hypergraph::new();
    let index = HypergraphIndex::build(&g, &[2], "test.json");
    let (breakdown, final_score) = score::score(&[], 0, &g, &index);
    assert!(breakdown.support.is_finite());
    assert!(breakdown.novelty.is_finite());
    assert!(breakdown.specificity.is_finite());
    assert!(final_score.is_finite());
}

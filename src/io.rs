//! JSON codecs for the graph, index, and insight collection, plus DOT and
//! incidence-matrix export.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{IoError, Result, StoreError};
use crate::index::HypergraphIndex;
use crate::insight::InsightCollection;
use crate::store::Hypergraph;
use crate::types::{EdgeId, HyperEdge, Node};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct GraphMeta {
    #[serde(default)]
    node_count: usize,
    #[serde(default)]
    edge_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    meta: GraphMeta,
    nodes: Vec<Node>,
    edges: Vec<HyperEdge>,
}

/// Serializes a store to the external `{meta, nodes, edges}` JSON shape, nodes and
/// edges sorted by id for deterministic output.
pub fn hypergraph_to_json(store: &Hypergraph) -> Result<String> {
    let mut nodes: Vec<Node> = store.nodes().cloned().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    let mut edges: Vec<HyperEdge> = store.edges().cloned().collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    let doc = GraphDocument {
        meta: GraphMeta {
            node_count: nodes.len(),
            edge_count: edges.len(),
        },
        nodes,
        edges,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| IoError::Json(e).into())
}

/// Parses the `{meta, nodes, edges}` JSON shape into a fresh store. Fails on a
/// duplicate edge id or a dangling node reference — both are invalid-input conditions.
pub fn hypergraph_from_json(text: &str) -> Result<Hypergraph> {
    let doc: GraphDocument = serde_json::from_str(text).map_err(IoError::Json)?;
    let mut store = Hypergraph::new();
    for node in doc.nodes {
        store.insert_node_raw(node);
    }
    let mut seen: HashSet<EdgeId> = HashSet::new();
    for edge in doc.edges {
        if !seen.insert(edge.id.clone()) {
            return Err(StoreError::DuplicateEdgeId(edge.id.to_string()).into());
        }
        store.insert_edge_raw(edge);
    }
    store.resync_edge_id_counter();
    store.check_invariants()?;
    info!(nodes = store.node_count(), edges = store.edge_count(), "loaded hypergraph from json");
    Ok(store)
}

/// Serializes a precomputed index to JSON.
pub fn index_to_json(index: &HypergraphIndex) -> Result<String> {
    serde_json::to_string_pretty(index).map_err(|e| IoError::Json(e).into())
}

/// Parses an index from JSON. Callers are responsible for checking the index was
/// built from the store they intend to use it with.
pub fn index_from_json(text: &str) -> Result<HypergraphIndex> {
    serde_json::from_str(text).map_err(|e| IoError::Json(e).into())
}

/// Serializes an insight collection to JSON.
pub fn insight_collection_to_json(collection: &InsightCollection) -> Result<String> {
    serde_json::to_string_pretty(collection).map_err(|e| IoError::Json(e).into())
}

/// Parses an insight collection from JSON.
pub fn insight_collection_from_json(text: &str) -> Result<InsightCollection> {
    serde_json::from_str(text).map_err(|e| IoError::Json(e).into())
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders the hypergraph as Graphviz DOT: each node is an ellipse, each hyperedge is
/// a diamond-shaped "relation node" with arrows in from its sources and out to its
/// targets, so an n-ary edge with n > 2 participants still renders as a single object.
pub fn hypergraph_to_dot(store: &Hypergraph) -> String {
    let mut out = String::new();
    out.push_str("digraph hypergraph {\n");
    out.push_str("  rankdir=LR;\n");

    let mut nodes: Vec<&Node> = store.nodes().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for node in nodes {
        let _ = writeln!(out, "  \"{}\" [shape=ellipse, label=\"{}\"];", node.id, dot_escape(&node.label));
    }

    let mut edges: Vec<&HyperEdge> = store.edges().collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    for edge in edges {
        let relation_node = format!("rel_{}", edge.id);
        let _ = writeln!(
            out,
            "  \"{relation_node}\" [shape=diamond, label=\"{}\"];",
            dot_escape(&edge.relation)
        );
        for source in &edge.sources {
            let _ = writeln!(out, "  \"{source}\" -> \"{relation_node}\";");
        }
        for target in &edge.targets {
            let _ = writeln!(out, "  \"{relation_node}\" -> \"{target}\";");
        }
    }

    out.push_str("}\n");
    out
}

/// Sparse nodes × hyperedges incidence export: `entries` lists `(node_id, edge_id,
/// role)` triples, `role` being `"source"` or `"target"`.
pub fn hypergraph_to_incidence_matrix(store: &Hypergraph) -> Value {
    let mut nodes: Vec<&str> = store.nodes().map(|n| n.id.as_ref()).collect();
    nodes.sort_unstable();
    let mut edges: Vec<&str> = store.edges().map(|e| e.id.as_ref()).collect();
    edges.sort_unstable();

    let mut entries: Vec<Value> = Vec::new();
    let mut sorted_edges: Vec<&HyperEdge> = store.edges().collect();
    sorted_edges.sort_by(|a, b| a.id.cmp(&b.id));
    for edge in sorted_edges {
        for source in &edge.sources {
            entries.push(serde_json::json!([source.as_ref(), edge.id.as_ref(), "source"]));
        }
        for target in &edge.targets {
            entries.push(serde_json::json!([target.as_ref(), edge.id.as_ref(), "target"]));
        }
    }

    serde_json::json!({
        "nodes": nodes,
        "edges": edges,
        "entries": entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    fn sample_graph() -> Hypergraph {
        let mut g = Hypergraph::new();
        g.add_edge(&["A"], "cites", &["B", "C"], Provenance::default(), 1.0);
        g
    }

    #[test]
    fn graph_json_round_trips() {
        let g = sample_graph();
        let json = hypergraph_to_json(&g).unwrap();
        let back = hypergraph_from_json(&json).unwrap();
        assert_eq!(back.node_count(), g.node_count());
        assert_eq!(back.edge_count(), g.edge_count());
    }

    #[test]
    fn duplicate_edge_id_on_load_is_an_error() {
        let json = r#"{
            "meta": {"node_count": 0, "edge_count": 0},
            "nodes": [],
            "edges": [
                {"id": "e000001", "sources": ["a"], "relation": "r", "targets": ["b"]},
                {"id": "e000001", "sources": ["a"], "relation": "r", "targets": ["c"]}
            ]
        }"#;
        assert!(hypergraph_from_json(json).is_err());
    }

    #[test]
    fn edge_ids_minted_after_load_never_collide_with_loaded_ids() {
        let json = r#"{
            "meta": {"node_count": 0, "edge_count": 0},
            "nodes": [],
            "edges": [
                {"id": "e000050", "sources": ["a"], "relation": "r", "targets": ["b"]}
            ]
        }"#;
        let mut store = hypergraph_from_json(json).unwrap();
        let new_id = store.add_edge(&["x"], "r", &["y"], Provenance::default(), 1.0);
        assert_eq!(new_id.as_ref(), "e000051");
    }

    #[test]
    fn dot_export_uses_diamond_relation_nodes() {
        let g = sample_graph();
        let dot = hypergraph_to_dot(&g);
        assert!(dot.contains("shape=diamond"));
        assert!(dot.contains("\"a\" -> \"rel_e000001\""));
    }

    #[test]
    fn incidence_matrix_lists_every_participant() {
        let g = sample_graph();
        let matrix = hypergraph_to_incidence_matrix(&g);
        let entries = matrix["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn graph_json_round_trips_through_a_file() {
        let g = sample_graph();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, hypergraph_to_json(&g).unwrap()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back = hypergraph_from_json(&text).unwrap();
        assert_eq!(back.node_count(), g.node_count());
        assert_eq!(back.edge_count(), g.edge_count());
    }
}

//! s-connectivity predicate, shortest/k-shortest s-paths, s-components, and h-hop
//! neighborhoods — all expressed over the edge graph induced by shared node ids.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{PathError, Result};
use crate::store::Hypergraph;
use crate::types::{EdgeId, HyperEdge, NodeId};
use crate::util::UnionFind;

/// Two edges are s-connected iff they share at least `s` node ids.
pub fn s_connected(e1: &HyperEdge, e2: &HyperEdge, s: u32) -> bool {
    e1.intersection(e2).len() as u32 >= s
}

/// Result of a (k-)shortest s-path query. `found = false` signals a query over
/// unreachable or nonexistent endpoints, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResult {
    pub edges: Vec<EdgeId>,
    pub found: bool,
}

fn validate_s(s: u32) -> Result<()> {
    if s < 1 {
        return Err(PathError::InvalidS(s as i64).into());
    }
    Ok(())
}

/// All edges s-connected to `edge`, found by scanning edges incident to any of its
/// nodes (cheaper than the full edge x edge cross product), sorted for determinism.
fn s_connected_neighbors(store: &Hypergraph, edge: &HyperEdge, s: u32) -> Vec<EdgeId> {
    let mut seen: HashSet<EdgeId> = HashSet::new();
    let mut neighbors = Vec::new();
    for node in edge.all_nodes() {
        for candidate_id in store.incident_edges(&node) {
            if *candidate_id == edge.id || !seen.insert(candidate_id.clone()) {
                continue;
            }
            if let Some(candidate) = store.get_edge(candidate_id) {
                if s_connected(edge, candidate, s) {
                    neighbors.push(candidate_id.clone());
                }
            }
        }
    }
    neighbors.sort();
    neighbors
}

/// BFS over the edge graph rooted at the edges incident to `a`, stopping as soon as an
/// edge containing `b` is dequeued. Visits candidates in sorted id order at each level
/// so the reconstructed path is lexicographically minimal among shortest paths.
pub fn shortest_s_path(store: &Hypergraph, a: &NodeId, b: &NodeId, s: u32) -> Result<PathResult> {
    validate_s(s)?;

    let mut start: Vec<EdgeId> = store.incident_edges(a).to_vec();
    start.sort();
    if start.is_empty() {
        return Ok(PathResult::default());
    }

    let mut visited: HashSet<EdgeId> = HashSet::new();
    let mut predecessor: HashMap<EdgeId, Option<EdgeId>> = HashMap::new();
    let mut queue: VecDeque<EdgeId> = VecDeque::new();
    let mut goal: Option<EdgeId> = None;

    for id in &start {
        if visited.insert(id.clone()) {
            predecessor.insert(id.clone(), None);
            if goal.is_none() {
                if let Some(edge) = store.get_edge(id) {
                    if edge.contains_node(b) {
                        goal = Some(id.clone());
                    }
                }
            }
            queue.push_back(id.clone());
        }
    }

    'bfs: while goal.is_none() {
        let Some(current_id) = queue.pop_front() else {
            break;
        };
        let Some(current) = store.get_edge(&current_id) else {
            continue;
        };
        for nb in s_connected_neighbors(store, current, s) {
            if visited.insert(nb.clone()) {
                predecessor.insert(nb.clone(), Some(current_id.clone()));
                if let Some(ne) = store.get_edge(&nb) {
                    if ne.contains_node(b) {
                        goal = Some(nb);
                        continue 'bfs;
                    }
                }
                queue.push_back(nb);
            }
        }
    }

    reconstruct(goal, &predecessor)
}

fn reconstruct(
    goal: Option<EdgeId>,
    predecessor: &HashMap<EdgeId, Option<EdgeId>>,
) -> Result<PathResult> {
    let Some(goal) = goal else {
        return Ok(PathResult::default());
    };
    let mut chain = vec![goal.clone()];
    let mut cur = goal;
    loop {
        match predecessor.get(&cur).cloned().flatten() {
            Some(parent) => {
                chain.push(parent.clone());
                cur = parent;
            }
            None => break,
        }
    }
    chain.reverse();
    Ok(PathResult {
        edges: chain,
        found: true,
    })
}

/// Same BFS as [`shortest_s_path`] but rooted at a single starting edge, and able to
/// exclude edges entirely (`forbidden_edges`) or just as the first hop out of `start`
/// (`forbidden_first_hops`) — the two exclusion sets Yen's algorithm needs to generate
/// spur paths that diverge from previously found paths.
fn bfs_from_edge(
    store: &Hypergraph,
    start: &EdgeId,
    b: &NodeId,
    s: u32,
    forbidden_edges: &HashSet<EdgeId>,
    forbidden_first_hops: &HashSet<EdgeId>,
) -> Option<Vec<EdgeId>> {
    if forbidden_edges.contains(start) {
        return None;
    }
    let start_edge = store.get_edge(start)?;
    if start_edge.contains_node(b) {
        return Some(vec![start.clone()]);
    }

    let mut visited: HashSet<EdgeId> = HashSet::from([start.clone()]);
    let mut predecessor: HashMap<EdgeId, EdgeId> = HashMap::new();
    let mut queue: VecDeque<EdgeId> = VecDeque::from([start.clone()]);
    let mut goal: Option<EdgeId> = None;

    'bfs: while let Some(current_id) = queue.pop_front() {
        let Some(current) = store.get_edge(&current_id) else {
            continue;
        };
        let mut neighbors = s_connected_neighbors(store, current, s);
        neighbors.retain(|n| !forbidden_edges.contains(n));
        if current_id == *start {
            neighbors.retain(|n| !forbidden_first_hops.contains(n));
        }
        for nb in neighbors {
            if visited.insert(nb.clone()) {
                predecessor.insert(nb.clone(), current_id.clone());
                if let Some(ne) = store.get_edge(&nb) {
                    if ne.contains_node(b) {
                        goal = Some(nb);
                        continue 'bfs;
                    }
                }
                queue.push_back(nb);
            }
        }
        if goal.is_some() {
            break;
        }
    }

    let goal = goal?;
    let mut chain = vec![goal.clone()];
    let mut cur = goal;
    while let Some(parent) = predecessor.get(&cur) {
        chain.push(parent.clone());
        cur = parent.clone();
    }
    chain.reverse();
    Some(chain)
}

/// Yen-style k-shortest s-paths: the first path is the global shortest, each
/// subsequent one is the shortest detour from a previously accepted path's prefix that
/// hasn't been generated yet. Stops at `k` paths, an exhausted candidate pool, or when
/// a path would exceed `max_hops`. Returns the paths and a `found` flag.
pub fn k_shortest_s_paths(
    store: &Hypergraph,
    a: &NodeId,
    b: &NodeId,
    s: u32,
    k: usize,
    max_hops: usize,
) -> Result<(Vec<Vec<EdgeId>>, bool)> {
    validate_s(s)?;
    if k == 0 {
        return Ok((Vec::new(), false));
    }

    let first = shortest_s_path(store, a, b, s)?;
    if !first.found || first.edges.len() > max_hops {
        return Ok((Vec::new(), false));
    }

    let mut accepted: Vec<Vec<EdgeId>> = vec![first.edges];
    let mut candidates: Vec<Vec<EdgeId>> = Vec::new();

    while accepted.len() < k {
        let prev_path = accepted.last().unwrap().clone();

        for i in 0..prev_path.len() {
            let spur_edge = &prev_path[i];
            let root_path = &prev_path[..=i];

            let mut forbidden_first_hops: HashSet<EdgeId> = HashSet::new();
            for p in accepted.iter().chain(candidates.iter()) {
                if p.len() > i + 1 && p[..=i] == *root_path {
                    forbidden_first_hops.insert(p[i + 1].clone());
                }
            }
            let forbidden_edges: HashSet<EdgeId> = prev_path[..i].iter().cloned().collect();

            if let Some(spur_path) =
                bfs_from_edge(store, spur_edge, b, s, &forbidden_edges, &forbidden_first_hops)
            {
                let mut total = prev_path[..i].to_vec();
                total.extend(spur_path);
                if total.len() <= max_hops
                    && !accepted.contains(&total)
                    && !candidates.contains(&total)
                {
                    candidates.push(total);
                }
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|x, y| x.len().cmp(&y.len()).then_with(|| x.cmp(y)));
        accepted.push(candidates.remove(0));
    }

    Ok((accepted, true))
}

/// s-connected components of the edge set: union-find over edges, unioning any pair
/// incident to a common node whose shared-node count meets `s`. Singleton components
/// (edges with no s-connected neighbor) are kept.
pub fn s_connected_components(store: &Hypergraph, s: u32) -> Vec<Vec<EdgeId>> {
    let mut uf: UnionFind<EdgeId> = UnionFind::new();
    for edge in store.edges() {
        uf.add(&edge.id);
    }
    for node in store.nodes() {
        let incident = store.incident_edges(&node.id);
        for i in 0..incident.len() {
            for j in (i + 1)..incident.len() {
                let e1 = store.get_edge(&incident[i]);
                let e2 = store.get_edge(&incident[j]);
                if let (Some(e1), Some(e2)) = (e1, e2) {
                    if s_connected(e1, e2, s) {
                        uf.union(&incident[i], &incident[j]);
                    }
                }
            }
        }
    }
    uf.components()
}

/// Nodes reachable from `n` within `h` hops, where each step after the first must
/// traverse an edge s-connected to the edge used for the previous step.
pub fn h_hop_neighborhood(store: &Hypergraph, n: &NodeId, h: usize, s: u32) -> HashSet<NodeId> {
    let mut result: HashSet<NodeId> = HashSet::from([n.clone()]);
    if h == 0 || store.get_node(n).is_none() {
        return result;
    }

    let mut frontier_seen: HashSet<(NodeId, Option<EdgeId>)> = HashSet::from([(n.clone(), None)]);
    let mut frontier: Vec<(NodeId, Option<EdgeId>)> = vec![(n.clone(), None)];

    for _ in 0..h {
        let mut next_frontier = Vec::new();
        for (node, last_edge) in &frontier {
            for edge_id in store.incident_edges(node) {
                if last_edge.as_ref() == Some(edge_id) {
                    continue;
                }
                let Some(edge) = store.get_edge(edge_id) else {
                    continue;
                };
                let allowed = match last_edge {
                    None => true,
                    Some(prev_id) => match store.get_edge(prev_id) {
                        Some(prev_edge) => s_connected(prev_edge, edge, s),
                        None => false,
                    },
                };
                if !allowed {
                    continue;
                }
                for other in edge.all_nodes() {
                    result.insert(other.clone());
                    let key = (other, Some(edge_id.clone()));
                    if frontier_seen.insert(key.clone()) {
                        next_frontier.push(key);
                    }
                }
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }

    result
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
    fn shortest_path_length_three_across_two_triangles() {
        let g = two_triangle_graph();
        let result = shortest_s_path(&g, &NodeId::from("a"), &NodeId::from("f"), 1).unwrap();
        assert!(result.found);
        assert_eq!(result.edges.len(), 3);
    }

    #[test]
    fn shortest_path_on_nonexistent_node_is_not_an_error() {
        let g = two_triangle_graph();
        let result =
            shortest_s_path(&g, &NodeId::from("nonexistent"), &NodeId::from("f"), 1).unwrap();
        assert!(!result.found);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn invalid_s_is_an_error() {
        let g = two_triangle_graph();
        let err = shortest_s_path(&g, &NodeId::from("a"), &NodeId::from("f"), 0);
        assert!(err.is_err());
    }

    #[test]
    fn all_six_nodes_in_one_s1_component() {
        let g = two_triangle_graph();
        let components = s_connected_components(&g, 1);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 3);
    }

    #[test]
    fn s2_splits_into_more_components() {
        let g = two_triangle_graph();
        // No pair of edges in this graph shares two nodes, so s=2 should isolate every edge.
        let components = s_connected_components(&g, 2);
        assert_eq!(components.len(), 3);
        assert!(components.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn k_shortest_returns_found_false_on_unreachable() {
        let mut g = two_triangle_graph();
        g.add_edge(&["Z"], "isolated", &["Y"], Provenance::default(), 1.0);
        let (paths, found) =
            k_shortest_s_paths(&g, &NodeId::from("a"), &NodeId::from("z"), 1, 3, 5).unwrap();
        assert!(!found);
        assert!(paths.is_empty());
    }

    #[test]
    fn k_shortest_paths_are_all_valid_s_paths() {
        let g = two_triangle_graph();
        let (paths, found) =
            k_shortest_s_paths(&g, &NodeId::from("a"), &NodeId::from("f"), 1, 3, 5).unwrap();
        assert!(found);
        assert!(!paths.is_empty());
        for path in &paths {
            assert!(g.get_edge(&path[0]).unwrap().contains_node(&NodeId::from("a")));
            assert!(g
                .get_edge(path.last().unwrap())
                .unwrap()
                .contains_node(&NodeId::from("f")));
            for pair in path.windows(2) {
                let e1 = g.get_edge(&pair[0]).unwrap();
                let e2 = g.get_edge(&pair[1]).unwrap();
                assert!(s_connected(e1, e2, 1));
            }
        }
    }

    #[test]
    fn h_hop_neighborhood_grows_with_h() {
        let g = two_triangle_graph();
        let one_hop = h_hop_neighborhood(&g, &NodeId::from("a"), 1, 1);
        let two_hop = h_hop_neighborhood(&g, &NodeId::from("a"), 2, 1);
        assert!(one_hop.len() <= two_hop.len());
        assert!(one_hop.contains(&NodeId::from("a")));
        assert!(one_hop.contains(&NodeId::from("b")));
        assert!(one_hop.contains(&NodeId::from("c")));
    }
}

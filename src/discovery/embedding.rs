//! TransE embedding link prediction: learn entity/relation vectors from the
//! hypergraph's triples, then score unseen entity pairs by translation distance.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::EmbeddingConfig;
use crate::discovery::{evidence_chunk_ids, is_coauthorship_relation, is_person_like_label, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

type Triple = (NodeId, String, NodeId);

/// Trained TransE vectors, kept around only for the lifetime of `run`.
struct EmbeddingModel {
    entities: HashMap<NodeId, Vec<f32>>,
    relations: HashMap<String, Vec<f32>>,
}

fn xavier_init(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let bound = (6.0 / dim as f32).sqrt();
    (0..dim).map(|_| rng.gen_range(-bound..bound)).collect()
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn vector_add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

fn vector_sub(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn axpy(v: &mut [f32], alpha: f32, x: &[f32]) {
    for (vi, xi) in v.iter_mut().zip(x) {
        *vi += alpha * xi;
    }
}

fn build_triples(store: &Hypergraph) -> Vec<Triple> {
    let mut triples = Vec::new();
    for edge in store.edges() {
        let nodes: Vec<NodeId> = edge.all_nodes().into_iter().collect();
        let relation = edge.relation_lower();
        for i in 0..nodes.len() {
            for j in 0..nodes.len() {
                if i == j {
                    continue;
                }
                triples.push((nodes[i].clone(), relation.clone(), nodes[j].clone()));
            }
        }
    }
    triples.sort();
    triples.dedup();
    triples
}

fn train_transe(store: &Hypergraph, config: &EmbeddingConfig, rng_seed: u64) -> EmbeddingModel {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let triples = build_triples(store);
    let dim = config.embedding_dim;

    let mut entities: HashMap<NodeId, Vec<f32>> = HashMap::new();
    for node in store.nodes() {
        let mut v = xavier_init(&mut rng, dim);
        l2_normalize(&mut v);
        entities.insert(node.id.clone(), v);
    }
    let mut relations: HashMap<String, Vec<f32>> = HashMap::new();
    for (_, r, _) in &triples {
        relations.entry(r.clone()).or_insert_with(|| xavier_init(&mut rng, dim));
    }
    let entity_ids: Vec<NodeId> = entities.keys().cloned().collect();
    if triples.is_empty() || entity_ids.len() < 2 {
        return EmbeddingModel { entities, relations };
    }

    for _epoch in 0..config.embedding_epochs {
        let mut shuffled = triples.clone();
        shuffled.shuffle(&mut rng);

        for batch in shuffled.chunks(config.embedding_batch_size.max(1)) {
            for (h, r, t) in batch {
                for _ in 0..config.embedding_neg_samples {
                    let corrupt_head = rng.gen_bool(0.5);
                    let replacement = entity_ids.choose(&mut rng).cloned().unwrap();
                    let (ch, ct) = if corrupt_head {
                        (replacement, t.clone())
                    } else {
                        (h.clone(), replacement)
                    };

                    let h_vec = entities[h].clone();
                    let t_vec = entities[t].clone();
                    let r_vec = relations[r].clone();
                    let ch_vec = entities[&ch].clone();
                    let ct_vec = entities[&ct].clone();

                    let pos_diff = vector_sub(&vector_add(&h_vec, &r_vec), &t_vec);
                    let neg_diff = vector_sub(&vector_add(&ch_vec, &r_vec), &ct_vec);
                    let pos_dist = l2_norm(&pos_diff);
                    let neg_dist = l2_norm(&neg_diff);
                    let loss = config.embedding_margin as f32 + pos_dist - neg_dist;
                    if loss <= 0.0 {
                        continue;
                    }

                    let lr = config.embedding_learning_rate as f32;
                    let pos_unit = {
                        let mut u = pos_diff;
                        let scale = 1.0 / pos_dist.max(1e-10);
                        for x in u.iter_mut() {
                            *x *= scale;
                        }
                        u
                    };
                    let neg_unit = {
                        let mut u = neg_diff;
                        let scale = 1.0 / neg_dist.max(1e-10);
                        for x in u.iter_mut() {
                            *x *= scale;
                        }
                        u
                    };

                    if let Some(v) = entities.get_mut(h) {
                        axpy(v, -lr, &pos_unit);
                    }
                    if let Some(v) = entities.get_mut(t) {
                        axpy(v, lr, &pos_unit);
                    }
                    if let Some(v) = entities.get_mut(&ch) {
                        axpy(v, lr, &neg_unit);
                    }
                    if let Some(v) = entities.get_mut(&ct) {
                        axpy(v, -lr, &neg_unit);
                    }
                    if let Some(v) = relations.get_mut(r) {
                        axpy(v, -lr, &pos_unit);
                        axpy(v, lr, &neg_unit);
                    }
                }
            }
        }

        for v in entities.values_mut() {
            l2_normalize(v);
        }
    }

    EmbeddingModel { entities, relations }
}

fn neighbors_of(store: &Hypergraph, node: &NodeId) -> HashSet<NodeId> {
    store
        .incident_edges(node)
        .iter()
        .filter_map(|e| store.get_edge(e))
        .flat_map(|e| e.all_nodes())
        .filter(|n| n != node)
        .collect()
}

fn jaccard(a: &HashSet<NodeId>, b: &HashSet<NodeId>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &EmbeddingConfig,
    rng_seed: u64,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("embedding", None);

    let model = train_transe(store, config, rng_seed);
    let existing: HashSet<Triple> = build_triples(store).into_iter().collect();

    let candidate_entities: Vec<NodeId> = index
        .get_top_hubs(config.embedding_candidate_entities)
        .iter()
        .map(|(id, _)| id.clone())
        .collect();

    let mut relation_counts: Vec<(String, usize)> = store
        .edges()
        .fold(HashMap::<String, usize>::new(), |mut acc, e| {
            *acc.entry(e.relation_lower()).or_insert(0) += 1;
            acc
        })
        .into_iter()
        .collect();
    relation_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let allowed_relations: Vec<String> = relation_counts
        .into_iter()
        .take(config.embedding_allowed_relations_top_k)
        .map(|(r, _)| r)
        .collect();

    let mut candidates: Vec<(NodeId, String, NodeId, f64, Vec<EdgeId>)> = Vec::new();
    for relation in &allowed_relations {
        let Some(r_vec) = model.relations.get(relation) else { continue };
        for i in 0..candidate_entities.len() {
            for j in 0..candidate_entities.len() {
                if i == j {
                    continue;
                }
                let h = &candidate_entities[i];
                let t = &candidate_entities[j];
                if existing.contains(&(h.clone(), relation.clone(), t.clone())) {
                    continue;
                }
                if is_coauthorship_relation(relation) {
                    let label_h = store.get_node(h).map(|n| n.label.clone()).unwrap_or_default();
                    let label_t = store.get_node(t).map(|n| n.label.clone()).unwrap_or_default();
                    if !is_person_like_label(&label_h) || !is_person_like_label(&label_t) {
                        continue;
                    }
                }
                let overlap = jaccard(&neighbors_of(store, h), &neighbors_of(store, t));
                if overlap < config.embedding_min_neighbor_overlap {
                    continue;
                }
                let (Some(h_vec), Some(t_vec)) = (model.entities.get(h), model.entities.get(t)) else {
                    continue;
                };
                let distance = l2_norm(&vector_sub(&vector_add(h_vec, r_vec), t_vec));
                let plausibility = 1.0 / (1.0 + distance as f64);
                if plausibility < config.embedding_min_score {
                    continue;
                }
                let witness_edges: Vec<EdgeId> = {
                    let mut edges: HashSet<EdgeId> = store.incident_edges(h).iter().cloned().collect();
                    edges.extend(store.incident_edges(t).iter().cloned());
                    let mut edges: Vec<EdgeId> = edges.into_iter().collect();
                    edges.sort();
                    edges
                };
                if witness_edges.len() < config.embedding_min_evidence_edges {
                    continue;
                }
                candidates.push((h.clone(), relation.clone(), t.clone(), plausibility, witness_edges));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.3.partial_cmp(&a.3)
            .unwrap()
            .then_with(|| (a.0.clone(), a.1.clone(), a.2.clone()).cmp(&(b.0.clone(), b.1.clone(), b.2.clone())))
    });
    candidates.truncate(config.embedding_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (h, relation, t, plausibility, witness_edges) in candidates {
        let seeds = vec![h.clone(), t.clone()];
        let witness_nodes = seeds.clone();
        let breakdown = crate::insight::ScoreBreakdown {
            support: score::support_component(witness_edges.len()),
            novelty: plausibility,
            specificity: score::specificity_component(&seeds, store),
        };
        let label_of = |id: &NodeId| {
            store
                .get_node(id)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| id.to_string())
        };
        insights.push(Insight {
            id: ids.next(InsightType::EmbeddingLinkPrediction),
            insight_type: InsightType::EmbeddingLinkPrediction,
            seed_labels: vec![label_of(&h), label_of(&t)],
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes,
            seeds,
            score: plausibility,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("relation={relation}"), format!("plausibility={plausibility:.4}")],
            description: format!(
                "Embedding predicts a \"{relation}\" link between {} and {} (plausibility={plausibility:.4})",
                label_of(&h),
                label_of(&t)
            ),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
    }

    progress.finish();
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    fn small_graph() -> Hypergraph {
        let mut g = Hypergraph::new();
        g.add_edge(&["Ann"], "coauthor", &["Bo"], Provenance::default(), 1.0);
        g.add_edge(&["Bo"], "coauthor", &["Cy"], Provenance::default(), 1.0);
        g.add_edge(&["Cy"], "coauthor", &["Dee"], Provenance::default(), 1.0);
        g
    }

    #[test]
    fn training_is_reproducible_for_a_fixed_seed() {
        let g = small_graph();
        let config = EmbeddingConfig {
            embedding_dim: 8,
            embedding_epochs: 3,
            embedding_neg_samples: 2,
            embedding_batch_size: 4,
            embedding_min_neighbor_overlap: 0.0,
            embedding_min_score: 0.0,
            embedding_min_evidence_edges: 0,
            ..EmbeddingConfig::default()
        };
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let mut ids_a = IdAllocator::new("run1");
        let mut ids_b = IdAllocator::new("run1");
        let a = run(&g, &index, &config, 7, &mut ids_a, &crate::progress::NoopReporter);
        let b = run(&g, &index, &config, 7, &mut ids_b, &crate::progress::NoopReporter);
        let scores_a: Vec<f64> = a.iter().map(|i| i.score).collect();
        let scores_b: Vec<f64> = b.iter().map(|i| i.score).collect();
        assert_eq!(scores_a, scores_b);
    }

    #[test]
    fn non_person_labels_are_excluded_from_coauthorship_predictions() {
        let mut g = Hypergraph::new();
        g.add_edge(&["lab alpha"], "coauthor", &["lab beta"], Provenance::default(), 1.0);
        let config = EmbeddingConfig {
            embedding_dim: 4,
            embedding_epochs: 1,
            embedding_min_neighbor_overlap: 0.0,
            embedding_min_score: 0.0,
            embedding_min_evidence_edges: 0,
            ..EmbeddingConfig::default()
        };
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, 1, &mut ids, &crate::progress::NoopReporter);
        assert!(insights.iter().all(|i| i.seed_labels != vec!["lab alpha", "lab beta"]));
    }
}

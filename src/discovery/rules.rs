//! Association rules: "if an entity plays role R in a `body` relation, it usually
//! also plays role R in a `head` relation" — mined per ordered relation pair.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::config::RulesConfig;
use crate::discovery::{evidence_chunk_ids, score, IdAllocator};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightType, LlmSlot};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;
use crate::types::{EdgeId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Target,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Target => "target",
        }
    }
}

pub fn run(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &RulesConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("association_rules", None);

    let total_edges = store.edge_count() as f64;
    let mut by_relation: HashMap<String, Vec<EdgeId>> = HashMap::new();
    for edge in store.edges() {
        by_relation.entry(edge.relation_lower()).or_default().push(edge.id.clone());
    }
    let relations: Vec<String> = by_relation.keys().cloned().collect();

    let mut role_sets: HashMap<(String, Role), HashSet<NodeId>> = HashMap::new();
    for (relation, edges) in &by_relation {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for id in edges {
            if let Some(edge) = store.get_edge(id) {
                sources.extend(edge.sources.iter().cloned());
                targets.extend(edge.targets.iter().cloned());
            }
        }
        role_sets.insert((relation.clone(), Role::Source), sources);
        role_sets.insert((relation.clone(), Role::Target), targets);
    }

    let mut candidates: Vec<(String, String, Role, usize, f64, f64, Vec<EdgeId>)> = Vec::new();
    for body in &relations {
        let body_edges = &by_relation[body];
        for head in &relations {
            if body == head {
                continue;
            }
            for role in [Role::Source, Role::Target] {
                let head_set = &role_sets[&(head.clone(), role)];
                let mut support = 0usize;
                let mut witness_edges = Vec::new();
                for id in body_edges {
                    let Some(edge) = store.get_edge(id) else { continue };
                    let role_entities: &[NodeId] = match role {
                        Role::Source => &edge.sources,
                        Role::Target => &edge.targets,
                    };
                    if role_entities.iter().any(|n| head_set.contains(n)) {
                        support += 1;
                        witness_edges.push(id.clone());
                    }
                }
                if support < config.rule_min_support {
                    continue;
                }
                let confidence = support as f64 / body_edges.len() as f64;
                if confidence < config.rule_min_confidence {
                    continue;
                }
                let head_share = by_relation[head].len() as f64 / total_edges.max(1.0);
                let lift = if head_share > 0.0 { confidence / head_share } else { 0.0 };
                if lift < config.rule_min_lift {
                    continue;
                }
                candidates.push((body.clone(), head.clone(), role, support, confidence, lift, witness_edges));
            }
        }
    }

    candidates.sort_by(|a, b| {
        (b.5 * b.4)
            .partial_cmp(&(a.5 * a.4))
            .unwrap()
            .then_with(|| (a.0.clone(), a.1.clone()).cmp(&(b.0.clone(), b.1.clone())))
    });
    candidates.truncate(config.rule_max_candidates);

    let mut insights = Vec::with_capacity(candidates.len());
    for (body, head, role, support, confidence, lift, witness_edges) in candidates {
        let witness_nodes: Vec<NodeId> = witness_edges
            .iter()
            .filter_map(|e| store.get_edge(e))
            .flat_map(|e| e.all_nodes())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let (breakdown, final_score) = score::score(&[], witness_edges.len(), store, index);
        insights.push(Insight {
            id: ids.next(InsightType::AssociationRule),
            insight_type: InsightType::AssociationRule,
            seeds: Vec::new(),
            seed_labels: Vec::new(),
            evidence_chunk_ids: evidence_chunk_ids(store, &witness_edges),
            witness_edges,
            witness_nodes,
            score: final_score,
            score_breakdown: breakdown,
            novelty_tags: vec![format!("confidence={confidence:.2}"), format!("lift={lift:.2}")],
            description: format!(
                "\"{body}\" implies \"{head}\" on {} role (support={support}, confidence={confidence:.2}, lift={lift:.2})",
                role.as_str()
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

    #[test]
    fn finds_rule_between_relations_sharing_sources() {
        let mut g = Hypergraph::new();
        for i in 0..5 {
            let person = format!("Person{i}");
            g.add_edge(&[&person], "authors", &["PaperX"], Provenance::default(), 1.0);
            g.add_edge(&[&person], "reviews", &["PaperY"], Provenance::default(), 1.0);
        }
        let index = HypergraphIndex::build(&g, &[2], "test.json");
        let config = RulesConfig {
            rule_min_support: 2,
            rule_min_confidence: 0.5,
            rule_min_lift: 0.5,
            rule_max_candidates: 20,
        };
        let mut ids = IdAllocator::new("run1");
        let insights = run(&g, &index, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(!insights.is_empty());
    }
}

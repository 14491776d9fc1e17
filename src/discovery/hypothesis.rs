//! Hypothesis synthesis: bundles the strongest insights from distinct operators
//! into a single cross-cutting hypothesis, preferring coverage of at least three
//! operator types per bundle.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;

use crate::config::HypothesisConfig;
use crate::discovery::IdAllocator;
use crate::insight::{Insight, InsightType, LlmSlot, ScoreBreakdown};
use crate::progress::ProgressReporter;
use crate::types::{EdgeId, NodeId};

const MIN_DISTINCT_TYPES: usize = 3;

fn pick_bundle(sorted: &[&Insight], used: &HashSet<String>) -> Vec<usize> {
    let mut picked = Vec::new();
    let mut seen_types: HashSet<InsightType> = HashSet::new();
    for (idx, insight) in sorted.iter().enumerate() {
        if used.contains(&insight.id) {
            continue;
        }
        if seen_types.contains(&insight.insight_type) {
            continue;
        }
        seen_types.insert(insight.insight_type);
        picked.push(idx);
        if seen_types.len() >= MIN_DISTINCT_TYPES {
            break;
        }
    }
    picked
}

pub fn run(
    collection: &[Insight],
    config: &HypothesisConfig,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Vec<Insight> {
    progress.start("hypothesis", Some(config.hypothesis_count as u64));

    let mut sorted: Vec<&Insight> = collection
        .iter()
        .filter(|i| i.insight_type != InsightType::Hypothesis)
        .collect();
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| a.id.cmp(&b.id)));

    let mut used: HashSet<String> = HashSet::new();
    let mut hypotheses = Vec::new();

    for _ in 0..config.hypothesis_count {
        let picked = pick_bundle(&sorted, &used);
        if picked.len() < 2 {
            break;
        }
        let members: Vec<&Insight> = picked.iter().map(|&idx| sorted[idx]).collect();
        for m in &members {
            used.insert(m.id.clone());
        }

        let witness_edges: Vec<EdgeId> = members
            .iter()
            .flat_map(|m| m.witness_edges.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let witness_nodes: Vec<NodeId> = members
            .iter()
            .flat_map(|m| m.witness_nodes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let seeds: Vec<NodeId> = members
            .iter()
            .flat_map(|m| m.seeds.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let evidence_chunk_ids: Vec<String> = members
            .iter()
            .flat_map(|m| m.evidence_chunk_ids.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let n = members.len() as f64;
        let score_breakdown = ScoreBreakdown {
            support: members.iter().map(|m| m.score_breakdown.support).sum::<f64>() / n,
            novelty: members.iter().map(|m| m.score_breakdown.novelty).sum::<f64>() / n,
            specificity: members.iter().map(|m| m.score_breakdown.specificity).sum::<f64>() / n,
        };
        let score = members.iter().map(|m| m.score).sum::<f64>() / n;

        let parts: Vec<String> = members
            .iter()
            .map(|m| format!("{} ({})", m.insight_type, m.seed_labels.join(", ")))
            .collect();
        let description = format!("Cross-operator hypothesis linking: {}", parts.join("; "));

        hypotheses.push(Insight {
            id: ids.next(InsightType::Hypothesis),
            insight_type: InsightType::Hypothesis,
            seeds,
            seed_labels: members.iter().flat_map(|m| m.seed_labels.iter().cloned()).collect(),
            witness_edges,
            witness_nodes,
            evidence_chunk_ids,
            score,
            score_breakdown,
            novelty_tags: members.iter().map(|m| m.id.clone()).collect(),
            description,
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        });
        progress.advance(1);
    }

    progress.finish();
    hypotheses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::{Insight, ScoreBreakdown};

    fn stub(id: &str, insight_type: InsightType, score: f64) -> Insight {
        Insight {
            id: id.to_string(),
            insight_type,
            seeds: vec![NodeId::from("a")],
            seed_labels: vec!["A".to_string()],
            witness_edges: vec![],
            witness_nodes: vec![NodeId::from("a")],
            evidence_chunk_ids: vec![],
            score,
            score_breakdown: ScoreBreakdown { support: score, novelty: score, specificity: score },
            novelty_tags: vec![],
            description: String::new(),
            llm: LlmSlot::default(),
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn bundles_three_distinct_operator_types() {
        let collection = vec![
            stub("run1:bridge:000001", InsightType::Bridge, 0.9),
            stub("run1:motif:000002", InsightType::Motif, 0.8),
            stub("run1:diffusion:000003", InsightType::Diffusion, 0.7),
            stub("run1:completion:000004", InsightType::Completion, 0.6),
        ];
        let config = HypothesisConfig { hypothesis_count: 1 };
        let mut ids = IdAllocator::new("run1");
        let hyps = run(&collection, &config, &mut ids, &crate::progress::NoopReporter);
        assert_eq!(hyps.len(), 1);
        assert_eq!(hyps[0].novelty_tags.len(), 3);
    }

    #[test]
    fn stops_when_material_runs_out() {
        let collection = vec![stub("run1:bridge:000001", InsightType::Bridge, 0.9)];
        let config = HypothesisConfig { hypothesis_count: 2 };
        let mut ids = IdAllocator::new("run1");
        let hyps = run(&collection, &config, &mut ids, &crate::progress::NoopReporter);
        assert!(hyps.is_empty());
    }
}

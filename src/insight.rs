//! The canonical discovery output record and its collection wrapper.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EdgeId, NodeId};

/// One of the twelve discovery operators. Serializes to its snake_case name, which
/// also appears in an insight's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Bridge,
    Completion,
    Motif,
    Substitution,
    SurpriseEdge,
    AssociationRule,
    PathRanking,
    CommunityLink,
    Diffusion,
    EmbeddingLinkPrediction,
    Hypothesis,
    AuthorReferenceChain,
}

impl InsightType {
    pub fn as_snake(self) -> &'static str {
        match self {
            InsightType::Bridge => "bridge",
            InsightType::Completion => "completion",
            InsightType::Motif => "motif",
            InsightType::Substitution => "substitution",
            InsightType::SurpriseEdge => "surprise_edge",
            InsightType::AssociationRule => "association_rule",
            InsightType::PathRanking => "path_ranking",
            InsightType::CommunityLink => "community_link",
            InsightType::Diffusion => "diffusion",
            InsightType::EmbeddingLinkPrediction => "embedding_link_prediction",
            InsightType::Hypothesis => "hypothesis",
            InsightType::AuthorReferenceChain => "author_reference_chain",
        }
    }

    pub const ALL: [InsightType; 12] = [
        InsightType::Bridge,
        InsightType::Completion,
        InsightType::Motif,
        InsightType::Substitution,
        InsightType::SurpriseEdge,
        InsightType::AssociationRule,
        InsightType::PathRanking,
        InsightType::CommunityLink,
        InsightType::Diffusion,
        InsightType::EmbeddingLinkPrediction,
        InsightType::Hypothesis,
        InsightType::AuthorReferenceChain,
    ];
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_snake())
    }
}

/// The three subscores every operator populates, whether or not its final `score`
/// comes from the generic weighted combiner.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub support: f64,
    pub novelty: f64,
    pub specificity: f64,
}

/// A reserved slot for a later LLM narrative pass; the core never populates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// One scored, evidence-backed discovery record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// `<run_id>:<type_snake>:<6-digit-zero-padded>`.
    pub id: String,
    pub insight_type: InsightType,
    pub seeds: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed_labels: Vec<String>,
    pub witness_edges: Vec<EdgeId>,
    pub witness_nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_chunk_ids: Vec<String>,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub novelty_tags: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "is_default_llm")]
    pub llm: LlmSlot,
    pub created_utc: DateTime<Utc>,
}

fn is_default_llm(slot: &LlmSlot) -> bool {
    slot.narrative.is_none()
}

impl Insight {
    /// Format a run-scoped insight id from its monotone sequence number.
    pub fn format_id(run_id: &str, insight_type: InsightType, seq: u64) -> String {
        format!("{run_id}:{}:{seq:06}", insight_type.as_snake())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightCollectionMeta {
    pub run_id: String,
    pub created_utc: DateTime<Utc>,
    pub source_graph_path: String,
    pub total_count: usize,
}

/// The exported unit: every insight a run produced, plus a per-type count summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightCollection {
    pub meta: InsightCollectionMeta,
    pub summary_by_type: BTreeMap<String, usize>,
    pub insights: Vec<Insight>,
}

impl InsightCollection {
    pub fn new(run_id: impl Into<String>, source_graph_path: impl Into<String>, insights: Vec<Insight>) -> Self {
        let mut summary_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for insight in &insights {
            *summary_by_type
                .entry(insight.insight_type.as_snake().to_string())
                .or_insert(0) += 1;
        }
        Self {
            meta: InsightCollectionMeta {
                run_id: run_id.into(),
                created_utc: Utc::now(),
                source_graph_path: source_graph_path.into(),
                total_count: insights.len(),
            },
            summary_by_type,
            insights,
        }
    }
}

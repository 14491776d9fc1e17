//! Configuration for the index builder and the twelve discovery operators.

use serde::{Deserialize, Serialize};

/// Which `s` values the index precomputes `s_components` for.
pub const DEFAULT_S_VALUES: [u32; 3] = [2, 3, 4];

/// Top-level configuration for index construction and discovery runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypergraphConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for HypergraphConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub s_values: Vec<u32>,
    /// Degree ranking is truncated to this many entries when written to disk.
    pub degree_rank_disk_cap: usize,
    /// Co-occurrence map is truncated to this many entries (by count) when written to disk.
    pub cooccurrence_disk_cap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            s_values: DEFAULT_S_VALUES.to_vec(),
            degree_rank_disk_cap: 1_000,
            cooccurrence_disk_cap: 50_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub bridges: BridgesConfig,
    #[serde(default)]
    pub completions: CompletionsConfig,
    #[serde(default)]
    pub motifs: MotifsConfig,
    #[serde(default)]
    pub substitutions: SubstitutionsConfig,
    #[serde(default)]
    pub surprise: SurpriseConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub path_rank: PathRankConfig,
    #[serde(default)]
    pub community_links: CommunityLinksConfig,
    #[serde(default)]
    pub diffusion: DiffusionConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub hypothesis: HypothesisConfig,
    #[serde(default)]
    pub author_chains: AuthorChainsConfig,

    /// Hard cap on the total number of insights a run returns.
    pub max_total_insights: usize,
    /// Soft per-operator target used by adaptive thresholding.
    pub target_insights_per_operator: usize,
    /// Soft global target applied after the global sort.
    pub target_total_insights: usize,
    /// Whether to apply adaptive per-operator truncation before the global sort.
    pub adaptive_thresholds: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bridges: BridgesConfig::default(),
            completions: CompletionsConfig::default(),
            motifs: MotifsConfig::default(),
            substitutions: SubstitutionsConfig::default(),
            surprise: SurpriseConfig::default(),
            rules: RulesConfig::default(),
            path_rank: PathRankConfig::default(),
            community_links: CommunityLinksConfig::default(),
            diffusion: DiffusionConfig::default(),
            embedding: EmbeddingConfig::default(),
            hypothesis: HypothesisConfig::default(),
            author_chains: AuthorChainsConfig::default(),
            max_total_insights: 2_000,
            target_insights_per_operator: 20,
            target_total_insights: 100,
            adaptive_thresholds: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgesConfig {
    pub bridge_s_threshold: u32,
    pub bridge_max_candidates: usize,
}

impl Default for BridgesConfig {
    fn default() -> Self {
        Self {
            bridge_s_threshold: 2,
            bridge_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionsConfig {
    pub completion_min_shared_edges: usize,
    pub completion_max_candidates: usize,
}

impl Default for CompletionsConfig {
    fn default() -> Self {
        Self {
            completion_min_shared_edges: 1,
            completion_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotifsConfig {
    pub motif_min_support: usize,
    pub motif_min_lift: f64,
    pub motif_max_candidates: usize,
}

impl Default for MotifsConfig {
    fn default() -> Self {
        Self {
            motif_min_support: 2,
            motif_min_lift: 1.5,
            motif_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionsConfig {
    pub substitution_similarity_threshold: f64,
    pub substitution_max_candidates: usize,
    pub substitution_sample_cap: usize,
}

impl Default for SubstitutionsConfig {
    fn default() -> Self {
        Self {
            substitution_similarity_threshold: 0.6,
            substitution_max_candidates: 200,
            substitution_sample_cap: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurpriseConfig {
    pub surprise_max_expected_cooccurrence: f64,
    pub surprise_max_candidates: usize,
}

impl Default for SurpriseConfig {
    fn default() -> Self {
        Self {
            surprise_max_expected_cooccurrence: 0.2,
            surprise_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub rule_min_support: usize,
    pub rule_min_confidence: f64,
    pub rule_min_lift: f64,
    pub rule_max_candidates: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rule_min_support: 2,
            rule_min_confidence: 0.4,
            rule_min_lift: 1.1,
            rule_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRankConfig {
    pub path_rank_k: usize,
    pub path_rank_max_hops: usize,
    pub path_rank_min_intersection: u32,
    pub path_rank_max_seed_nodes: usize,
    pub path_rank_max_pairs: usize,
    pub path_rank_max_candidates: usize,
    pub path_rank_min_score: f64,
    pub path_rank_min_evidence_edges: usize,
}

impl Default for PathRankConfig {
    fn default() -> Self {
        Self {
            path_rank_k: 5,
            path_rank_max_hops: 3,
            path_rank_min_intersection: 1,
            path_rank_max_seed_nodes: 200,
            path_rank_max_pairs: 2_000,
            path_rank_max_candidates: 200,
            path_rank_min_score: 0.6,
            path_rank_min_evidence_edges: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityLinksConfig {
    pub community_s_threshold: u32,
    pub community_top_nodes_per_component: usize,
    pub community_min_relation_overlap: f64,
    pub community_max_candidates: usize,
}

impl Default for CommunityLinksConfig {
    fn default() -> Self {
        Self {
            community_s_threshold: 2,
            community_top_nodes_per_component: 15,
            community_min_relation_overlap: 0.1,
            community_max_candidates: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffusionConfig {
    pub diffusion_iterations: u32,
    pub diffusion_damping: f64,
    pub diffusion_top_k: usize,
    /// Top non-seed nodes to emit per seed.
    pub diffusion_results_per_seed: usize,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            diffusion_iterations: 20,
            diffusion_damping: 0.85,
            diffusion_top_k: 50,
            diffusion_results_per_seed: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub embedding_dim: usize,
    pub embedding_epochs: usize,
    pub embedding_learning_rate: f64,
    pub embedding_margin: f64,
    pub embedding_neg_samples: usize,
    pub embedding_batch_size: usize,
    pub embedding_max_candidates: usize,
    pub embedding_min_score: f64,
    pub embedding_min_evidence_edges: usize,
    pub embedding_allowed_relations_top_k: usize,
    pub embedding_min_neighbor_overlap: f64,
    /// Top-degree entities considered as candidate heads/tails.
    pub embedding_candidate_entities: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 50,
            embedding_epochs: 100,
            embedding_learning_rate: 0.01,
            embedding_margin: 1.0,
            embedding_neg_samples: 5,
            embedding_batch_size: 128,
            embedding_max_candidates: 200,
            embedding_min_score: 0.7,
            embedding_min_evidence_edges: 1,
            embedding_allowed_relations_top_k: 30,
            embedding_min_neighbor_overlap: 0.05,
            embedding_candidate_entities: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisConfig {
    pub hypothesis_count: usize,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self { hypothesis_count: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorChainsConfig {
    pub author_chain_max_candidates: usize,
}

impl Default for AuthorChainsConfig {
    fn default() -> Self {
        Self {
            author_chain_max_candidates: 200,
        }
    }
}

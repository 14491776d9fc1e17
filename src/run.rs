//! Orchestrates a discovery run across the twelve operators: fans out to whichever
//! operators are requested, adaptively truncates each operator's output, synthesizes
//! hypotheses over the combined pool, then globally sorts and truncates.

use crate::config::DiscoveryConfig;
use crate::discovery::{author_chains, bridges, community_links, completions, diffusion, embedding, hypothesis, motifs, path_rank, rules, substitutions, surprise, IdAllocator, GRAPH_OPERATOR_NAMES};
use crate::error::{DiscoveryError, Result};
use crate::index::HypergraphIndex;
use crate::insight::{Insight, InsightCollection, InsightType};
use crate::progress::ProgressReporter;
use crate::store::Hypergraph;

/// Sorts by score descending (ties by insight id) and, if `insights` exceeds `target`,
/// keeps every insight tied with the score at the cutoff position rather than cutting
/// mid-tie.
fn adaptive_truncate(mut insights: Vec<Insight>, target: usize) -> Vec<Insight> {
    insights.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| a.id.cmp(&b.id)));
    if insights.len() <= target || target == 0 {
        return insights;
    }
    let cutoff_score = insights[target - 1].score;
    insights.retain(|i| i.score >= cutoff_score);
    insights
}

fn run_one_operator(
    name: &str,
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &DiscoveryConfig,
    rng_seed: u64,
    ids: &mut IdAllocator,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Insight>> {
    let insights = match name {
        "bridges" => bridges::run(store, index, &config.bridges, ids, progress),
        "completions" => completions::run(store, index, &config.completions, ids, progress),
        "motifs" => motifs::run(store, index, &config.motifs, ids, progress),
        "substitutions" => substitutions::run(store, index, &config.substitutions, rng_seed, ids, progress),
        "surprise" => surprise::run(store, index, &config.surprise, ids, progress),
        "association_rules" => rules::run(store, index, &config.rules, ids, progress),
        "path_ranking" => path_rank::run(store, index, &config.path_rank, ids, progress)?,
        "community_links" => community_links::run(store, index, &config.community_links, ids, progress),
        "diffusion" => diffusion::run(store, index, &config.diffusion, ids, progress),
        "embedding" => embedding::run(store, index, &config.embedding, rng_seed, ids, progress),
        "author_chains" => author_chains::run(store, index, &config.author_chains, ids, progress),
        other => {
            return Err(DiscoveryError::InvalidConfig(format!("unknown operator: {other}")).into());
        }
    };

    // Author-reference-chain insights only ever belong to the general pool when they
    // came from the operator dedicated to producing them.
    let insights = if name == "author_chains" {
        insights
    } else {
        insights.into_iter().filter(|i| i.insight_type != InsightType::AuthorReferenceChain).collect()
    };
    Ok(insights)
}

/// Runs exactly the named operators (from [`GRAPH_OPERATOR_NAMES`], plus the special
/// name `"hypothesis"`) and returns the combined, globally sorted collection.
pub fn run_operators(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &DiscoveryConfig,
    run_id: &str,
    rng_seed: u64,
    source_graph_path: impl Into<String>,
    names: &[&str],
    progress: &dyn ProgressReporter,
) -> Result<InsightCollection> {
    let mut ids = IdAllocator::new(run_id);
    let mut pool: Vec<Insight> = Vec::new();

    for name in GRAPH_OPERATOR_NAMES {
        if !names.contains(&name) {
            continue;
        }
        let mut operator_insights = run_one_operator(name, store, index, config, rng_seed, &mut ids, progress)?;
        if config.adaptive_thresholds {
            operator_insights = adaptive_truncate(operator_insights, config.target_insights_per_operator);
        }
        pool.extend(operator_insights);
    }

    if names.contains(&"hypothesis") {
        let hypotheses = hypothesis::run(&pool, &config.hypothesis, &mut ids, progress);
        pool.extend(hypotheses);
    }

    pool.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| a.id.cmp(&b.id)));
    if pool.len() > config.target_total_insights && config.target_total_insights > 0 {
        pool = adaptive_truncate(pool, config.target_total_insights);
    }
    pool.truncate(config.max_total_insights);

    Ok(InsightCollection::new(run_id, source_graph_path, pool))
}

/// Runs every discovery operator, including hypothesis synthesis.
pub fn run_all(
    store: &Hypergraph,
    index: &HypergraphIndex,
    config: &DiscoveryConfig,
    run_id: &str,
    rng_seed: u64,
    source_graph_path: impl Into<String>,
    progress: &dyn ProgressReporter,
) -> Result<InsightCollection> {
    let mut names: Vec<&str> = GRAPH_OPERATOR_NAMES.to_vec();
    names.push("hypothesis");
    run_operators(store, index, config, run_id, rng_seed, source_graph_path, &names, progress)
}

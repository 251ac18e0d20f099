//! Leave-one-out ablation
//!
//! Measures each transform's contribution by rescoring the policy with that
//! transform removed. Scoring is delegated to a caller-supplied `Scorer`.

use crate::policy::Policy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Contributions are rounded to this many decimal places before thresholds
/// are applied, so `0.80 - 0.78` labels as `0.02` and not `0.0200...02`.
const CONTRIBUTION_DECIMALS: i32 = 9;

const HIGH_IMPACT: f64 = 0.05;
const MEDIUM_IMPACT: f64 = 0.01;
const KEEP_ABOVE: f64 = 0.02;
const REMOVE_BELOW: f64 = -0.01;

/// Evaluates a policy, returning a score in `[0, 1]`
///
/// Must be deterministic for a fixed policy seed so ablation is reproducible.
pub trait Scorer: Sync {
    fn score(&self, policy: &Policy) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&Policy) -> f64 + Sync,
{
    fn score(&self, policy: &Policy) -> f64 {
        self(policy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLabel {
    High,
    Medium,
    Low,
}

impl ImpactLabel {
    fn from_contribution(contribution: f64) -> Self {
        match contribution.abs() {
            c if c >= HIGH_IMPACT => ImpactLabel::High,
            c if c > MEDIUM_IMPACT => ImpactLabel::Medium,
            _ => ImpactLabel::Low,
        }
    }
}

/// Contribution of one transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub name: String,
    /// Index of the transform in the analyzed pipeline
    pub position: usize,
    /// 1 = most positively contributing
    pub rank: usize,
    pub baseline_score: f64,
    pub ablated_score: f64,
    pub contribution: f64,
    pub is_helpful: bool,
    pub impact_label: ImpactLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationResult {
    pub policy_name: String,
    pub baseline_score: f64,
    /// Records in rank order
    pub records: Vec<ContributionRecord>,
    pub recommended_keeps: Vec<String>,
    pub recommended_removes: Vec<String>,
    pub scorer_calls: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AblationConfig {
    /// Scorer calls averaged per evaluated policy
    pub n_runs: usize,
    /// When false, lower scores are better and contributions are negated
    pub higher_is_better: bool,
    /// Score the ablated variants on the rayon pool
    pub parallel: bool,
}

impl Default for AblationConfig {
    fn default() -> Self {
        Self {
            n_runs: 1,
            higher_is_better: true,
            parallel: false,
        }
    }
}

pub struct AblationAnalyzer {
    config: AblationConfig,
}

impl AblationAnalyzer {
    pub fn new(config: AblationConfig) -> Self {
        Self {
            config: AblationConfig {
                n_runs: config.n_runs.max(1),
                ..config
            },
        }
    }

    pub fn analyze<S: Scorer + ?Sized>(&self, policy: &Policy, scorer: &S) -> AblationResult {
        let baseline = self.evaluate(policy, scorer);

        let ablated: Vec<f64> = if self.config.parallel {
            (0..policy.len())
                .into_par_iter()
                .map(|i| self.evaluate(&policy.without(i), scorer))
                .collect()
        } else {
            (0..policy.len())
                .map(|i| self.evaluate(&policy.without(i), scorer))
                .collect()
        };

        let sign = if self.config.higher_is_better { 1.0 } else { -1.0 };
        let contributions: Vec<f64> = ablated
            .iter()
            .map(|score| round_contribution(sign * (baseline - score)))
            .collect();

        // stable sort keeps pipeline order among ties
        let mut order: Vec<usize> = (0..policy.len()).collect();
        order.sort_by(|&i, &j| {
            contributions[j]
                .partial_cmp(&contributions[i])
                .unwrap_or(Ordering::Equal)
        });

        let records: Vec<ContributionRecord> = order
            .iter()
            .enumerate()
            .map(|(rank, &i)| {
                let contribution = contributions[i];
                debug!(
                    "Ablation {}: contribution {:+.4}",
                    policy.transforms[i].name, contribution
                );
                ContributionRecord {
                    name: policy.transforms[i].name.clone(),
                    position: i,
                    rank: rank + 1,
                    baseline_score: baseline,
                    ablated_score: ablated[i],
                    contribution,
                    is_helpful: contribution > 0.0,
                    impact_label: ImpactLabel::from_contribution(contribution),
                }
            })
            .collect();

        let recommended_keeps = records
            .iter()
            .filter(|r| r.contribution > KEEP_ABOVE)
            .map(|r| r.name.clone())
            .collect();
        let recommended_removes = records
            .iter()
            .filter(|r| r.contribution < REMOVE_BELOW)
            .map(|r| r.name.clone())
            .collect();

        let scorer_calls = (policy.len() + 1) * self.config.n_runs;
        info!(
            "🔬 Ablation of '{}' finished: {} transforms, baseline {:.4}, {} scorer calls",
            policy.name,
            policy.len(),
            baseline,
            scorer_calls
        );

        AblationResult {
            policy_name: policy.name.clone(),
            baseline_score: baseline,
            records,
            recommended_keeps,
            recommended_removes,
            scorer_calls,
        }
    }

    fn evaluate<S: Scorer + ?Sized>(&self, policy: &Policy, scorer: &S) -> f64 {
        let total: f64 = (0..self.config.n_runs).map(|_| scorer.score(policy)).sum();
        total / self.config.n_runs as f64
    }
}

impl Default for AblationAnalyzer {
    fn default() -> Self {
        Self::new(AblationConfig::default())
    }
}

fn round_contribution(value: f64) -> f64 {
    let scale = 10f64.powi(CONTRIBUTION_DECIMALS);
    (value * scale).round() / scale
}

/// Deterministic stand-in for a model evaluator.
///
/// Each transform name gets a fixed pseudo-random effect derived from the
/// seed; the score is a base accuracy plus the probability-weighted effects.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    seed: u64,
    base: f64,
}

impl HeuristicScorer {
    pub fn new(seed: u64) -> Self {
        Self { seed, base: 0.70 }
    }

    fn effect(&self, transform_name: &str) -> f64 {
        let digest = Sha256::digest(transform_name.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let mut rng = StdRng::seed_from_u64(self.seed ^ u64::from_le_bytes(bytes));
        rng.gen_range(-0.03..0.08)
    }
}

impl Scorer for HeuristicScorer {
    fn score(&self, policy: &Policy) -> f64 {
        let uplift: f64 = policy
            .transforms
            .iter()
            .filter(|t| t.probability.is_finite())
            .map(|t| self.effect(&t.name) * t.probability.clamp(0.0, 1.0))
            .sum();
        (self.base + uplift).clamp(0.0, 1.0)
    }
}

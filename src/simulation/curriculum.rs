//! Curriculum staging
//!
//! Splits a training run into contiguous epoch stages with increasing
//! augmentation strength. Each stage carries the subset of the domain's
//! recommended transforms suited to its difficulty.

use crate::context::GovernanceContext;
use crate::error::GovernanceError;
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Strength schedule over stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Linear,
    Exponential,
    Step,
}

impl Strategy {
    /// Strength of stage `index` out of `num_stages`
    pub fn strength(&self, index: u32, num_stages: u32) -> f64 {
        let x = if num_stages <= 1 {
            0.0
        } else {
            index as f64 / (num_stages - 1) as f64
        };
        match self {
            Strategy::Linear => x,
            Strategy::Exponential => x * x,
            Strategy::Step => {
                let level = ((index + 1) * 3).div_ceil(num_stages.max(1));
                (level as f64 / 3.0).clamp(0.0, 1.0)
            }
        }
    }
}

impl FromStr for Strategy {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Strategy::Linear),
            "exponential" => Ok(Strategy::Exponential),
            "step" => Ok(Strategy::Step),
            other => Err(GovernanceError::InvalidSchedule(format!(
                "unknown strategy '{}', expected linear, exponential or step",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Linear => "linear",
            Strategy::Exponential => "exponential",
            Strategy::Step => "step",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_strength(strength: f64) -> Self {
        if strength < 1.0 / 3.0 {
            Difficulty::Easy
        } else if strength < 2.0 / 3.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    /// How many of `n` recommended transforms a stage of this difficulty uses
    pub fn transform_count(&self, n: usize) -> usize {
        match self {
            Difficulty::Easy => n.div_ceil(3),
            Difficulty::Medium => (2 * n).div_ceil(3),
            Difficulty::Hard => n,
        }
    }
}

/// A stage covers epochs `epoch_start..epoch_end` (end exclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub epoch_start: u32,
    pub epoch_end: u32,
    pub difficulty: Difficulty,
    pub augmentation_strength: f64,
    pub transforms: Vec<String>,
}

impl Stage {
    pub fn epochs(&self) -> u32 {
        self.epoch_end - self.epoch_start
    }

    pub fn covers(&self, epoch: u32) -> bool {
        (self.epoch_start..self.epoch_end).contains(&epoch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumPlan {
    pub domain: String,
    pub strategy: Strategy,
    pub total_epochs: u32,
    pub stages: Vec<Stage>,
}

impl CurriculumPlan {
    /// Stage covering `epoch`, if it is inside the run
    pub fn stage_at(&self, epoch: u32) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.covers(epoch))
    }
}

/// Contiguous `(start, end)` ranges covering `0..total_epochs`; the first
/// `total_epochs % num_stages` stages get one extra epoch.
pub fn partition(total_epochs: u32, num_stages: u32) -> Result<Vec<(u32, u32)>, GovernanceError> {
    if num_stages == 0 {
        return Err(GovernanceError::InvalidSchedule(
            "num_stages must be at least 1".to_string(),
        ));
    }
    if total_epochs < num_stages {
        return Err(GovernanceError::InvalidSchedule(format!(
            "total_epochs ({}) must be at least num_stages ({})",
            total_epochs, num_stages
        )));
    }

    let base = total_epochs / num_stages;
    let remainder = total_epochs % num_stages;
    let mut start = 0;
    Ok((0..num_stages)
        .map(|i| {
            let length = if i < remainder { base + 1 } else { base };
            let range = (start, start + length);
            start += length;
            range
        })
        .collect())
}

/// Stages for `recommended` transforms, listed in catalog order
pub fn build(
    total_epochs: u32,
    num_stages: u32,
    strategy: Strategy,
    recommended: &[String],
) -> Result<Vec<Stage>, GovernanceError> {
    let ranges = partition(total_epochs, num_stages)?;
    Ok(ranges
        .into_iter()
        .enumerate()
        .map(|(i, (epoch_start, epoch_end))| {
            let strength = strategy.strength(i as u32, num_stages);
            let difficulty = Difficulty::from_strength(strength);
            let count = difficulty.transform_count(recommended.len());
            Stage {
                epoch_start,
                epoch_end,
                difficulty,
                augmentation_strength: strength,
                transforms: recommended[..count].to_vec(),
            }
        })
        .collect())
}

/// Copy of `policy` with every probability scaled by `strength`
pub fn scale_policy(policy: &Policy, strength: f64) -> Policy {
    let strength = if strength.is_finite() {
        strength.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let transforms = policy
        .transforms
        .iter()
        .map(|t| {
            let mut scaled = t.clone();
            scaled.probability = (t.probability * strength).clamp(0.0, 1.0);
            scaled
        })
        .collect();
    policy.with_transforms(transforms)
}

pub struct CurriculumBuilder<'a> {
    context: &'a GovernanceContext,
}

impl<'a> CurriculumBuilder<'a> {
    pub fn new(context: &'a GovernanceContext) -> Self {
        Self { context }
    }

    pub fn plan(
        &self,
        domain: &str,
        total_epochs: u32,
        num_stages: u32,
        strategy: Strategy,
    ) -> Result<CurriculumPlan, GovernanceError> {
        if self.context.domain(domain).is_none() {
            warn!("Domain '{}' not found, curriculum stages carry no transforms", domain);
        }
        let recommended = self.context.recommended_in_catalog_order(domain);
        let stages = build(total_epochs, num_stages, strategy, &recommended)?;

        info!(
            "📚 Curriculum for {}: {} epochs in {} {} stages",
            domain,
            total_epochs,
            stages.len(),
            strategy
        );

        Ok(CurriculumPlan {
            domain: domain.to_string(),
            strategy,
            total_epochs,
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Transform;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_linear_three_stages() {
        let stages = build(100, 3, Strategy::Linear, &[]).unwrap();

        let ranges: Vec<(u32, u32)> = stages.iter().map(|s| (s.epoch_start, s.epoch_end)).collect();
        assert_eq!(ranges, vec![(0, 34), (34, 67), (67, 100)]);
        let strengths: Vec<f64> = stages.iter().map(|s| s.augmentation_strength).collect();
        assert_eq!(strengths, vec![0.0, 0.5, 1.0]);
        let difficulties: Vec<Difficulty> = stages.iter().map(|s| s.difficulty).collect();
        assert_eq!(
            difficulties,
            vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        );
    }

    #[test]
    fn test_single_stage_has_zero_strength() {
        let stages = build(10, 1, Strategy::Exponential, &[]).unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!((stages[0].epoch_start, stages[0].epoch_end), (0, 10));
        assert_eq!(stages[0].augmentation_strength, 0.0);
    }

    #[test]
    fn test_exponential_and_step_schedules() {
        let exp: Vec<f64> = (0..5).map(|i| Strategy::Exponential.strength(i, 5)).collect();
        assert_eq!(exp, vec![0.0, 0.0625, 0.25, 0.5625, 1.0]);

        let step: Vec<f64> = (0..6).map(|i| Strategy::Step.strength(i, 6)).collect();
        assert_eq!(
            step,
            vec![1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_stage_transforms_grow_with_difficulty() {
        let recommended = names(&["HorizontalFlip", "VerticalFlip", "Rotate", "GaussNoise", "CLAHE"]);
        let stages = build(30, 3, Strategy::Linear, &recommended).unwrap();

        assert_eq!(stages[0].transforms, names(&["HorizontalFlip", "VerticalFlip"]));
        assert_eq!(stages[1].transforms.len(), 4);
        assert_eq!(stages[2].transforms, recommended);
    }

    #[test]
    fn test_invalid_schedules() {
        assert!(matches!(
            build(10, 0, Strategy::Linear, &[]),
            Err(GovernanceError::InvalidSchedule(_))
        ));
        assert!(matches!(
            build(2, 3, Strategy::Linear, &[]),
            Err(GovernanceError::InvalidSchedule(_))
        ));
        assert!("cosine".parse::<Strategy>().is_err());
        assert_eq!("STEP".parse::<Strategy>().unwrap(), Strategy::Step);
    }

    #[test]
    fn test_plan_uses_domain_recommendations() {
        let context = GovernanceContext::builtin().unwrap();
        let plan = CurriculumBuilder::new(&context)
            .plan("medical", 100, 3, Strategy::Linear)
            .unwrap();

        assert_eq!(plan.stages[0].transforms, names(&["HorizontalFlip", "VerticalFlip"]));
        assert_eq!(plan.stages[2].transforms.len(), 5);
        assert_eq!(plan.stage_at(50).unwrap().difficulty, Difficulty::Medium);
        assert_eq!(plan.stage_at(99).unwrap().difficulty, Difficulty::Hard);
        assert!(plan.stage_at(100).is_none());
    }

    #[test]
    fn test_scale_policy() {
        let policy = Policy::new("p", "natural")
            .with_transform(Transform::new("HorizontalFlip", 0.5))
            .with_transform(Transform::new("Rotate", 0.8));

        let scaled = scale_policy(&policy, 0.5);
        assert_eq!(scaled.transforms[0].probability, 0.25);
        assert_eq!(scaled.transforms[1].probability, 0.4);
        assert_eq!(policy.transforms[1].probability, 0.8);
        assert_eq!(scale_policy(&policy, f64::NAN).transforms[0].probability, 0.0);
    }
}

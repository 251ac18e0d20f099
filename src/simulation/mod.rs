//! Simulation engine for policy analysis
//!
//! Leave-one-out ablation, curriculum staging, and distribution shift
//! estimation over enforced policies.

pub mod ablation;
pub mod curriculum;
pub mod shift;

pub use ablation::{
    AblationAnalyzer, AblationConfig, AblationResult, ContributionRecord, HeuristicScorer,
    ImpactLabel, Scorer,
};
pub use curriculum::{scale_policy, CurriculumBuilder, CurriculumPlan, Difficulty, Stage, Strategy};
pub use shift::{AppliedShift, ShiftPreset, ShiftResult, ShiftSimulator};

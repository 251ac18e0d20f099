//! AugmentFlow - Augmentation Policy Governance
//!
//! Deterministic governance core for image augmentation policies:
//! - Schema: catalog of transforms and their parameter ranges
//! - Domains: per-domain safety constraints (forbidden, conditional, discouraged)
//! - Enforcement: correct a proposed policy so it is valid for its domain
//! - Versioning: structural diffs and a store of committed revisions
//! - Simulation: ablation ranking, curriculum staging, shift estimation

pub mod config;
pub mod context;
pub mod domains;
pub mod enforcement;
pub mod error;
pub mod models;
pub mod policy;
pub mod routes;
pub mod schema;
pub mod simulation;
pub mod state;
pub mod versioning;

pub use context::GovernanceContext;
pub use enforcement::{EnforcementResult, RuleEnforcer, SafetyValidator};
pub use error::{AppError, GovernanceError};
pub use policy::{ParamValue, Policy, Transform};
pub use simulation::{AblationAnalyzer, CurriculumBuilder, ShiftSimulator};
pub use versioning::{DiffResult, PolicyDiffer, PolicyStore};

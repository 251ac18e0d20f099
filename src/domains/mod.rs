//! Domain Rule Set
//!
//! Per-domain tables of constraints over transform names, populated from
//! declarative definitions.

pub mod catalog;
pub mod loader;
pub mod rules;

pub use catalog::builtin_rules;
pub use loader::{ConstraintDefinition, DomainDefinition, LevelName};
pub use rules::{ConstraintLevel, Domain, DomainConstraint, DomainRuleSet, DomainSummary, ParameterLimits};

//! Safety Validator / Rule Enforcer
//!
//! The enforcer corrects policies; the validator audits them.

pub mod enforcer;
pub mod validator;

pub use enforcer::{ClampedParameter, EnforcementResult, RemovedTransform, RuleEnforcer};
pub use validator::{QuickCheck, RuleViolation, SafetyValidator, Severity, ValidationReport, ValidationSummary};

//! Domain constraint tables
//!
//! Each domain is a flat table keyed by transform name. There is no
//! inheritance between domains: shared rules are copied in at load time.

use crate::error::GovernanceError;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Per-parameter `(min, max)` bounds imposed by a domain
pub type ParameterLimits = IndexMap<String, (f64, f64)>;

/// Severity of a domain rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum ConstraintLevel {
    /// Never allowed; the enforcer drops the transform
    Forbidden,
    Recommended,
    /// Allowed within the given parameter limits
    Conditional { parameter_limits: ParameterLimits },
    /// Allowed with a warning, optionally within parameter limits
    Discouraged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter_limits: Option<ParameterLimits>,
    },
}

impl ConstraintLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ConstraintLevel::Forbidden => "forbidden",
            ConstraintLevel::Recommended => "recommended",
            ConstraintLevel::Conditional { .. } => "conditional",
            ConstraintLevel::Discouraged { .. } => "discouraged",
        }
    }
}

/// A domain rule over one transform name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConstraint {
    pub transform_name: String,
    #[serde(flatten)]
    pub level: ConstraintLevel,
    pub reason: String,
}

impl DomainConstraint {
    pub fn new(transform_name: impl Into<String>, level: ConstraintLevel, reason: impl Into<String>) -> Self {
        Self {
            transform_name: transform_name.into(),
            level,
            reason: reason.into(),
        }
    }

    pub fn forbidden(transform_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(transform_name, ConstraintLevel::Forbidden, reason)
    }

    pub fn conditional(
        transform_name: impl Into<String>,
        reason: impl Into<String>,
        parameter_limits: ParameterLimits,
    ) -> Self {
        Self::new(transform_name, ConstraintLevel::Conditional { parameter_limits }, reason)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self.level, ConstraintLevel::Forbidden)
    }

    pub fn is_discouraged(&self) -> bool {
        matches!(self.level, ConstraintLevel::Discouraged { .. })
    }

    /// Parameter limits the enforcer applies for this constraint
    pub fn parameter_limits(&self) -> Option<&ParameterLimits> {
        match &self.level {
            ConstraintLevel::Conditional { parameter_limits } => Some(parameter_limits),
            ConstraintLevel::Discouraged { parameter_limits } => parameter_limits.as_ref(),
            _ => None,
        }
    }
}

/// Constraint table for one application domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub constraints: IndexMap<String, DomainConstraint>,
    pub recommended_transforms: IndexSet<String>,
}

impl Domain {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            constraints: IndexMap::new(),
            recommended_transforms: IndexSet::new(),
        }
    }

    /// Add a constraint; a later constraint for the same transform replaces
    /// the earlier one.
    pub fn add_constraint(&mut self, constraint: DomainConstraint) {
        self.constraints.insert(constraint.transform_name.clone(), constraint);
    }

    pub fn recommend(&mut self, transform_name: impl Into<String>) {
        self.recommended_transforms.insert(transform_name.into());
    }

    pub fn lookup(&self, transform_name: &str) -> Option<&DomainConstraint> {
        self.constraints.get(transform_name)
    }

    pub fn is_forbidden(&self, transform_name: &str) -> bool {
        self.lookup(transform_name).is_some_and(DomainConstraint::is_forbidden)
    }

    pub fn forbidden_transforms(&self) -> Vec<&str> {
        self.constraints
            .values()
            .filter(|c| c.is_forbidden())
            .map(|c| c.transform_name.as_str())
            .collect()
    }

    pub fn summary(&self) -> DomainSummary {
        DomainSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            forbidden_count: self.forbidden_transforms().len(),
            recommended_count: self.recommended_transforms.len(),
            constraint_count: self.constraints.len(),
        }
    }
}

/// Listing view of a domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    pub name: String,
    pub description: String,
    pub forbidden_count: usize,
    pub recommended_count: usize,
    pub constraint_count: usize,
}

/// Read-only lookup of domain tables by name
#[derive(Debug, Clone, Default)]
pub struct DomainRuleSet {
    domains: IndexMap<String, Domain>,
}

impl DomainRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a domain by name
    pub fn insert(&mut self, domain: Domain) {
        self.domains.insert(domain.name.clone(), domain);
    }

    pub fn get(&self, name: &str) -> Result<&Domain, GovernanceError> {
        self.domains
            .get(name)
            .ok_or_else(|| GovernanceError::DomainNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.domains.contains_key(name)
    }

    pub fn lookup(&self, domain: &str, transform_name: &str) -> Option<&DomainConstraint> {
        self.domains.get(domain)?.lookup(transform_name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.domains.keys().map(String::as_str).collect()
    }

    pub fn list(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

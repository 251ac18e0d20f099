//! Domain definition loader
//!
//! Builds `Domain` tables from declarative YAML/JSON definitions.

use super::rules::{ConstraintLevel, Domain, DomainConstraint, DomainRuleSet, ParameterLimits};
use crate::error::GovernanceError;
use crate::schema::{SchemaRegistry, TransformCategory};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelName {
    Forbidden,
    Recommended,
    Conditional,
    Discouraged,
}

/// One constraint entry of a domain definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    pub transform_name: String,
    pub level: LevelName,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_limits: Option<ParameterLimits>,
}

/// Declarative description of a domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Domain whose table is copied in before this definition's entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDefinition>,
    /// Every registered transform in these categories is forbidden
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_categories: Vec<TransformCategory>,
    #[serde(default)]
    pub recommended_transforms: Vec<String>,
}

impl ConstraintDefinition {
    fn into_constraint(self, domain: &str) -> Result<DomainConstraint, GovernanceError> {
        if let Some(limits) = &self.parameter_limits {
            for (param, (lo, hi)) in limits {
                if !lo.is_finite() || !hi.is_finite() || lo > hi {
                    return Err(GovernanceError::DomainDefinition(format!(
                        "{}: limits for {}.{} must be finite with min <= max",
                        domain, self.transform_name, param
                    )));
                }
            }
        }

        let level = match (self.level, self.parameter_limits) {
            (LevelName::Forbidden, limits) => {
                if limits.is_some() {
                    warn!(
                        "⚠️ Ignoring parameter limits on forbidden {} in domain {}",
                        self.transform_name, domain
                    );
                }
                ConstraintLevel::Forbidden
            }
            (LevelName::Recommended, None) => ConstraintLevel::Recommended,
            // Limits on a recommended entry make it conditional on those limits
            (LevelName::Recommended, Some(parameter_limits))
            | (LevelName::Conditional, Some(parameter_limits)) => {
                ConstraintLevel::Conditional { parameter_limits }
            }
            (LevelName::Conditional, None) => {
                return Err(GovernanceError::DomainDefinition(format!(
                    "{}: conditional constraint on {} requires parameter_limits",
                    domain, self.transform_name
                )))
            }
            (LevelName::Discouraged, parameter_limits) => {
                ConstraintLevel::Discouraged { parameter_limits }
            }
        };

        Ok(DomainConstraint::new(self.transform_name, level, self.reason))
    }
}

impl DomainDefinition {
    /// Build a flat domain table. `existing` resolves `extends`.
    pub fn build(
        self,
        registry: &SchemaRegistry,
        existing: &DomainRuleSet,
    ) -> Result<Domain, GovernanceError> {
        if self.name.trim().is_empty() {
            return Err(GovernanceError::DomainDefinition(
                "domain name must not be empty".to_string(),
            ));
        }

        let mut domain = match &self.extends {
            Some(parent) => {
                let base = existing.get(parent).map_err(|_| {
                    GovernanceError::DomainDefinition(format!(
                        "{} extends unknown domain {}",
                        self.name, parent
                    ))
                })?;
                let mut copy = base.clone();
                copy.name = self.name.clone();
                copy.description = self.description.clone();
                copy
            }
            None => Domain::new(self.name.clone(), self.description.clone()),
        };

        for definition in self.constraints {
            if !registry.contains(&definition.transform_name) {
                return Err(GovernanceError::DomainDefinition(format!(
                    "{}: constraint names unknown transform {}",
                    self.name, definition.transform_name
                )));
            }
            domain.add_constraint(definition.into_constraint(&self.name)?);
        }

        // category bans win over per-transform entries; explicit reasons are kept
        for category in &self.forbidden_categories {
            for spec in registry.list().filter(|spec| spec.category == *category) {
                if domain.is_forbidden(&spec.name) {
                    continue;
                }
                if domain.lookup(&spec.name).is_some() {
                    warn!(
                        "⚠️ {} overrides its {} constraint: category {} is forbidden",
                        self.name,
                        spec.name,
                        category.as_str()
                    );
                }
                domain.add_constraint(DomainConstraint::forbidden(
                    spec.name.clone(),
                    format!(
                        "Transform category '{}' is forbidden in {} domain",
                        category.as_str(),
                        self.name
                    ),
                ));
            }
        }

        for name in self.recommended_transforms {
            if !registry.contains(&name) {
                return Err(GovernanceError::DomainDefinition(format!(
                    "{}: recommends unknown transform {}",
                    self.name, name
                )));
            }
            domain.recommend(name);
        }

        Ok(domain)
    }
}

pub fn parse_definitions(text: &str) -> Result<Vec<DomainDefinition>, GovernanceError> {
    serde_yaml::from_str(text).map_err(|e| GovernanceError::DomainDefinition(e.to_string()))
}

/// Parse definitions and insert them into `rules` in order, so later
/// definitions may extend earlier ones. Returns the number loaded.
pub fn load_into(
    rules: &mut DomainRuleSet,
    registry: &SchemaRegistry,
    text: &str,
) -> Result<usize, GovernanceError> {
    let definitions = parse_definitions(text)?;
    let count = definitions.len();
    for definition in definitions {
        let domain = definition.build(registry, rules)?;
        tracing::debug!(
            "Loaded domain {} ({} constraints, {} recommended)",
            domain.name,
            domain.constraints.len(),
            domain.recommended_transforms.len()
        );
        rules.insert(domain);
    }
    Ok(count)
}

pub fn load_file(
    rules: &mut DomainRuleSet,
    registry: &SchemaRegistry,
    path: &Path,
) -> Result<usize, GovernanceError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        GovernanceError::DomainDefinition(format!("cannot read {}: {}", path.display(), e))
    })?;
    let count = load_into(rules, registry, &text)?;
    info!("📚 Loaded {} domain definitions from {}", count, path.display());
    Ok(count)
}

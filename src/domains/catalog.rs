//! Built-in domain tables

use super::loader;
use super::rules::DomainRuleSet;
use crate::error::GovernanceError;
use crate::schema::SchemaRegistry;

const BUILTIN_DOMAINS: &str = include_str!("builtin.yaml");

/// Rule set holding the built-in medical, OCR, satellite and natural domains
/// with their task variants.
pub fn builtin_rules(registry: &SchemaRegistry) -> Result<DomainRuleSet, GovernanceError> {
    let mut rules = DomainRuleSet::new();
    loader::load_into(&mut rules, registry, BUILTIN_DOMAINS)?;
    Ok(rules)
}

//! Safety validator
//!
//! Audits a policy against its domain without correcting it. Where the
//! enforcer fixes problems, the validator reports them as rule violations so
//! a reviewer can see what enforcement would change.

use crate::context::GovernanceContext;
use crate::domains::Domain;
use crate::policy::{Policy, Transform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Violation severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    /// Enforcement would drop the transform
    Block,
}

/// A rule violation found in a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule_id: String,
    pub transform_name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub blockers: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

/// Non-correcting audit of a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub policy_name: String,
    pub domain: String,
    pub is_valid: bool,
    pub violations: Vec<RuleViolation>,
    pub summary: ValidationSummary,
    pub suggestions: Vec<String>,
}

/// Result of a single-transform lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCheck {
    pub transform_name: String,
    pub allowed: bool,
    pub reason: String,
    pub alternatives: Vec<String>,
}

/// Safe replacements for transforms commonly forbidden somewhere
fn alternatives_for(name: &str) -> &'static [&'static str] {
    match name {
        "ElasticTransform" => &["ShiftScaleRotate", "Affine", "Rotate"],
        "GridDistortion" => &["ShiftScaleRotate", "Affine"],
        "OpticalDistortion" => &["RandomScale", "Affine"],
        "ColorJitter" | "HueSaturationValue" => &["RandomBrightnessContrast"],
        "RGBShift" | "ChannelShuffle" | "FancyPCA" => &["RandomBrightnessContrast"],
        "MotionBlur" | "Defocus" | "ZoomBlur" => &["GaussianBlur"],
        "Posterize" | "Solarize" | "Equalize" => &["RandomBrightnessContrast", "CLAHE"],
        _ => &[],
    }
}

pub struct SafetyValidator<'a> {
    context: &'a GovernanceContext,
}

impl<'a> SafetyValidator<'a> {
    pub fn new(context: &'a GovernanceContext) -> Self {
        Self { context }
    }

    /// Audit `policy` against `policy.domain`
    pub fn validate(&self, policy: &Policy) -> ValidationReport {
        let domain = self.context.domains.get(&policy.domain).ok();
        let mut violations = Vec::new();

        if domain.is_none() {
            violations.push(RuleViolation {
                rule_id: "V000".to_string(),
                transform_name: String::new(),
                severity: Severity::Warning,
                message: format!("Domain '{}' not found; only schema ranges checked", policy.domain),
                suggestion: Some(format!(
                    "Use one of: {}",
                    self.context.domains.names().join(", ")
                )),
            });
        }

        for transform in &policy.transforms {
            if !self.context.registry.contains(&transform.name) {
                violations.push(RuleViolation {
                    rule_id: "V001".to_string(),
                    transform_name: transform.name.clone(),
                    severity: Severity::Block,
                    message: format!("Unknown transform '{}'", transform.name),
                    suggestion: None,
                });
                continue;
            }
            violations.extend(self.check_forbidden(transform, domain));
            violations.extend(self.check_probability(transform));
            violations.extend(self.check_parameters(transform, domain));
            violations.extend(self.check_discouraged(transform, domain));
        }
        violations.extend(self.check_duplicates(policy));

        let suggestions = match domain {
            Some(domain) => self.missing_recommended(policy, domain),
            None => Vec::new(),
        };
        for name in &suggestions {
            violations.push(RuleViolation {
                rule_id: "V007".to_string(),
                transform_name: name.clone(),
                severity: Severity::Info,
                message: format!("Recommended transform '{}' is not in the policy", name),
                suggestion: Some(format!("Consider adding {}", name)),
            });
        }

        let mut counts: HashMap<Severity, usize> = HashMap::new();
        for v in &violations {
            *counts.entry(v.severity).or_insert(0) += 1;
        }
        let count = |s: Severity| counts.get(&s).copied().unwrap_or(0);
        let summary = ValidationSummary {
            total: violations.len(),
            blockers: count(Severity::Block),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
        };

        ValidationReport {
            policy_name: policy.name.clone(),
            domain: policy.domain.clone(),
            is_valid: summary.blockers == 0 && summary.errors == 0,
            violations,
            summary,
            suggestions,
        }
    }

    /// Replacements for `transform_name` that `domain` does not forbid
    pub fn suggest_alternatives(&self, domain: &str, transform_name: &str) -> Vec<String> {
        let table = self.context.domain(domain);
        alternatives_for(transform_name)
            .iter()
            .filter(|alt| !table.is_some_and(|d| d.is_forbidden(alt)))
            .map(|alt| alt.to_string())
            .collect()
    }

    /// Whether a single transform may be used in `domain`, and why
    pub fn quick_check(&self, domain: &str, transform_name: &str) -> QuickCheck {
        let (allowed, reason) = if !self.context.registry.contains(transform_name) {
            (false, format!("Unknown transform '{}'", transform_name))
        } else {
            match self.context.domains.lookup(domain, transform_name) {
                Some(c) if c.is_forbidden() => (false, c.reason.clone()),
                Some(c) if c.is_discouraged() => (true, format!("Allowed with caution: {}", c.reason)),
                Some(c) if c.parameter_limits().is_some() => {
                    (true, format!("Allowed within limits: {}", c.reason))
                }
                _ => (true, "Allowed".to_string()),
            }
        };
        let alternatives = if allowed {
            Vec::new()
        } else {
            self.suggest_alternatives(domain, transform_name)
        };
        QuickCheck {
            transform_name: transform_name.to_string(),
            allowed,
            reason,
            alternatives,
        }
    }

    fn check_forbidden(&self, transform: &Transform, domain: Option<&Domain>) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let Some(domain) = domain else {
            return violations;
        };
        if let Some(c) = domain.lookup(&transform.name).filter(|c| c.is_forbidden()) {
            let alternatives = self.suggest_alternatives(&domain.name, &transform.name);
            violations.push(RuleViolation {
                rule_id: "V002".to_string(),
                transform_name: transform.name.clone(),
                severity: Severity::Block,
                message: format!("'{}' is forbidden for {}: {}", transform.name, domain.name, c.reason),
                suggestion: (!alternatives.is_empty())
                    .then(|| format!("Use instead: {}", alternatives.join(", "))),
            });
        }
        violations
    }

    fn check_probability(&self, transform: &Transform) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        if !(0.0..=1.0).contains(&transform.probability) {
            violations.push(RuleViolation {
                rule_id: "V003".to_string(),
                transform_name: transform.name.clone(),
                severity: Severity::Error,
                message: format!(
                    "Probability {} of '{}' is outside [0, 1]",
                    transform.probability, transform.name
                ),
                suggestion: Some("Enforcement clamps probabilities into [0, 1]".to_string()),
            });
        }
        violations
    }

    fn check_parameters(&self, transform: &Transform, domain: Option<&Domain>) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let Ok(spec) = self.context.registry.get(&transform.name) else {
            return violations;
        };
        let limits = domain
            .and_then(|d| d.lookup(&transform.name))
            .and_then(|c| c.parameter_limits());

        for (key, value) in &transform.parameters {
            let Some(range) = spec.parameters.get(key) else {
                violations.push(RuleViolation {
                    rule_id: "V004".to_string(),
                    transform_name: transform.name.clone(),
                    severity: Severity::Info,
                    message: format!("Unknown parameter '{}' on '{}'", key, transform.name),
                    suggestion: None,
                });
                continue;
            };
            let range = match limits.and_then(|l| l.get(key)) {
                Some(&(lo, hi)) => range.narrowed(lo, hi),
                None => range.clone(),
            };
            match range.clamp_value(&transform.name, value) {
                Ok(bounded) if !bounded.same_magnitude(value) => violations.push(RuleViolation {
                    rule_id: "V005".to_string(),
                    transform_name: transform.name.clone(),
                    severity: Severity::Error,
                    message: format!(
                        "{}.{} = {} is outside the allowed range [{}, {}]",
                        transform.name, key, value, range.min, range.max
                    ),
                    suggestion: Some(format!("Use {}", bounded)),
                }),
                Ok(_) => {}
                Err(e) => violations.push(RuleViolation {
                    rule_id: "V005".to_string(),
                    transform_name: transform.name.clone(),
                    severity: Severity::Error,
                    message: e.to_string(),
                    suggestion: None,
                }),
            }
        }

        // limited parameters left unset are enforced at their schema default
        for (key, &(lo, hi)) in limits.into_iter().flatten() {
            if transform.parameters.contains_key(key) {
                continue;
            }
            let Some(schema) = spec.parameters.get(key) else {
                continue;
            };
            let range = schema.narrowed(lo, hi);
            let default = schema.default_value();
            if let Ok(bounded) = range.clamp_value(&transform.name, &default) {
                if !bounded.same_magnitude(&default) {
                    violations.push(RuleViolation {
                        rule_id: "V005".to_string(),
                        transform_name: transform.name.clone(),
                        severity: Severity::Error,
                        message: format!(
                            "{}.{} is unset and its default {} is outside the allowed range [{}, {}]",
                            transform.name, key, default, range.min, range.max
                        ),
                        suggestion: Some(format!("Set {} to {}", key, bounded)),
                    });
                }
            }
        }
        violations
    }

    fn check_discouraged(&self, transform: &Transform, domain: Option<&Domain>) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        if let Some(c) = domain
            .and_then(|d| d.lookup(&transform.name))
            .filter(|c| c.is_discouraged())
        {
            violations.push(RuleViolation {
                rule_id: "V006".to_string(),
                transform_name: transform.name.clone(),
                severity: Severity::Warning,
                message: format!("'{}' is discouraged: {}", transform.name, c.reason),
                suggestion: Some("Keep its probability low".to_string()),
            });
        }
        violations
    }

    /// Duplicate names are legal but pair by position in diffs
    fn check_duplicates(&self, policy: &Policy) -> Vec<RuleViolation> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for t in &policy.transforms {
            *seen.entry(t.name.as_str()).or_insert(0) += 1;
        }
        let mut violations = Vec::new();
        let mut reported = std::collections::HashSet::new();
        for t in &policy.transforms {
            let n = seen[t.name.as_str()];
            if n > 1 && reported.insert(t.name.as_str()) {
                violations.push(RuleViolation {
                    rule_id: "V008".to_string(),
                    transform_name: t.name.clone(),
                    severity: Severity::Warning,
                    message: format!("'{}' appears {} times in the pipeline", t.name, n),
                    suggestion: Some("Merge duplicates into a single transform".to_string()),
                });
            }
        }
        violations
    }

    fn missing_recommended(&self, policy: &Policy, domain: &Domain) -> Vec<String> {
        domain
            .recommended_transforms
            .iter()
            .filter(|name| !policy.contains(name))
            .cloned()
            .collect()
    }
}

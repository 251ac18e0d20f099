//! Rule enforcer
//!
//! Corrects a policy so it complies with its domain: forbidden transforms are
//! dropped, limited parameters are clamped, probabilities are clamped to
//! `[0, 1]`. Every correction is reported in the result.

use crate::context::GovernanceContext;
use crate::domains::Domain;
use crate::error::GovernanceError;
use crate::policy::{ParamValue, Parameters, Policy, Transform};
use crate::schema::{ParameterRange, TransformSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A transform dropped by enforcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedTransform {
    pub transform_name: String,
    pub reason: String,
}

/// A value changed by enforcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampedParameter {
    pub transform_name: String,
    pub parameter_name: String,
    pub old: ParamValue,
    pub new: ParamValue,
}

/// Outcome of enforcing a policy against its domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub policy: Policy,
    pub removed: Vec<RemovedTransform>,
    pub clamped: Vec<ClampedParameter>,
    pub warnings: Vec<String>,
}

impl EnforcementResult {
    /// True when enforcement changed nothing
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.clamped.is_empty()
    }
}

/// Pseudo-parameter name used when reporting probability clamps
pub const PROBABILITY: &str = "probability";

pub struct RuleEnforcer<'a> {
    context: &'a GovernanceContext,
}

impl<'a> RuleEnforcer<'a> {
    pub fn new(context: &'a GovernanceContext) -> Self {
        Self { context }
    }

    /// Enforce `policy` against the rules of `policy.domain`.
    ///
    /// Fails only for transforms missing from the registry or parameters
    /// that cannot be coerced to their declared type. An unknown domain
    /// means no domain constraints, reported as a warning.
    pub fn enforce(&self, policy: &Policy) -> Result<EnforcementResult, GovernanceError> {
        let mut warnings = Vec::new();
        let domain = match self.context.domains.get(&policy.domain) {
            Ok(domain) => Some(domain),
            Err(_) => {
                warn!("⚠️ Domain '{}' not found, enforcing schema ranges only", policy.domain);
                warnings.push(format!(
                    "Domain '{}' not found; no domain constraints applied",
                    policy.domain
                ));
                None
            }
        };

        let mut kept = Vec::with_capacity(policy.transforms.len());
        let mut removed = Vec::new();
        let mut clamped = Vec::new();

        for transform in &policy.transforms {
            let spec = self.context.registry.get(&transform.name)?;
            let constraint = domain.and_then(|d| d.lookup(&transform.name));

            if let Some(c) = constraint.filter(|c| c.is_forbidden()) {
                debug!("Removing forbidden transform {} ({})", transform.name, policy.domain);
                removed.push(RemovedTransform {
                    transform_name: transform.name.clone(),
                    reason: c.reason.clone(),
                });
                continue;
            }

            if let Some(c) = constraint.filter(|c| c.is_discouraged()) {
                warnings.push(format!(
                    "'{}' is discouraged for {}: {}",
                    transform.name, policy.domain, c.reason
                ));
            }

            for key in self
                .context
                .registry
                .unknown_parameters(&transform.name, &transform.parameters)?
            {
                warnings.push(format!(
                    "{}: unknown parameter '{}' passed through unchanged",
                    transform.name, key
                ));
            }

            let limits = constraint.and_then(|c| c.parameter_limits());
            let (adjusted, changes) = Self::clamp_transform(spec, transform, limits)?;
            for change in &changes {
                debug!(
                    "Clamped {}.{}: {} -> {}",
                    change.transform_name, change.parameter_name, change.old, change.new
                );
            }
            clamped.extend(changes);
            kept.push(adjusted);
        }

        if let Some(domain) = domain {
            warnings.extend(Self::missing_recommendations(domain, &kept));
        }

        info!(
            "🛡️ Enforced policy '{}' for {}: {} kept, {} removed, {} clamped",
            policy.name,
            policy.domain,
            kept.len(),
            removed.len(),
            clamped.len()
        );

        Ok(EnforcementResult {
            policy: policy.with_transforms(kept),
            removed,
            clamped,
            warnings,
        })
    }

    /// Clamp one transform's probability and parameters. Domain limits are
    /// intersected with the schema range; a limited parameter left unset is
    /// checked at its schema default and written back only if that changes.
    fn clamp_transform(
        spec: &TransformSpec,
        transform: &Transform,
        limits: Option<&IndexMap<String, (f64, f64)>>,
    ) -> Result<(Transform, Vec<ClampedParameter>), GovernanceError> {
        let name = &transform.name;
        let mut changes = Vec::new();

        let probability = if transform.probability.is_finite() {
            transform.probability.clamp(0.0, 1.0)
        } else {
            spec.default_probability
        };
        if probability != transform.probability {
            changes.push(ClampedParameter {
                transform_name: name.clone(),
                parameter_name: PROBABILITY.to_string(),
                old: ParamValue::Float(transform.probability),
                new: ParamValue::Float(probability),
            });
        }

        let mut parameters: Parameters = transform
            .parameters
            .iter()
            .map(|(key, value)| {
                let value = match spec.parameters.get(key) {
                    Some(range) => range.clamp_value(name, value)?,
                    None => value.clone(),
                };
                Ok((key.clone(), value))
            })
            .collect::<Result<_, GovernanceError>>()?;
        let mut defaulted: IndexMap<String, ParamValue> = IndexMap::new();

        for (param, &(lo, hi)) in limits.into_iter().flatten() {
            let range = match spec.parameters.get(param) {
                Some(range) => range.narrowed(lo, hi),
                None => ParameterRange::float(param, lo, hi, lo),
            };
            let current = match parameters.get(param) {
                Some(value) => value.clone(),
                None => match spec.parameters.get(param) {
                    Some(spec_range) => {
                        let default = spec_range.default_value();
                        defaulted.insert(param.clone(), default.clone());
                        default
                    }
                    None => continue,
                },
            };
            let bounded = range.clamp_value(name, &current)?;
            if parameters.contains_key(param) || !bounded.same_magnitude(&current) {
                parameters.insert(param.clone(), bounded);
            }
        }

        for (key, new) in &parameters {
            let old = transform
                .parameters
                .get(key)
                .or_else(|| defaulted.get(key));
            if let Some(old) = old.filter(|old| !old.same_magnitude(new)) {
                changes.push(ClampedParameter {
                    transform_name: name.clone(),
                    parameter_name: key.clone(),
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }

        let adjusted = Transform {
            name: name.clone(),
            probability,
            parameters,
        };
        Ok((adjusted, changes))
    }

    fn missing_recommendations(domain: &Domain, kept: &[Transform]) -> Vec<String> {
        domain
            .recommended_transforms
            .iter()
            .filter(|name| !kept.iter().any(|t| &t.name == *name))
            .map(|name| format!("Suggestion: consider adding recommended transform '{}'", name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> GovernanceContext {
        GovernanceContext::builtin().unwrap()
    }

    #[test]
    fn test_forbidden_transform_removed() {
        let context = context();
        let policy = Policy::new("p", "medical")
            .with_transform(Transform::new("HorizontalFlip", 0.5))
            .with_transform(Transform::new("ElasticTransform", 0.8));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transform_names(), vec!["HorizontalFlip"]);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].transform_name, "ElasticTransform");
        assert!(result.removed[0].reason.starts_with("Elastic deformation"));
        assert!(result.clamped.is_empty());
    }

    #[test]
    fn test_conditional_limits_clamp() {
        let context = context();
        let policy = Policy::new("p", "medical")
            .with_transform(Transform::new("Rotate", 0.5).with_param("limit", 40i64));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].parameters["limit"], ParamValue::Int(15));
        assert_eq!(
            result.clamped,
            vec![ClampedParameter {
                transform_name: "Rotate".into(),
                parameter_name: "limit".into(),
                old: ParamValue::Int(40),
                new: ParamValue::Int(15),
            }]
        );
    }

    #[test]
    fn test_unset_limited_parameter_is_defaulted_then_clamped() {
        let context = context();
        // schema default limit is 45, medical allows at most 15
        let policy = Policy::new("p", "medical").with_transform(Transform::new("Rotate", 0.5));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].parameters["limit"], ParamValue::Int(15));
        assert_eq!(result.clamped[0].old, ParamValue::Int(45));
    }

    #[test]
    fn test_unset_parameter_within_limits_stays_unset() {
        let context = context();
        // default var_limit 0.02 already sits inside medical's (0.0, 0.02)
        let policy = Policy::new("p", "medical").with_transform(Transform::new("GaussNoise", 0.3));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert!(result.policy.transforms[0].parameters.is_empty());
        assert!(result.clamped.is_empty());
    }

    #[test]
    fn test_tuple_parameter_clamped_elementwise() {
        let context = context();
        let policy = Policy::new("p", "medical").with_transform(
            Transform::new("GaussianBlur", 0.2).with_param("blur_limit", (3.0, 9.0)),
        );

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(
            result.policy.transforms[0].parameters["blur_limit"],
            ParamValue::Tuple(vec![3.0, 5.0])
        );
        assert!(result.warnings.iter().any(|w| w.contains("discouraged")));
    }

    #[test]
    fn test_probability_clamped_regardless_of_domain() {
        let context = context();
        let policy = Policy::new("p", "natural")
            .with_transform(Transform::new("HorizontalFlip", 1.7))
            .with_transform(Transform::new("VerticalFlip", -0.2));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].probability, 1.0);
        assert_eq!(result.policy.transforms[1].probability, 0.0);
        assert_eq!(result.clamped.len(), 2);
        assert!(result.clamped.iter().all(|c| c.parameter_name == PROBABILITY));
    }

    #[test]
    fn test_schema_clamp_without_constraint() {
        let context = context();
        let policy = Policy::new("p", "natural")
            .with_transform(Transform::new("MotionBlur", 0.3).with_param("blur_limit", 99i64));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].parameters["blur_limit"], ParamValue::Int(15));
    }

    #[test]
    fn test_type_coercion_is_not_reported_as_clamp() {
        let context = context();
        let policy = Policy::new("p", "natural")
            .with_transform(Transform::new("Rotate", 0.5).with_param("limit", 10.0));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].parameters["limit"], ParamValue::Int(10));
        assert!(result.clamped.is_empty());
    }

    #[test]
    fn test_unknown_domain_passes_through_with_warning() {
        let context = context();
        let policy = Policy::new("p", "xray")
            .with_transform(Transform::new("ElasticTransform", 0.8));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transform_names(), vec!["ElasticTransform"]);
        assert!(result.warnings[0].contains("xray"));
    }

    #[test]
    fn test_unknown_transform_is_fatal() {
        let context = context();
        let policy = Policy::new("p", "natural").with_transform(Transform::new("Warp", 0.5));

        assert_eq!(
            RuleEnforcer::new(&context).enforce(&policy).unwrap_err(),
            GovernanceError::UnknownTransform("Warp".into())
        );
    }

    #[test]
    fn test_unknown_parameter_warns() {
        let context = context();
        let policy = Policy::new("p", "natural")
            .with_transform(Transform::new("Rotate", 0.5).with_param("border_mode", 4i64));

        let result = RuleEnforcer::new(&context).enforce(&policy).unwrap();

        assert_eq!(result.policy.transforms[0].parameters["border_mode"], ParamValue::Int(4));
        assert!(result.warnings.iter().any(|w| w.contains("border_mode")));
    }

    #[test]
    fn test_enforce_is_idempotent() {
        let context = context();
        let policy = Policy::new("p", "ocr")
            .with_transform(Transform::new("Rotate", 1.4).with_param("limit", -90i64))
            .with_transform(Transform::new("MotionBlur", 0.4))
            .with_transform(
                Transform::new("ShiftScaleRotate", 0.5).with_param("shift_limit", 0.25),
            )
            .with_transform(Transform::new("Perspective", 0.3));

        let enforcer = RuleEnforcer::new(&context);
        let first = enforcer.enforce(&policy).unwrap();
        let second = enforcer.enforce(&first.policy).unwrap();

        assert!(!first.is_clean());
        assert!(second.is_clean());
        assert_eq!(second.policy, first.policy);
    }

    #[test]
    fn test_input_policy_is_not_mutated() {
        let context = context();
        let policy = Policy::new("p", "medical")
            .with_transform(Transform::new("Rotate", 0.5).with_param("limit", 40i64));
        let before = policy.clone();

        RuleEnforcer::new(&context).enforce(&policy).unwrap();
        assert_eq!(policy, before);
    }
}

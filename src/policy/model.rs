//! Policy value objects
//!
//! A `Policy` is an ordered pipeline of `Transform`s for one domain. Every
//! operation that changes a policy returns a new value.

use crate::error::GovernanceError;
use crate::schema::SchemaRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter map keyed by parameter name, in insertion order
pub type Parameters = IndexMap<String, ParamValue>;

/// A single transform parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Tuple(Vec<f64>),
    Text(String),
}

impl ParamValue {
    /// Scalar numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Structural equality where NaN equals NaN
    pub fn same_as(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (ParamValue::Float(a), ParamValue::Float(b)) => float_eq(*a, *b),
            (ParamValue::Tuple(a), ParamValue::Tuple(b)) => tuple_eq(a, b),
            _ => self == other,
        }
    }

    /// Equal as numbers, so `Int(10)` matches `Float(10.0)`
    pub fn same_magnitude(&self, other: &ParamValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => float_eq(a, b),
            _ => self.same_as(other),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Tuple(_) => "tuple",
            ParamValue::Text(_) => "string",
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn tuple_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| float_eq(*x, *y))
}

/// Map equality built on [`ParamValue::same_as`]
pub fn parameters_eq(a: &Parameters, b: &Parameters) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value.same_as(other)))
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<(f64, f64)> for ParamValue {
    fn from((lo, hi): (f64, f64)) -> Self {
        ParamValue::Tuple(vec![lo, hi])
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Tuple(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

fn default_probability() -> f64 {
    0.5
}

/// A named operation with an application probability and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub name: String,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Parameters,
}

impl Transform {
    /// Same probability and parameters, with NaN equal to itself
    pub fn same_settings(&self, other: &Transform) -> bool {
        float_eq(self.probability, other.probability)
            && parameters_eq(&self.parameters, &other.parameters)
    }

    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            parameters: Parameters::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Named, ordered transform pipeline for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

impl Policy {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            seed: None,
            transforms: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Same name, domain and seed with a replaced pipeline
    pub fn with_transforms(&self, transforms: Vec<Transform>) -> Self {
        Self {
            name: self.name.clone(),
            domain: self.domain.clone(),
            seed: self.seed,
            transforms,
        }
    }

    /// Copy of the policy with the transform at `index` removed
    pub fn without(&self, index: usize) -> Self {
        let transforms = self
            .transforms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, t)| t.clone())
            .collect();
        self.with_transforms(transforms)
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Check that every transform is registered and every known parameter is
    /// coercible to its declared type.
    pub fn check(&self, registry: &SchemaRegistry) -> Result<(), GovernanceError> {
        for transform in &self.transforms {
            registry.clamp(&transform.name, &transform.parameters)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Policy {
        Policy::new("baseline", "natural")
            .with_transform(Transform::new("HorizontalFlip", 0.5))
            .with_transform(Transform::new("Rotate", 0.3).with_param("limit", 15i64))
            .with_transform(Transform::new("GaussNoise", 0.2))
    }

    #[test]
    fn test_without_preserves_order() {
        let policy = sample();
        let ablated = policy.without(1);

        assert_eq!(ablated.transform_names(), vec!["HorizontalFlip", "GaussNoise"]);
        assert_eq!(policy.len(), 3);
    }

    #[test]
    fn test_without_removes_only_one_duplicate() {
        let policy = Policy::new("dup", "natural")
            .with_transform(Transform::new("Rotate", 0.3))
            .with_transform(Transform::new("Rotate", 0.6));

        let ablated = policy.without(0);
        assert_eq!(ablated.len(), 1);
        assert_eq!(ablated.transforms[0].probability, 0.6);
    }

    #[test]
    fn test_same_magnitude_ignores_numeric_type() {
        assert!(ParamValue::Int(10).same_magnitude(&ParamValue::Float(10.0)));
        assert!(!ParamValue::Int(10).same_as(&ParamValue::Float(10.0)));
        assert!(!ParamValue::Int(10).same_magnitude(&ParamValue::Float(10.5)));
        assert!(ParamValue::Float(f64::NAN).same_as(&ParamValue::Float(f64::NAN)));
        assert!(ParamValue::Tuple(vec![f64::NAN, 1.0]).same_as(&ParamValue::Tuple(vec![f64::NAN, 1.0])));
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::Int(15).to_string(), "15");
        assert_eq!(ParamValue::from((3.0, 5.0)).to_string(), "(3, 5)");
    }

    #[test]
    fn test_check_rejects_unknown_transform() {
        let registry = SchemaRegistry::with_defaults();
        let policy = Policy::new("p", "natural").with_transform(Transform::new("Warp", 0.5));

        assert_eq!(
            policy.check(&registry),
            Err(GovernanceError::UnknownTransform("Warp".to_string()))
        );
    }

    #[test]
    fn test_check_rejects_uncoercible_parameter() {
        let registry = SchemaRegistry::with_defaults();
        let policy = Policy::new("p", "natural").with_transform(
            Transform::new("Rotate", 0.5).with_param("limit", ParamValue::Text("wide".into())),
        );

        assert!(matches!(
            policy.check(&registry),
            Err(GovernanceError::InvalidParameter { .. })
        ));
    }
}

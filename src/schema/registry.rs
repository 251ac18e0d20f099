//! Transform schema registry
//!
//! Catalog of known transforms, their categories and parameter ranges.

use crate::error::GovernanceError;
use crate::policy::{ParamValue, Parameters, Transform};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Transform category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformCategory {
    Geometric,
    Color,
    Noise,
    Blur,
    Crop,
    Distortion,
    Flip,
    Rotate,
    Scale,
    Other,
}

impl TransformCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformCategory::Geometric => "geometric",
            TransformCategory::Color => "color",
            TransformCategory::Noise => "noise",
            TransformCategory::Blur => "blur",
            TransformCategory::Crop => "crop",
            TransformCategory::Distortion => "distortion",
            TransformCategory::Flip => "flip",
            TransformCategory::Rotate => "rotate",
            TransformCategory::Scale => "scale",
            TransformCategory::Other => "other",
        }
    }
}

/// Declared type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Float,
    Int,
    Tuple,
}

/// Valid range of a transform parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub value_type: ValueType,
}

impl ParameterRange {
    pub fn float(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            default,
            value_type: ValueType::Float,
        }
    }

    pub fn int(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            min: min as f64,
            max: max as f64,
            default: default as f64,
            value_type: ValueType::Int,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.min <= self.default && self.default <= self.max
    }

    /// The range narrowed to `[lo, hi]`. If the two ranges are disjoint the
    /// given bounds win.
    pub fn narrowed(&self, lo: f64, hi: f64) -> Self {
        let (mut min, mut max) = (self.min.max(lo), self.max.min(hi));
        if min > max {
            min = lo;
            max = hi;
        }
        Self {
            name: self.name.clone(),
            min,
            max,
            default: self.default.clamp(min, max),
            value_type: self.value_type,
        }
    }

    /// Default value in the declared type
    pub fn default_value(&self) -> ParamValue {
        match self.value_type {
            ValueType::Int => ParamValue::Int(self.default.round() as i64),
            ValueType::Float => ParamValue::Float(self.default),
            ValueType::Tuple => ParamValue::Tuple(vec![self.min, self.default]),
        }
    }

    /// Coerce `value` to the declared type and clamp it into `[min, max]`
    pub fn clamp_value(
        &self,
        transform: &str,
        value: &ParamValue,
    ) -> Result<ParamValue, GovernanceError> {
        let finite = |v: f64| -> Result<f64, GovernanceError> {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(GovernanceError::invalid_parameter(
                    transform,
                    &self.name,
                    "value is not a finite number",
                ))
            }
        };

        match (self.value_type, value) {
            (ValueType::Int, ParamValue::Int(v)) => Ok(ParamValue::Int(self.clamp_int(*v as f64))),
            (ValueType::Int, ParamValue::Float(v)) => {
                Ok(ParamValue::Int(self.clamp_int(finite(*v)?.round())))
            }
            (ValueType::Float | ValueType::Tuple, ParamValue::Int(v)) => {
                let clamped = (*v as f64).clamp(self.min, self.max);
                if clamped == *v as f64 {
                    Ok(value.clone())
                } else if clamped.fract() == 0.0 {
                    Ok(ParamValue::Int(clamped as i64))
                } else {
                    Ok(ParamValue::Float(clamped))
                }
            }
            (ValueType::Float | ValueType::Tuple, ParamValue::Float(v)) => {
                Ok(ParamValue::Float(finite(*v)?.clamp(self.min, self.max)))
            }
            (_, ParamValue::Tuple(values)) => {
                let clamped = values
                    .iter()
                    .map(|v| {
                        let v = finite(*v)?;
                        Ok(match self.value_type {
                            ValueType::Int => self.clamp_int(v.round()) as f64,
                            _ => v.clamp(self.min, self.max),
                        })
                    })
                    .collect::<Result<Vec<f64>, GovernanceError>>()?;
                Ok(ParamValue::Tuple(clamped))
            }
            (_, other) => Err(GovernanceError::invalid_parameter(
                transform,
                &self.name,
                format!("expected a number, got {}", other.type_name()),
            )),
        }
    }

    fn clamp_int(&self, v: f64) -> i64 {
        let (lo, hi) = (self.min.ceil(), self.max.floor());
        // no integer inside [min, max]
        if lo > hi {
            return self.min.round() as i64;
        }
        v.clamp(lo, hi) as i64
    }
}

/// Immutable description of a registered transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSpec {
    pub name: String,
    pub category: TransformCategory,
    pub parameters: IndexMap<String, ParameterRange>,
    pub default_probability: f64,
}

impl TransformSpec {
    pub fn new(name: &str, category: TransformCategory) -> Self {
        Self {
            name: name.to_string(),
            category,
            parameters: IndexMap::new(),
            default_probability: 0.5,
        }
    }

    pub fn param(mut self, range: ParameterRange) -> Self {
        self.parameters.insert(range.name.clone(), range);
        self
    }
}

/// Registry of transform specs, iterated in registration order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    specs: IndexMap<String, TransformSpec>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in catalog
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for spec in super::catalog::default_specs() {
            registry.specs.insert(spec.name.clone(), spec);
        }
        registry
    }

    /// Register a spec; re-registering a name overwrites the previous spec.
    pub fn register(&mut self, spec: TransformSpec) -> Result<(), GovernanceError> {
        if let Some(bad) = spec.parameters.values().find(|r| !r.is_consistent()) {
            return Err(GovernanceError::invalid_parameter(
                &spec.name,
                &bad.name,
                format!("range violates min <= default <= max ({} / {} / {})", bad.min, bad.default, bad.max),
            ));
        }
        if !(0.0..=1.0).contains(&spec.default_probability) {
            return Err(GovernanceError::invalid_parameter(
                &spec.name,
                "probability",
                "default probability outside [0, 1]",
            ));
        }
        tracing::debug!("Registered transform spec {}", spec.name);
        self.specs.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TransformSpec, GovernanceError> {
        self.specs
            .get(name)
            .ok_or_else(|| GovernanceError::UnknownTransform(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Clamp every known parameter into its declared range. Unknown keys are
    /// passed through unchanged.
    pub fn clamp(&self, name: &str, parameters: &Parameters) -> Result<Parameters, GovernanceError> {
        let spec = self.get(name)?;
        parameters
            .iter()
            .map(|(key, value)| {
                let value = match spec.parameters.get(key) {
                    Some(range) => range.clamp_value(name, value)?,
                    None => value.clone(),
                };
                Ok((key.clone(), value))
            })
            .collect()
    }

    /// Parameter keys of `parameters` not declared by the transform spec
    pub fn unknown_parameters<'a>(
        &self,
        name: &str,
        parameters: &'a Parameters,
    ) -> Result<Vec<&'a str>, GovernanceError> {
        let spec = self.get(name)?;
        Ok(parameters
            .keys()
            .filter(|k| !spec.parameters.contains_key(k.as_str()))
            .map(|k| k.as_str())
            .collect())
    }

    /// Parameters of `transform` with unset keys filled from schema defaults
    pub fn resolve(&self, transform: &Transform) -> Result<Parameters, GovernanceError> {
        let spec = self.get(&transform.name)?;
        let mut resolved = transform.parameters.clone();
        for (key, range) in &spec.parameters {
            if !resolved.contains_key(key) {
                resolved.insert(key.clone(), range.default_value());
            }
        }
        Ok(resolved)
    }

    /// All specs in registration order
    pub fn list(&self) -> impl Iterator<Item = &TransformSpec> {
        self.specs.values()
    }

    /// Categories with their transform names, in order of first appearance
    pub fn categories(&self) -> IndexMap<TransformCategory, Vec<&str>> {
        let mut grouped: IndexMap<TransformCategory, Vec<&str>> = IndexMap::new();
        for spec in self.specs.values() {
            grouped.entry(spec.category).or_default().push(spec.name.as_str());
        }
        grouped
    }

    /// Position of a transform in registration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.specs.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

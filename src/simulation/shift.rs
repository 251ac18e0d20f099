//! Distribution shift estimation
//!
//! Estimates the performance drop when moving a model from a source domain
//! to a target domain under a set of covariate shifts. Each shift has a base
//! impact; independent drops combine with diminishing returns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

pub const DEFAULT_SEVERITY: f64 = 0.5;
pub const MAX_DROP: f64 = 0.95;

/// A named shift with its base impact at severity 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPreset {
    pub name: String,
    pub description: String,
    pub base_impact: f64,
}

impl ShiftPreset {
    fn new(name: &str, base_impact: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            base_impact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedShift {
    pub name: String,
    pub severity: f64,
    pub description: String,
    pub drop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftResult {
    pub source_domain: String,
    pub target_domain: String,
    pub estimated_performance_drop: f64,
    pub robustness_score: f64,
    /// In request order
    pub shifts_applied: Vec<AppliedShift>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ShiftSimulator {
    presets: IndexMap<String, ShiftPreset>,
}

impl ShiftSimulator {
    pub fn new() -> Self {
        let presets = [
            ShiftPreset::new("brightness", 0.15, "Brightness changes simulating lighting conditions"),
            ShiftPreset::new("contrast", 0.12, "Contrast changes simulating camera/scanner differences"),
            ShiftPreset::new("noise", 0.20, "Gaussian noise simulating sensor noise"),
            ShiftPreset::new("blur", 0.18, "Blur simulating focus issues or motion"),
            ShiftPreset::new("compression", 0.10, "JPEG compression artifacts"),
            ShiftPreset::new("color", 0.14, "Color shifts simulating different lighting/cameras"),
            ShiftPreset::new("combined_mild", 0.25, "Mild combined shift simulating real-world variations"),
            ShiftPreset::new("combined_severe", 0.40, "Severe combined shift for stress testing"),
        ];
        Self {
            presets: presets.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    /// Preset table with configured impacts applied on top; unknown names
    /// become new presets.
    pub fn with_overrides(overrides: &[(String, f64)]) -> Self {
        let mut simulator = Self::new();
        for (name, impact) in overrides {
            let impact = impact.clamp(0.0, 1.0);
            simulator
                .presets
                .entry(name.clone())
                .and_modify(|p| p.base_impact = impact)
                .or_insert_with(|| ShiftPreset::new(name, impact, "Custom shift"));
        }
        simulator
    }

    pub fn presets(&self) -> impl Iterator<Item = &ShiftPreset> {
        self.presets.values()
    }

    pub fn get(&self, name: &str) -> Option<&ShiftPreset> {
        self.presets.get(name)
    }

    pub fn simulate(
        &self,
        source_domain: &str,
        target_domain: &str,
        shift_types: &[String],
        severities: &HashMap<String, f64>,
    ) -> ShiftResult {
        let mut warnings = Vec::new();
        let mut retained = 1.0;

        let shifts_applied: Vec<AppliedShift> = shift_types
            .iter()
            .map(|name| {
                let severity = match severities.get(name) {
                    Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
                    Some(s) => {
                        warnings.push(format!(
                            "Severity {} for '{}' is not a number, using {}",
                            s, name, DEFAULT_SEVERITY
                        ));
                        DEFAULT_SEVERITY
                    }
                    None => DEFAULT_SEVERITY,
                };

                let (description, drop) = match self.presets.get(name) {
                    Some(preset) => (preset.description.clone(), severity * preset.base_impact),
                    None => {
                        warn!("Unknown shift type '{}'", name);
                        warnings.push(format!("Unknown shift type '{}' has no impact", name));
                        ("Unknown shift type".to_string(), 0.0)
                    }
                };
                retained *= 1.0 - drop;

                AppliedShift {
                    name: name.clone(),
                    severity,
                    description,
                    drop,
                }
            })
            .collect();

        let estimated_performance_drop = (1.0 - retained).min(MAX_DROP);
        info!(
            "🌫️ Shift {} -> {}: {} shifts, estimated drop {:.2}%",
            source_domain,
            target_domain,
            shifts_applied.len(),
            estimated_performance_drop * 100.0
        );

        ShiftResult {
            source_domain: source_domain.to_string(),
            target_domain: target_domain.to_string(),
            estimated_performance_drop,
            robustness_score: 1.0 - estimated_performance_drop,
            shifts_applied,
            warnings,
        }
    }
}

impl Default for ShiftSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_brightness_and_noise() {
        let severities = HashMap::from([
            ("brightness".to_string(), 0.5),
            ("noise".to_string(), 0.5),
        ]);
        let result = ShiftSimulator::new().simulate(
            "natural",
            "natural",
            &types(&["brightness", "noise"]),
            &severities,
        );

        assert!((result.shifts_applied[0].drop - 0.075).abs() < 1e-12);
        assert!((result.shifts_applied[1].drop - 0.10).abs() < 1e-12);
        assert!((result.estimated_performance_drop - 0.1675).abs() < 1e-12);
        assert!((result.robustness_score - 0.8325).abs() < 1e-12);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_default_severity_and_order() {
        let result = ShiftSimulator::new().simulate(
            "medical",
            "medical",
            &types(&["noise", "blur"]),
            &HashMap::new(),
        );

        let applied: Vec<(&str, f64)> = result
            .shifts_applied
            .iter()
            .map(|s| (s.name.as_str(), s.severity))
            .collect();
        assert_eq!(applied, vec![("noise", 0.5), ("blur", 0.5)]);
        assert_eq!(result.shifts_applied[1].description, "Blur simulating focus issues or motion");
    }

    #[test]
    fn test_drop_is_capped() {
        let severe = types(&["combined_severe"; 10]);
        let result = ShiftSimulator::new().simulate("a", "b", &severe, &HashMap::new());
        assert!(result.estimated_performance_drop <= MAX_DROP);

        let all_max = HashMap::from([("combined_severe".to_string(), 1.0)]);
        let result = ShiftSimulator::new().simulate("a", "b", &severe, &all_max);
        assert_eq!(result.estimated_performance_drop, MAX_DROP);
    }

    #[test]
    fn test_unknown_type_and_clamped_severity() {
        let severities = HashMap::from([("noise".to_string(), 3.0)]);
        let result = ShiftSimulator::new().simulate(
            "a",
            "b",
            &types(&["pixelate", "noise"]),
            &severities,
        );

        assert_eq!(result.shifts_applied[0].drop, 0.0);
        assert_eq!(result.shifts_applied[1].severity, 1.0);
        assert!((result.estimated_performance_drop - 0.2).abs() < 1e-12);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_overrides() {
        let simulator = ShiftSimulator::with_overrides(&[
            ("noise".to_string(), 0.5),
            ("fog".to_string(), 0.3),
        ]);

        assert_eq!(simulator.get("noise").unwrap().base_impact, 0.5);
        assert_eq!(simulator.get("fog").unwrap().description, "Custom shift");
        assert_eq!(simulator.presets().count(), 9);
    }

    #[test]
    fn test_no_shifts_no_drop() {
        let result = ShiftSimulator::new().simulate("a", "b", &[], &HashMap::new());
        assert_eq!(result.estimated_performance_drop, 0.0);
        assert_eq!(result.robustness_score, 1.0);
    }
}

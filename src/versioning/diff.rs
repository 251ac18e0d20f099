//! Policy diff engine
//!
//! Structural comparison of two policies keyed by transform name. Repeated
//! names pair up by occurrence: the k-th `Rotate` in one policy is compared
//! with the k-th `Rotate` in the other.

use crate::policy::{ParamValue, Parameters, Policy, Transform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of change detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// Probability and parameters of a transform at one side of a diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    pub probability: f64,
    pub parameters: Parameters,
}

impl From<&Transform> for TransformSnapshot {
    fn from(t: &Transform) -> Self {
        Self {
            probability: t.probability,
            parameters: t.parameters.clone(),
        }
    }
}

/// A single item in the policy diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub transform_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<TransformSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<TransformSnapshot>,
    /// Human-readable description
    pub description: String,
}

/// Complete policy diff result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
    /// Additions (second policy's order), then removals and modifications
    /// (first policy's order)
    pub entries: Vec<DiffEntry>,
    pub summary: String,
    pub has_changes: bool,
}

/// The diff engine that compares policies
pub struct PolicyDiffer;

impl PolicyDiffer {
    /// Compare two policies and return all differences
    pub fn diff(a: &Policy, b: &Policy) -> DiffResult {
        let a_index = Self::occurrences(&a.transforms);
        let b_index = Self::occurrences(&b.transforms);

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut modified = Vec::new();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for transform in &b.transforms {
            let k = Self::next_occurrence(&mut seen, &transform.name);
            let paired = a_index.get(transform.name.as_str()).is_some_and(|v| v.len() > k);
            if !paired {
                added.push(DiffEntry {
                    change_type: ChangeType::Added,
                    transform_name: transform.name.clone(),
                    old_value: None,
                    new_value: Some(transform.into()),
                    description: format!("Added {} (p={})", transform.name, transform.probability),
                });
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for old in &a.transforms {
            let k = Self::next_occurrence(&mut seen, &old.name);
            match b_index.get(old.name.as_str()).and_then(|v| v.get(k)) {
                None => removed.push(DiffEntry {
                    change_type: ChangeType::Removed,
                    transform_name: old.name.clone(),
                    old_value: Some(old.into()),
                    new_value: None,
                    description: format!("Removed {}", old.name),
                }),
                Some(&j) => {
                    let new = &b.transforms[j];
                    if !old.same_settings(new) {
                        modified.push(DiffEntry {
                            change_type: ChangeType::Modified,
                            transform_name: old.name.clone(),
                            old_value: Some(old.into()),
                            new_value: Some(new.into()),
                            description: Self::describe_modification(old, new),
                        });
                    }
                }
            }
        }

        let (additions, removals, modifications) = (added.len(), removed.len(), modified.len());
        let mut entries = added;
        entries.extend(removed);
        entries.extend(modified);

        DiffResult {
            additions,
            removals,
            modifications,
            entries,
            summary: Self::summarize(additions, removals, modifications),
            has_changes: additions + removals + modifications > 0,
        }
    }

    /// Positions of each name, in pipeline order
    fn occurrences(transforms: &[Transform]) -> HashMap<&str, Vec<usize>> {
        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, t) in transforms.iter().enumerate() {
            index.entry(t.name.as_str()).or_default().push(i);
        }
        index
    }

    fn next_occurrence<'a>(seen: &mut HashMap<&'a str, usize>, name: &'a str) -> usize {
        let counter = seen.entry(name).or_insert(0);
        let k = *counter;
        *counter += 1;
        k
    }

    fn describe_modification(old: &Transform, new: &Transform) -> String {
        let mut parts = Vec::new();
        if !ParamValue::Float(old.probability).same_as(&ParamValue::Float(new.probability)) {
            parts.push(format!("probability {} -> {}", old.probability, new.probability));
        }
        for (key, value) in &new.parameters {
            match old.parameters.get(key) {
                Some(previous) if !previous.same_as(value) => {
                    parts.push(format!("{} {} -> {}", key, previous, value))
                }
                None => parts.push(format!("{} set to {}", key, value)),
                _ => {}
            }
        }
        for key in old.parameters.keys().filter(|k| !new.parameters.contains_key(*k)) {
            parts.push(format!("{} unset", key));
        }
        format!("Modified {}: {}", old.name, parts.join(", "))
    }

    fn summarize(additions: usize, removals: usize, modifications: usize) -> String {
        let mut parts = Vec::new();
        if additions > 0 {
            parts.push(format!("+{} added", additions));
        }
        if removals > 0 {
            parts.push(format!("-{} removed", removals));
        }
        if modifications > 0 {
            parts.push(format!("~{} modified", modifications));
        }
        if parts.is_empty() {
            "No changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy(transforms: Vec<Transform>) -> Policy {
        Policy::new("p", "natural").with_transforms(transforms)
    }

    #[test]
    fn test_identical_policies() {
        let p = policy(vec![
            Transform::new("HorizontalFlip", 0.5),
            Transform::new("Rotate", 0.3).with_param("limit", 15i64),
        ]);
        let diff = PolicyDiffer::diff(&p, &p);

        assert!(!diff.has_changes);
        assert!(diff.entries.is_empty());
        assert_eq!(diff.summary, "No changes");
    }

    #[test]
    fn test_nan_values_diff_clean_against_themselves() {
        let p = Policy::from_yaml(
            "name: p\ndomain: natural\ntransforms:\n  - name: Rotate\n    probability: .nan\n    parameters:\n      limit: .nan\n",
        )
        .unwrap();
        assert!(p.transforms[0].probability.is_nan());

        let diff = PolicyDiffer::diff(&p, &p.clone());

        assert!(!diff.has_changes);
        assert_eq!(diff.summary, "No changes");
    }

    #[test]
    fn test_nan_to_number_is_modification() {
        let a = policy(vec![Transform::new("Rotate", f64::NAN)]);
        let b = policy(vec![Transform::new("Rotate", 0.5)]);

        let diff = PolicyDiffer::diff(&a, &b);

        assert_eq!(diff.modifications, 1);
        assert_eq!(diff.entries[0].description, "Modified Rotate: probability NaN -> 0.5");
    }

    #[test]
    fn test_modified_probability_and_parameters() {
        let a = policy(vec![Transform::new("Rotate", 0.3).with_param("limit", 15i64)]);
        let b = policy(vec![Transform::new("Rotate", 0.5).with_param("limit", 30i64)]);
        let diff = PolicyDiffer::diff(&a, &b);

        assert_eq!((diff.additions, diff.removals, diff.modifications), (0, 0, 1));
        let entry = &diff.entries[0];
        assert_eq!(entry.change_type, ChangeType::Modified);
        assert_eq!(entry.old_value.as_ref().unwrap().probability, 0.3);
        assert_eq!(
            entry.new_value.as_ref().unwrap().parameters["limit"],
            ParamValue::Int(30)
        );
        assert_eq!(entry.description, "Modified Rotate: probability 0.3 -> 0.5, limit 15 -> 30");
        assert_eq!(diff.summary, "~1 modified");
    }

    #[test]
    fn test_entry_order() {
        let a = policy(vec![
            Transform::new("GaussNoise", 0.2),
            Transform::new("Rotate", 0.3),
            Transform::new("HorizontalFlip", 0.5),
            Transform::new("GaussianBlur", 0.1),
        ]);
        let b = policy(vec![
            Transform::new("RandomCrop", 0.4),
            Transform::new("HorizontalFlip", 0.6),
            Transform::new("Rotate", 0.4),
            Transform::new("VerticalFlip", 0.5),
        ]);
        let diff = PolicyDiffer::diff(&a, &b);

        let order: Vec<(ChangeType, &str)> = diff
            .entries
            .iter()
            .map(|e| (e.change_type, e.transform_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ChangeType::Added, "RandomCrop"),
                (ChangeType::Added, "VerticalFlip"),
                (ChangeType::Removed, "GaussNoise"),
                (ChangeType::Removed, "GaussianBlur"),
                (ChangeType::Modified, "Rotate"),
                (ChangeType::Modified, "HorizontalFlip"),
            ]
        );
        assert_eq!(diff.summary, "+2 added, -2 removed, ~2 modified");
    }

    #[test]
    fn test_duplicate_names_pair_by_occurrence() {
        let a = policy(vec![Transform::new("Rotate", 0.2), Transform::new("Rotate", 0.4)]);
        let b = policy(vec![
            Transform::new("Rotate", 0.2),
            Transform::new("Rotate", 0.9),
            Transform::new("Rotate", 0.1),
        ]);
        let diff = PolicyDiffer::diff(&a, &b);

        assert_eq!((diff.additions, diff.removals, diff.modifications), (1, 0, 1));
        assert_eq!(diff.entries[0].new_value.as_ref().unwrap().probability, 0.1);
        assert_eq!(diff.entries[1].old_value.as_ref().unwrap().probability, 0.4);

        let reverse = PolicyDiffer::diff(&b, &a);
        assert_eq!((reverse.additions, reverse.removals), (0, 1));
    }

    #[test]
    fn test_parameter_order_is_not_a_change() {
        let a = policy(vec![Transform::new("ShiftScaleRotate", 0.5)
            .with_param("shift_limit", 0.1)
            .with_param("rotate_limit", 10i64)]);
        let b = policy(vec![Transform::new("ShiftScaleRotate", 0.5)
            .with_param("rotate_limit", 10i64)
            .with_param("shift_limit", 0.1)]);

        assert!(!PolicyDiffer::diff(&a, &b).has_changes);
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let a = policy(vec![]);
        let b = policy(vec![Transform::new("HorizontalFlip", 0.5)]);
        let json = serde_json::to_value(PolicyDiffer::diff(&a, &b)).unwrap();

        assert_eq!(json["entries"][0]["type"], "added");
        assert!(json["entries"][0].get("old_value").is_none());
        assert_eq!(json["has_changes"], true);
    }
}

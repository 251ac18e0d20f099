//! Policy serialization (YAML / JSON)

use super::Policy;
use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Wire format of a serialized policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for PolicyFormat {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(PolicyFormat::Yaml),
            "json" => Ok(PolicyFormat::Json),
            other => Err(GovernanceError::Serialization(format!(
                "unsupported policy format '{}'",
                other
            ))),
        }
    }
}

pub fn encode(policy: &Policy, format: PolicyFormat) -> Result<String, GovernanceError> {
    match format {
        PolicyFormat::Yaml => Ok(serde_yaml::to_string(policy)?),
        PolicyFormat::Json => Ok(serde_json::to_string_pretty(policy)?),
    }
}

pub fn decode(text: &str, format: PolicyFormat) -> Result<Policy, GovernanceError> {
    match format {
        PolicyFormat::Yaml => Ok(serde_yaml::from_str(text)?),
        PolicyFormat::Json => Ok(serde_json::from_str(text)?),
    }
}

/// Content hash of a policy: first 12 hex chars of SHA-256 over its
/// key-sorted JSON encoding.
pub fn content_hash(policy: &Policy) -> Result<String, GovernanceError> {
    // serde_json::Value maps are key-sorted, which makes the bytes canonical
    let canonical = serde_json::to_vec(&serde_json::to_value(policy)?)?;
    let digest = Sha256::digest(&canonical);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(hex[..12].to_string())
}

impl Policy {
    pub fn to_yaml(&self) -> Result<String, GovernanceError> {
        encode(self, PolicyFormat::Yaml)
    }

    pub fn from_yaml(text: &str) -> Result<Self, GovernanceError> {
        decode(text, PolicyFormat::Yaml)
    }

    pub fn to_json(&self) -> Result<String, GovernanceError> {
        encode(self, PolicyFormat::Json)
    }

    pub fn from_json(text: &str) -> Result<Self, GovernanceError> {
        decode(text, PolicyFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ParamValue, Transform};
    use pretty_assertions::assert_eq;

    const POLICY_YAML: &str = r#"
name: ct_baseline
domain: medical
seed: 7
transforms:
  - name: Rotate
    probability: 0.3
    parameters:
      limit: 15
  - name: GaussianBlur
    probability: 0.2
    parameters:
      blur_limit: [3, 5]
  - name: HorizontalFlip
    probability: 0.5
"#;

    #[test]
    fn test_decode_yaml() {
        let policy = Policy::from_yaml(POLICY_YAML).unwrap();

        assert_eq!(policy.name, "ct_baseline");
        assert_eq!(policy.seed, Some(7));
        assert_eq!(
            policy.transform_names(),
            vec!["Rotate", "GaussianBlur", "HorizontalFlip"]
        );
        assert_eq!(policy.transforms[0].parameters["limit"], ParamValue::Int(15));
        assert_eq!(
            policy.transforms[1].parameters["blur_limit"],
            ParamValue::Tuple(vec![3.0, 5.0])
        );
        assert!(policy.transforms[2].parameters.is_empty());
    }

    #[test]
    fn test_yaml_round_trip_omits_empty_parameters() {
        let policy = Policy::from_yaml(POLICY_YAML).unwrap();
        let encoded = policy.to_yaml().unwrap();

        assert!(!encoded.contains("parameters: {}"));
        assert_eq!(Policy::from_yaml(&encoded).unwrap(), policy);
    }

    #[test]
    fn test_json_keeps_parameter_insertion_order() {
        let policy = Policy::new("p", "natural").with_transform(
            Transform::new("HueSaturationValue", 0.4)
                .with_param("val_shift_limit", 10i64)
                .with_param("hue_shift_limit", 5i64),
        );
        let json = policy.to_json().unwrap();

        let val = json.find("val_shift_limit").unwrap();
        let hue = json.find("hue_shift_limit").unwrap();
        assert!(val < hue);
        assert!(!json.contains("seed"));
        assert_eq!(Policy::from_json(&json).unwrap(), policy);
    }

    #[test]
    fn test_missing_probability_defaults() {
        let policy = Policy::from_json(
            r#"{"name":"p","domain":"ocr","transforms":[{"name":"Rotate"}]}"#,
        )
        .unwrap();
        assert_eq!(policy.transforms[0].probability, 0.5);
    }

    #[test]
    fn test_content_hash_is_stable_and_sensitive() {
        let policy = Policy::from_yaml(POLICY_YAML).unwrap();
        let hash = content_hash(&policy).unwrap();

        assert_eq!(hash.len(), 12);
        assert_eq!(hash, content_hash(&policy.clone()).unwrap());

        let mut changed = policy.clone();
        changed.transforms[0].probability = 0.4;
        assert_ne!(hash, content_hash(&changed).unwrap());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("YML".parse::<PolicyFormat>().unwrap(), PolicyFormat::Yaml);
        assert_eq!("json".parse::<PolicyFormat>().unwrap(), PolicyFormat::Json);
        assert!("toml".parse::<PolicyFormat>().is_err());
    }

    #[test]
    fn test_decode_malformed_is_serialization_error() {
        assert!(matches!(
            Policy::from_json("{not json"),
            Err(GovernanceError::Serialization(_))
        ));
    }
}

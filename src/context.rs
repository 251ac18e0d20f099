//! Governance context
//!
//! The schema registry and domain rule set, built once at startup and shared
//! read-only by every operation. Tests build their own isolated instances.

use crate::config::GovernanceConfig;
use crate::domains::{self, Domain, DomainRuleSet};
use crate::error::GovernanceError;
use crate::schema::{SchemaRegistry, TransformSpec};
use tracing::info;

#[derive(Debug, Clone)]
pub struct GovernanceContext {
    pub registry: SchemaRegistry,
    pub domains: DomainRuleSet,
}

impl GovernanceContext {
    pub fn new(registry: SchemaRegistry, domains: DomainRuleSet) -> Self {
        Self { registry, domains }
    }

    /// Built-in catalog and domain tables
    pub fn builtin() -> Result<Self, GovernanceError> {
        let registry = SchemaRegistry::with_defaults();
        let domains = domains::builtin_rules(&registry)?;
        Ok(Self::new(registry, domains))
    }

    /// One-time initialization: built-ins plus any configured domain file
    pub fn init(config: &GovernanceConfig) -> Result<Self, GovernanceError> {
        let mut context = Self::builtin()?;
        if let Some(path) = &config.domains_file {
            domains::loader::load_file(&mut context.domains, &context.registry, path)?;
        }
        info!(
            "🧭 Governance context ready: {} transforms, {} domains",
            context.registry.len(),
            context.domains.len()
        );
        Ok(context)
    }

    /// Domain table, if known
    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name).ok()
    }

    /// Registry transforms not forbidden in `domain`, in catalog order
    pub fn allowed_transforms(&self, domain: &str) -> Vec<&TransformSpec> {
        let table = self.domain(domain);
        self.registry
            .list()
            .filter(|spec| !table.is_some_and(|d| d.is_forbidden(&spec.name)))
            .collect()
    }

    /// The domain's recommended transforms in catalog order
    pub fn recommended_in_catalog_order(&self, domain: &str) -> Vec<String> {
        let Some(table) = self.domain(domain) else {
            return Vec::new();
        };
        let mut names: Vec<&String> = table
            .recommended_transforms
            .iter()
            .filter(|name| self.registry.contains(name))
            .collect();
        names.sort_by_key(|name| self.registry.position(name));
        names.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_allowed_transforms_exclude_forbidden() {
        let context = GovernanceContext::builtin().unwrap();
        let allowed: Vec<&str> = context
            .allowed_transforms("medical")
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        assert!(allowed.contains(&"HorizontalFlip"));
        assert!(!allowed.contains(&"ElasticTransform"));
        assert_eq!(allowed.len(), context.registry.len() - 11);
    }

    #[test]
    fn test_unknown_domain_allows_everything() {
        let context = GovernanceContext::builtin().unwrap();
        assert_eq!(context.allowed_transforms("xray").len(), context.registry.len());
        assert!(context.recommended_in_catalog_order("xray").is_empty());
    }

    #[test]
    fn test_recommended_in_catalog_order() {
        let context = GovernanceContext::builtin().unwrap();
        assert_eq!(
            context.recommended_in_catalog_order("medical"),
            vec![
                "HorizontalFlip",
                "VerticalFlip",
                "RandomRotate90",
                "RandomBrightnessContrast",
                "GaussNoise",
            ]
        );
        // ocr declares Rotate after GaussNoise but the catalog registers it first
        let ocr = context.recommended_in_catalog_order("ocr");
        assert_eq!(ocr[0], "Rotate");
    }

    #[test]
    fn test_init_layers_domains_file() {
        let path = std::env::temp_dir().join(format!("augmentflow-domains-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "- name: thermal\n  extends: satellite\n  constraints:\n    - transform_name: CLAHE\n      level: forbidden\n      reason: breaks radiometry"
        )
        .unwrap();

        let config = GovernanceConfig {
            domains_file: Some(path.clone()),
            ..GovernanceConfig::default()
        };
        let context = GovernanceContext::init(&config).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(context.domains.get("thermal").unwrap().is_forbidden("CLAHE"));
        assert!(context.domains.get("thermal").unwrap().is_forbidden("ToGray"));
    }
}

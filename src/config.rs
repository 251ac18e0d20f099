//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 8000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

/// Governance core configuration
#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    /// Extra domain definitions layered over the built-in tables
    pub domains_file: Option<PathBuf>,
    /// Overrides of the shift base-impact table
    pub shift_impacts: Vec<(String, f64)>,
    pub ablation_parallel: bool,
    /// Seed of the heuristic scorer used by the HTTP layer
    pub ablation_seed: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            domains_file: None,
            shift_impacts: Vec::new(),
            ablation_parallel: true,
            ablation_seed: 42,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub governance: GovernanceConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server = ServerConfig {
            host: match var("SERVER_HOST") {
                Some(h) => h
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(format!("SERVER_HOST={}", h)))?,
                None => defaults.server.host,
            },
            port: match var("SERVER_PORT") {
                Some(p) => p
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(format!("SERVER_PORT={}", p)))?,
                None => defaults.server.port,
            },
        };

        let cors = CorsConfig {
            allowed_origins: var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        let governance = GovernanceConfig {
            domains_file: var("DOMAINS_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            shift_impacts: match var("SHIFT_IMPACTS") {
                Some(raw) => parse_impacts(&raw)?,
                None => Vec::new(),
            },
            ablation_parallel: match var("ABLATION_PARALLEL") {
                Some(v) => parse_bool(&v)
                    .ok_or_else(|| ConfigError::InvalidValue(format!("ABLATION_PARALLEL={}", v)))?,
                None => defaults.governance.ablation_parallel,
            },
            ablation_seed: match var("ABLATION_SEED") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(format!("ABLATION_SEED={}", v)))?,
                None => defaults.governance.ablation_seed,
            },
        };

        Ok(Self {
            server,
            cors,
            governance,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `type=impact,type=impact` pairs
fn parse_impacts(raw: &str) -> Result<Vec<(String, f64)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::ParseError(format!("expected type=impact, got '{}'", pair)))?;
            let impact: f64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::ParseError(format!("invalid impact in '{}'", pair)))?;
            if !(0.0..=1.0).contains(&impact) {
                return Err(ConfigError::InvalidValue(format!(
                    "impact for {} must be within [0, 1]",
                    name.trim()
                )));
            }
            Ok((name.trim().to_string(), impact))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_load_from_empty_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.server.port, 8000);
        assert!(settings.cors.allowed_origins.is_empty());
        assert!(settings.governance.domains_file.is_none());
        assert!(settings.governance.ablation_parallel);
        assert_eq!(settings.governance.ablation_seed, 42);
    }

    #[test]
    fn test_load_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("SERVER_PORT", "9100"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("DOMAINS_FILE", "/etc/augmentflow/domains.yaml"),
            ("SHIFT_IMPACTS", "brightness=0.2, fog=0.3"),
            ("ABLATION_PARALLEL", "off"),
        ]))
        .unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(
            settings.governance.domains_file,
            Some(PathBuf::from("/etc/augmentflow/domains.yaml"))
        );
        assert_eq!(
            settings.governance.shift_impacts,
            vec![("brightness".to_string(), 0.2), ("fog".to_string(), 0.3)]
        );
        assert!(!settings.governance.ablation_parallel);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Settings::from_lookup(lookup(&[("SERVER_PORT", "http")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("SHIFT_IMPACTS", "noise")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("SHIFT_IMPACTS", "noise=1.5")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("ABLATION_PARALLEL", "maybe")])).is_err());
    }
}

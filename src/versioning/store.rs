//! Policy version store
//!
//! Keeps every committed revision of each named policy so revisions can be
//! listed and diffed. Versions are numbered per policy name from 1.

use crate::error::{AppError, GovernanceError};
use crate::policy::{content_hash, Policy};
use crate::versioning::diff::{DiffResult, PolicyDiffer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A committed policy revision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVersion {
    pub id: Uuid,
    pub version: u64,
    /// `v{version}`
    pub tag: String,
    /// First 12 hex chars of the SHA-256 of the canonical JSON
    pub hash: String,
    pub message: String,
    pub committed_at: DateTime<Utc>,
    pub parent_version: Option<u64>,
    pub policy: Policy,
}

/// Metadata about a version (lightweight, used for listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVersionMetadata {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub version: u64,
    pub tag: String,
    pub hash: String,
    pub message: String,
    pub committed_at: DateTime<Utc>,
    pub transform_count: usize,
}

impl From<&PolicyVersion> for PolicyVersionMetadata {
    fn from(v: &PolicyVersion) -> Self {
        Self {
            id: v.id,
            name: v.policy.name.clone(),
            domain: v.policy.domain.clone(),
            version: v.version,
            tag: v.tag.clone(),
            hash: v.hash.clone(),
            message: v.message.clone(),
            committed_at: v.committed_at,
            transform_count: v.policy.len(),
        }
    }
}

/// Store for managing policy revisions
pub struct PolicyStore {
    /// Policy name -> revisions, oldest first
    versions: Arc<RwLock<HashMap<String, Vec<PolicyVersion>>>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self {
            versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Commit a policy under its name, auto-incrementing the version.
    /// Committing content identical to the latest revision returns that
    /// revision unchanged.
    pub async fn commit(
        &self,
        policy: Policy,
        message: impl Into<String>,
    ) -> Result<PolicyVersion, GovernanceError> {
        let hash = content_hash(&policy)?;
        let mut versions = self.versions.write().await;
        let history = versions.entry(policy.name.clone()).or_default();

        if let Some(latest) = history.last() {
            if latest.hash == hash {
                tracing::debug!("Policy {} unchanged at {}", policy.name, latest.tag);
                return Ok(latest.clone());
            }
        }

        let parent_version = history.last().map(|v| v.version);
        let version = parent_version.unwrap_or(0) + 1;
        let committed = PolicyVersion {
            id: Uuid::new_v4(),
            version,
            tag: format!("v{}", version),
            hash,
            message: message.into(),
            committed_at: Utc::now(),
            parent_version,
            policy,
        };
        history.push(committed.clone());

        tracing::info!(
            "📝 Committed policy {} {} ({} transforms, {})",
            committed.policy.name,
            committed.tag,
            committed.policy.len(),
            committed.hash
        );

        Ok(committed)
    }

    /// Get the latest revision of a policy
    pub async fn get_latest(&self, name: &str) -> Option<PolicyVersion> {
        let versions = self.versions.read().await;
        versions.get(name)?.last().cloned()
    }

    /// Get a specific version
    pub async fn get_version(&self, name: &str, version: u64) -> Option<PolicyVersion> {
        let versions = self.versions.read().await;
        versions
            .get(name)?
            .iter()
            .find(|v| v.version == version)
            .cloned()
    }

    /// Revision history of a policy, newest first
    pub async fn history(&self, name: &str) -> Vec<PolicyVersionMetadata> {
        let versions = self.versions.read().await;
        versions
            .get(name)
            .map(|h| h.iter().rev().map(PolicyVersionMetadata::from).collect())
            .unwrap_or_default()
    }

    /// Latest revision of every policy, by name
    pub async fn list(&self) -> Vec<PolicyVersionMetadata> {
        let versions = self.versions.read().await;
        let mut list: Vec<_> = versions
            .values()
            .filter_map(|h| h.last())
            .map(PolicyVersionMetadata::from)
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Delete old revisions, keeping the last N versions
    pub async fn prune(&self, name: &str, keep_versions: usize) -> usize {
        let mut versions = self.versions.write().await;
        let Some(history) = versions.get_mut(name) else {
            return 0;
        };
        if history.len() <= keep_versions {
            return 0;
        }
        let removed = history.len() - keep_versions;
        history.drain(..removed);
        tracing::info!("Pruned {} old revisions of policy {}", removed, name);
        removed
    }

    /// Diff two stored versions of a policy
    pub async fn compare_versions(
        &self,
        name: &str,
        from_version: u64,
        to_version: u64,
    ) -> Result<DiffResult, AppError> {
        let from = self
            .get_version(name, from_version)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Policy {} v{} not found", name, from_version)))?;

        let to = self
            .get_version(name, to_version)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Policy {} v{} not found", name, to_version)))?;

        Ok(PolicyDiffer::diff(&from.policy, &to.policy))
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Transform;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    fn policy(probability: f64) -> Policy {
        Policy::new("baseline", "natural").with_transform(Transform::new("Rotate", probability))
    }

    #[tokio::test]
    async fn test_commit_increments_versions() {
        let store = PolicyStore::new();
        let v1 = store.commit(policy(0.3), "initial").await.unwrap();
        let v2 = store.commit(policy(0.5), "stronger rotate").await.unwrap();

        assert_eq!((v1.version, v1.tag.as_str()), (1, "v1"));
        assert_eq!((v2.version, v2.parent_version), (2, Some(1)));
        assert_ne!(v1.hash, v2.hash);
        assert_eq!(store.get_latest("baseline").await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_unchanged_commit_is_noop() {
        let store = PolicyStore::new();
        let v1 = store.commit(policy(0.3), "initial").await.unwrap();
        let again = store.commit(policy(0.3), "same").await.unwrap();

        assert_eq!(again.id, v1.id);
        assert_eq!(store.history("baseline").await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_newest_first_and_compare() {
        let store = PolicyStore::new();
        store.commit(policy(0.3), "a").await.unwrap();
        store.commit(policy(0.5), "b").await.unwrap();

        let history = store.history("baseline").await;
        assert_eq!(history.iter().map(|m| m.version).collect::<Vec<_>>(), vec![2, 1]);

        let diff = assert_ok!(store.compare_versions("baseline", 1, 2).await);
        assert_eq!(diff.modifications, 1);
        assert_err!(store.compare_versions("baseline", 1, 9).await);
    }

    #[tokio::test]
    async fn test_prune_keeps_latest() {
        let store = PolicyStore::new();
        for p in [0.1, 0.2, 0.3, 0.4] {
            store.commit(policy(p), "step").await.unwrap();
        }

        assert_eq!(store.prune("baseline", 2).await, 2);
        assert!(store.get_version("baseline", 1).await.is_none());
        assert_eq!(store.get_latest("baseline").await.unwrap().version, 4);
        assert_eq!(store.list().await.len(), 1);
    }
}

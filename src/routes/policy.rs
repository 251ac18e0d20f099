//! Policy route handlers
//!
//! Enforcement, validation, serialization, and the versioned policy store.

use crate::enforcement::{EnforcementResult, RuleEnforcer, SafetyValidator, ValidationReport};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::policy::{decode, encode, Policy, PolicyFormat};
use crate::state::SharedState;
use crate::versioning::{DiffResult, PolicyDiffer, PolicyVersion, PolicyVersionMetadata};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

/// Policy names appear in URL paths
static POLICY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("policy name pattern"));

fn check_policy_fields(policy: &Policy) -> Result<(), ValidationError> {
    if !POLICY_NAME.is_match(&policy.name) {
        let mut err = ValidationError::new("invalid_policy_name");
        err.message = Some(
            "Policy name is required and may only contain letters, digits, '_', '.' and '-'".into(),
        );
        return Err(err);
    }
    if policy.domain.trim().is_empty() {
        let mut err = ValidationError::new("missing_domain");
        err.message = Some("Policy domain is required".into());
        return Err(err);
    }
    Ok(())
}

fn parse_format(format: Option<&str>) -> ApiResult<PolicyFormat> {
    match format {
        Some(f) => Ok(f.parse()?),
        None => Ok(PolicyFormat::default()),
    }
}

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequest {
    #[validate(custom(function = "check_policy_fields"))]
    pub policy: Policy,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[validate(custom(function = "check_policy_fields"))]
    pub policy: Policy,
    /// Commit message
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[validate(custom(function = "check_policy_fields"))]
    pub policy: Policy,
    /// `yaml` (default) or `json`
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[validate(length(min = 1, message = "Policy content is required"))]
    pub content: String,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    #[validate(custom(function = "check_policy_fields"))]
    pub before: Policy,
    #[validate(custom(function = "check_policy_fields"))]
    pub after: Policy,
}

#[derive(Debug, Deserialize)]
pub struct VersionDiffQuery {
    /// From version (defaults to the one before `to`)
    pub from: Option<u64>,
    /// To version (defaults to latest)
    pub to: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub format: PolicyFormat,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub policy: Policy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub version: PolicyVersion,
    pub enforcement: EnforcementResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListResponse {
    pub success: bool,
    pub policies: Vec<PolicyVersionMetadata>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub success: bool,
    pub name: String,
    pub versions: Vec<PolicyVersionMetadata>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub success: bool,
    pub diff: DiffResult,
}

// ==================== Handlers ====================

/// Correct a policy so it is valid for its domain
pub async fn enforce_policy(
    State(state): State<SharedState>,
    Json(payload): Json<PolicyRequest>,
) -> ApiResult<Json<SuccessResponse<EnforcementResult>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let result = RuleEnforcer::new(&state.context).enforce(&payload.policy)?;
    let message = format!(
        "Policy enforced: {} removed, {} clamped",
        result.removed.len(),
        result.clamped.len()
    );

    Ok(Json(SuccessResponse::with_data(message, result)))
}

/// Audit a policy without changing it
pub async fn validate_policy(
    State(state): State<SharedState>,
    Json(payload): Json<PolicyRequest>,
) -> ApiResult<Json<SuccessResponse<ValidationReport>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let report = SafetyValidator::new(&state.context).validate(&payload.policy);
    let message = if report.is_valid {
        "Policy is valid".to_string()
    } else {
        format!(
            "Policy has {} blocking and {} error violations",
            report.summary.blockers, report.summary.errors
        )
    };

    Ok(Json(SuccessResponse::with_data(message, report)))
}

/// Serialize a policy to YAML or JSON
pub async fn export_policy(
    Json(payload): Json<ExportRequest>,
) -> ApiResult<Json<SuccessResponse<ExportResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let format = parse_format(payload.format.as_deref())?;
    let content = encode(&payload.policy, format)?;

    Ok(Json(SuccessResponse::with_data(
        format!("Policy '{}' exported", payload.policy.name),
        ExportResponse { format, content },
    )))
}

/// Parse a YAML or JSON policy document
pub async fn import_policy(
    State(state): State<SharedState>,
    Json(payload): Json<ImportRequest>,
) -> ApiResult<Json<SuccessResponse<ImportResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let format = parse_format(payload.format.as_deref())?;
    let policy = decode(&payload.content, format)?;
    policy.check(&state.context.registry)?;
    debug!("Imported policy '{}' ({} transforms)", policy.name, policy.len());

    Ok(Json(SuccessResponse::with_data(
        format!("Policy '{}' imported", policy.name),
        ImportResponse { policy },
    )))
}

/// Enforce a policy, then commit the corrected policy as a new version
pub async fn commit_policy(
    State(state): State<SharedState>,
    Json(payload): Json<CommitRequest>,
) -> ApiResult<Json<SuccessResponse<CommitResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let enforcement = RuleEnforcer::new(&state.context).enforce(&payload.policy)?;
    let message = payload
        .message
        .unwrap_or_else(|| format!("Update {}", payload.policy.name));
    let version = state
        .policies
        .commit(enforcement.policy.clone(), message)
        .await?;

    info!(
        "Policy '{}' at {} ({} corrections)",
        version.policy.name,
        version.tag,
        enforcement.removed.len() + enforcement.clamped.len()
    );

    Ok(Json(SuccessResponse::with_data(
        format!("Policy '{}' committed as {}", version.policy.name, version.tag),
        CommitResponse {
            version,
            enforcement,
        },
    )))
}

/// Latest revision of every stored policy
pub async fn list_policies(State(state): State<SharedState>) -> Json<PolicyListResponse> {
    Json(PolicyListResponse {
        success: true,
        policies: state.policies.list().await,
    })
}

/// Revision history of one policy, newest first
pub async fn policy_history(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let versions = state.policies.history(&name).await;
    if versions.is_empty() {
        return Err(AppError::NotFound(format!("Policy '{}' not found", name)));
    }

    Ok(Json(HistoryResponse {
        success: true,
        name,
        versions,
    }))
}

/// Diff two stored versions of a policy
pub async fn diff_versions(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<VersionDiffQuery>,
) -> ApiResult<Json<DiffResponse>> {
    let latest = state
        .policies
        .get_latest(&name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Policy '{}' not found", name)))?;

    let to_version = query.to.unwrap_or(latest.version);
    let from_version = query.from.unwrap_or(to_version.saturating_sub(1));
    if from_version == 0 {
        return Err(AppError::BadRequest(
            "Need at least 2 versions to compare".to_string(),
        ));
    }

    let diff = state
        .policies
        .compare_versions(&name, from_version, to_version)
        .await?;

    Ok(Json(DiffResponse {
        success: true,
        diff,
    }))
}

/// Diff two policies supplied in the request
pub async fn diff_policies(Json(payload): Json<DiffRequest>) -> ApiResult<Json<DiffResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    Ok(Json(DiffResponse {
        success: true,
        diff: PolicyDiffer::diff(&payload.before, &payload.after),
    }))
}

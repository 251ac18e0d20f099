//! Analysis route handlers
//!
//! Ablation, curriculum planning and shift estimation over enforced policies.

use crate::enforcement::RuleEnforcer;
use crate::error::{validation_error, ApiResult, AppError};
use crate::policy::Policy;
use crate::simulation::{
    AblationAnalyzer, AblationConfig, AblationResult, CurriculumBuilder, CurriculumPlan,
    HeuristicScorer, ShiftPreset, ShiftResult, Strategy,
};
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use validator::Validate;

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AblationRequest {
    pub policy: Policy,
    /// Scorer calls averaged per evaluated policy
    #[validate(range(min = 1, max = 10, message = "nRuns must be between 1 and 10"))]
    #[serde(default = "default_runs")]
    pub n_runs: usize,
    #[serde(default = "default_true")]
    pub higher_is_better: bool,
}

fn default_runs() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AblationResponse {
    pub success: bool,
    /// Transforms the enforcer dropped before ablation
    pub removed_by_enforcement: Vec<String>,
    pub ablation: AblationResult,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumRequest {
    #[validate(length(min = 1, message = "Domain is required"))]
    pub domain: String,
    #[validate(range(min = 1, message = "totalEpochs must be at least 1"))]
    pub total_epochs: u32,
    #[validate(range(min = 1, message = "numStages must be at least 1"))]
    #[serde(default = "default_stages")]
    pub num_stages: u32,
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
}

fn default_stages() -> u32 {
    3
}

fn default_strategy() -> Strategy {
    Strategy::Linear
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumResponse {
    pub success: bool,
    pub plan: CurriculumPlan,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRequest {
    #[validate(length(min = 1, message = "Source domain is required"))]
    pub source_domain: String,
    #[validate(length(min = 1, message = "Target domain is required"))]
    pub target_domain: String,
    #[validate(length(min = 1, message = "At least one shift type is required"))]
    pub shift_types: Vec<String>,
    #[serde(default)]
    pub severities: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub success: bool,
    pub result: ShiftResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTypesResponse {
    pub success: bool,
    pub shift_types: Vec<ShiftPreset>,
}

// ==================== Handlers ====================

/// Enforce a policy, then rank its transforms by leave-one-out contribution
/// using the seeded heuristic scorer
pub async fn run_ablation(
    State(state): State<SharedState>,
    Json(payload): Json<AblationRequest>,
) -> ApiResult<Json<AblationResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let enforcement = RuleEnforcer::new(&state.context).enforce(&payload.policy)?;
    let removed_by_enforcement = enforcement
        .removed
        .iter()
        .map(|r| r.transform_name.clone())
        .collect();

    let analyzer = AblationAnalyzer::new(AblationConfig {
        n_runs: payload.n_runs,
        higher_is_better: payload.higher_is_better,
        parallel: state.ablation_parallel,
    });
    let scorer = HeuristicScorer::new(enforcement.policy.seed.unwrap_or(state.ablation_seed));
    let policy = enforcement.policy;

    debug!("Running ablation for '{}' ({} transforms)", policy.name, policy.len());
    let ablation = tokio::task::spawn_blocking(move || analyzer.analyze(&policy, &scorer))
        .await
        .map_err(|e| AppError::Internal(format!("Ablation task failed: {}", e)))?;

    Ok(Json(AblationResponse {
        success: true,
        removed_by_enforcement,
        ablation,
    }))
}

/// Build a staged augmentation schedule for a domain
pub async fn build_curriculum(
    State(state): State<SharedState>,
    Json(payload): Json<CurriculumRequest>,
) -> ApiResult<Json<CurriculumResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let plan = CurriculumBuilder::new(&state.context).plan(
        &payload.domain,
        payload.total_epochs,
        payload.num_stages,
        payload.strategy,
    )?;

    Ok(Json(CurriculumResponse {
        success: true,
        plan,
    }))
}

/// Estimate the performance drop under a set of shifts
pub async fn simulate_shift(
    State(state): State<SharedState>,
    Json(payload): Json<ShiftRequest>,
) -> ApiResult<Json<ShiftResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let result = state.shift.simulate(
        &payload.source_domain,
        &payload.target_domain,
        &payload.shift_types,
        &payload.severities,
    );

    Ok(Json(ShiftResponse {
        success: true,
        result,
    }))
}

pub async fn list_shift_types(State(state): State<SharedState>) -> Json<ShiftTypesResponse> {
    Json(ShiftTypesResponse {
        success: true,
        shift_types: state.shift.presets().cloned().collect(),
    })
}

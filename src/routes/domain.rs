//! Catalog and domain route handlers

use crate::domains::{Domain, DomainSummary};
use crate::enforcement::{QuickCheck, SafetyValidator};
use crate::error::{validation_error, ApiResult};
use crate::schema::{TransformCategory, TransformSpec};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== Request/Response Types ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformCatalogResponse {
    pub success: bool,
    pub count: usize,
    pub transforms: Vec<TransformSpec>,
    pub categories: IndexMap<TransformCategory, Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainListResponse {
    pub success: bool,
    pub domains: Vec<DomainSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResponse {
    pub success: bool,
    pub domain: Domain,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTransformsResponse {
    pub success: bool,
    pub domain: String,
    pub allowed: Vec<String>,
    pub forbidden: Vec<String>,
    pub recommended: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheckRequest {
    #[validate(length(min = 1, message = "Transform name is required"))]
    pub transform_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheckResponse {
    pub success: bool,
    pub domain: String,
    pub check: QuickCheck,
}

// ==================== Handlers ====================

/// Every registered transform with its parameter ranges
pub async fn list_transforms(State(state): State<SharedState>) -> Json<TransformCatalogResponse> {
    let registry = &state.context.registry;
    let categories = registry
        .categories()
        .into_iter()
        .map(|(category, names)| (category, names.into_iter().map(String::from).collect()))
        .collect();

    Json(TransformCatalogResponse {
        success: true,
        count: registry.len(),
        transforms: registry.list().cloned().collect(),
        categories,
    })
}

pub async fn list_domains(State(state): State<SharedState>) -> Json<DomainListResponse> {
    Json(DomainListResponse {
        success: true,
        domains: state.context.domains.list().map(Domain::summary).collect(),
    })
}

pub async fn get_domain(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DomainResponse>> {
    let domain = state.context.domains.get(&name)?.clone();
    Ok(Json(DomainResponse {
        success: true,
        domain,
    }))
}

/// Allowed, forbidden and recommended transforms of a domain
pub async fn domain_transforms(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DomainTransformsResponse>> {
    let domain = state.context.domains.get(&name)?;
    let allowed = state
        .context
        .allowed_transforms(&name)
        .iter()
        .map(|spec| spec.name.clone())
        .collect();

    Ok(Json(DomainTransformsResponse {
        success: true,
        domain: domain.name.clone(),
        allowed,
        forbidden: domain.forbidden_transforms().iter().map(|s| s.to_string()).collect(),
        recommended: state.context.recommended_in_catalog_order(&name),
    }))
}

/// Whether one transform may be used in a domain
pub async fn check_transform(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<QuickCheckRequest>,
) -> ApiResult<Json<QuickCheckResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;
    state.context.domains.get(&name)?;

    let check = SafetyValidator::new(&state.context).quick_check(&name, &payload.transform_name);
    Ok(Json(QuickCheckResponse {
        success: true,
        domain: name,
        check,
    }))
}

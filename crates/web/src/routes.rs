//! Proxydeck API routes
//!
//! - Instance management
//! - PPX profile preview, generation, and download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use proxydeck_common::{
    Error, GeneratedProfile, InstancePatch, InstanceRecord, InstanceRepo, NewInstance,
    ProfileGenerator, ProfilePlan,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;

/// Shared API state
pub struct AppState {
    pub repo: InstanceRepo,
    pub id_baseline: i64,
}

impl AppState {
    fn generator(&self) -> ProfileGenerator<InstanceRepo> {
        ProfileGenerator::new(self.repo.clone()).with_id_baseline(self.id_baseline)
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct RuleOrderRequest {
    order: Option<i64>,
}

/// Public routes
pub fn public_routes() -> Router {
    Router::new().route("/api/health", get(health_handler))
}

/// Routes that sit behind the bearer-token gate
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Instances
        .route("/api/instances", get(list_instances_handler).post(create_instance_handler))
        .route(
            "/api/instances/:id",
            get(get_instance_handler)
                .patch(update_instance_handler)
                .delete(delete_instance_handler),
        )
        .route("/api/instances/:id/rule-order", put(set_rule_order_handler))
        // PPX profile
        .route("/api/ppx/plan", get(ppx_plan_handler))
        .route("/api/ppx/generate", post(ppx_generate_handler))
        // Read-only: renders stored ids; POST /api/ppx/generate allocates
        .route("/api/ppx/profile", get(ppx_profile_handler))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: proxydeck_common::VERSION,
    })
}

// ============================================================================
// Instances
// ============================================================================

async fn list_instances_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<InstanceRecord>>> {
    Ok(Json(state.repo.list_instances()?))
}

async fn create_instance_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewInstance>,
) -> ApiResult<(StatusCode, Json<InstanceRecord>)> {
    let record = state.repo.create_instance(req)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_instance_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InstanceRecord>> {
    state
        .repo
        .get_instance(&id)?
        .map(Json)
        .ok_or_else(|| Error::instance_not_found(id).into())
}

async fn update_instance_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<InstancePatch>,
) -> ApiResult<Json<InstanceRecord>> {
    Ok(Json(state.repo.update_instance(&id, &patch)?))
}

async fn delete_instance_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.repo.delete_instance(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::instance_not_found(id).into())
    }
}

async fn set_rule_order_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RuleOrderRequest>,
) -> ApiResult<StatusCode> {
    state.repo.set_rule_order(&id, req.order)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PPX profile
// ============================================================================

async fn ppx_plan_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProfilePlan>> {
    let plan = tokio::task::spawn_blocking(move || state.generator().preview()).await??;
    Ok(Json(plan))
}

async fn ppx_generate_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<GeneratedProfile>> {
    let profile = tokio::task::spawn_blocking(move || state.generator().generate()).await??;
    info!(
        allocated = profile.allocated.len(),
        proxies = profile.summary.proxies,
        rules = profile.summary.rules,
        "generated ppx profile"
    );
    Ok(Json(profile))
}

/// Download the profile for the ids already allocated. Never writes to the store.
async fn ppx_profile_handler(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let profile =
        tokio::task::spawn_blocking(move || state.generator().render_existing()).await??;
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"proxydeck.ppx\"",
            ),
        ],
        profile.xml,
    )
        .into_response())
}

use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::models::roadmap::RoadmapRow;
use crate::profile::analysis::{analyze_profile, ProfileAnalysis, ProfileAnalyzeRequest};
use crate::profile::roadmap::{
    generate_roadmap, latest_roadmap, RoadmapGenerateRequest, RoadmapResponse,
};
use crate::profile::setup::{my_profile, setup_profile, ProfileSetupRequest, UserProfile};
use crate::state::AppState;

/// POST /api/v1/profile/analyze
pub async fn handle_analyze_profile(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<ProfileAnalyzeRequest>,
) -> Result<Json<ProfileAnalysis>, AppError> {
    Ok(Json(analyze_profile(state.llm.as_ref(), req).await?))
}

/// POST /api/v1/roadmap/generate
pub async fn handle_generate_roadmap(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<RoadmapGenerateRequest>,
) -> Result<(StatusCode, Json<RoadmapResponse>), AppError> {
    let roadmap = generate_roadmap(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(roadmap)))
}

/// GET /api/v1/roadmap/me
pub async fn handle_latest_roadmap(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<RoadmapRow>, AppError> {
    Ok(Json(latest_roadmap(state.store.as_ref(), user.id()).await?))
}

/// POST /api/v1/profile/setup
pub async fn handle_setup_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ProfileSetupRequest>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(setup_profile(state.store.as_ref(), user.id(), req).await?))
}

/// GET /api/v1/profile/me
pub async fn handle_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(my_profile(state.store.as_ref(), user.id()).await?))
}

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::progress::aggregator::{rank_weak_topics, WeakTopic, WEAK_TOPIC_LIMIT};
use crate::progress::dashboard::{my_dashboard, session_dashboard, Dashboard};
use crate::state::AppState;
use crate::store::owned_session;

/// GET /api/v1/progress/:session_id/weak-topics
pub async fn handle_weak_topics(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<Vec<WeakTopic>>, AppError> {
    let session = owned_session(state.store.as_ref(), session_id, user.id()).await?;
    let topics = rank_weak_topics(state.store.as_ref(), session.id, WEAK_TOPIC_LIMIT).await?;
    Ok(Json(topics))
}

/// GET /api/v1/dashboard/:session_id
pub async fn handle_session_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(
        session_dashboard(state.store.as_ref(), user.id(), session_id).await?,
    ))
}

/// GET /api/v1/dashboard/me
pub async fn handle_my_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(my_dashboard(state.store.as_ref(), user.id()).await?))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::models::session::SessionRow;
use crate::sessions::service::{
    active_session, create_session, get_session, list_sessions, ActiveSession,
    CreateSessionRequest, CreatedSession, SessionDetail,
};
use crate::state::AppState;

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreatedSession>), AppError> {
    let created = create_session(state.store.as_ref(), user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<SessionRow>>, AppError> {
    Ok(Json(list_sessions(state.store.as_ref(), user.id()).await?))
}

/// GET /api/v1/sessions/active
pub async fn handle_active_session(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ActiveSession>, AppError> {
    Ok(Json(active_session(state.store.as_ref(), user.id()).await?))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<SessionDetail>, AppError> {
    Ok(Json(
        get_session(state.store.as_ref(), user.id(), session_id).await?,
    ))
}

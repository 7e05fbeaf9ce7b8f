use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::interview::driver::{
    answer, next_question, start, InterviewAnswerRequest, InterviewAnswerResponse,
    NextQuestionRequest, NextQuestionResponse, StartInterviewRequest, StartInterviewResponse,
};
use crate::state::AppState;

/// POST /api/v1/interview/start
pub async fn handle_start(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<StartInterviewRequest>,
) -> Result<(StatusCode, Json<StartInterviewResponse>), AppError> {
    let started = start(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// POST /api/v1/interview/next
pub async fn handle_next(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NextQuestionRequest>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    Ok(Json(
        next_question(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?,
    ))
}

/// POST /api/v1/interview/answer
///
/// Always returns the evaluation when grading succeeded, even if the
/// follow-up question could not be produced.
pub async fn handle_answer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<InterviewAnswerRequest>,
) -> Result<Json<InterviewAnswerResponse>, AppError> {
    Ok(Json(
        answer(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?,
    ))
}

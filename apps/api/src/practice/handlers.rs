use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::practice::evaluation::{evaluate, EvaluateRequest, EvaluateResponse};
use crate::practice::mcq::{
    generate_mcqs, mcq_report, submit_mcq, McqGenerateRequest, McqGenerateResponse, McqReport,
    McqSubmitRequest, McqSubmitResponse,
};
use crate::practice::questions::{
    generate_question, hint, GenerateQuestionRequest, GeneratedQuestion, HintRequest,
    HintResponse,
};
use crate::state::AppState;

/// POST /api/v1/questions
pub async fn handle_generate_question(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<GenerateQuestionRequest>,
) -> Result<Json<GeneratedQuestion>, AppError> {
    let out = generate_question(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok(Json(out))
}

/// POST /api/v1/questions/hint
pub async fn handle_hint(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<HintRequest>,
) -> Result<Json<HintResponse>, AppError> {
    let out = hint(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok(Json(out))
}

/// POST /api/v1/questions/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let out = evaluate(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok(Json(out))
}

/// POST /api/v1/mcq/generate
pub async fn handle_mcq_generate(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<McqGenerateRequest>,
) -> Result<Json<McqGenerateResponse>, AppError> {
    let out = generate_mcqs(state.store.as_ref(), state.llm.as_ref(), user.id(), req).await?;
    Ok(Json(out))
}

/// POST /api/v1/mcq/submit
pub async fn handle_mcq_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<McqSubmitRequest>,
) -> Result<Json<McqSubmitResponse>, AppError> {
    let out = submit_mcq(state.store.as_ref(), user.id(), req).await?;
    Ok(Json(out))
}

/// GET /api/v1/mcq/report/:session_id
pub async fn handle_mcq_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<McqReport>, AppError> {
    let report = mcq_report(state.store.as_ref(), user.id(), session_id).await?;
    Ok(Json(report))
}

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::simulator::problems::{
    generate_problem, suggest_code, CodeSuggestion, CodeSuggestionRequest, GeneratedProblem,
    GenerateProblemRequest,
};
use crate::state::AppState;

/// POST /api/v1/simulator/generate
pub async fn handle_generate_problem(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<GenerateProblemRequest>,
) -> Result<Json<GeneratedProblem>, AppError> {
    Ok(Json(generate_problem(state.llm.as_ref(), req).await?))
}

/// POST /api/v1/simulator/suggest-code
pub async fn handle_suggest_code(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<CodeSuggestionRequest>,
) -> Result<Json<CodeSuggestion>, AppError> {
    Ok(Json(suggest_code(state.llm.as_ref(), req).await?))
}

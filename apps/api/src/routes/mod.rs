pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::practice::handlers as practice;
use crate::profile::handlers as profile;
use crate::progress::handlers as progress;
use crate::sessions::handlers as sessions;
use crate::simulator::handlers as simulator;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route(
            "/api/v1/sessions",
            post(sessions::handle_create_session).get(sessions::handle_list_sessions),
        )
        .route("/api/v1/sessions/active", get(sessions::handle_active_session))
        .route("/api/v1/sessions/:id", get(sessions::handle_get_session))
        // Questions
        .route("/api/v1/questions", post(practice::handle_generate_question))
        .route("/api/v1/questions/hint", post(practice::handle_hint))
        .route("/api/v1/questions/evaluate", post(practice::handle_evaluate))
        // MCQ
        .route("/api/v1/mcq/generate", post(practice::handle_mcq_generate))
        .route("/api/v1/mcq/submit", post(practice::handle_mcq_submit))
        .route(
            "/api/v1/mcq/report/:session_id",
            get(practice::handle_mcq_report),
        )
        // Progress
        .route(
            "/api/v1/progress/:session_id/weak-topics",
            get(progress::handle_weak_topics),
        )
        .route("/api/v1/dashboard/me", get(progress::handle_my_dashboard))
        .route(
            "/api/v1/dashboard/:session_id",
            get(progress::handle_session_dashboard),
        )
        // Mock interview
        .route("/api/v1/interview/start", post(interview::handle_start))
        .route("/api/v1/interview/next", post(interview::handle_next))
        .route("/api/v1/interview/answer", post(interview::handle_answer))
        // Profile & roadmap
        .route("/api/v1/profile/setup", post(profile::handle_setup_profile))
        .route("/api/v1/profile/me", get(profile::handle_my_profile))
        .route("/api/v1/profile/analyze", post(profile::handle_analyze_profile))
        .route("/api/v1/roadmap/generate", post(profile::handle_generate_roadmap))
        .route("/api/v1/roadmap/me", get(profile::handle_latest_roadmap))
        // Coding simulator
        .route("/api/v1/simulator/generate", post(simulator::handle_generate_problem))
        .route("/api/v1/simulator/suggest-code", post(simulator::handle_suggest_code))
        .with_state(state)
}

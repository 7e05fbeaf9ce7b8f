use std::sync::Arc;

use crate::llm_client::CompletionGateway;
use crate::store::PracticeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Practice persistence. `PgStore` in production.
    pub store: Arc<dyn PracticeStore>,
    /// The only path to the model provider. `LlmClient` in production.
    pub llm: Arc<dyn CompletionGateway>,
}

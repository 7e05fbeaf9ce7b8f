use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::conversation::ConversationState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: i64,
    /// `None` only for legacy anonymous sessions, which no caller owns.
    pub user_id: Option<i64>,
    pub mode: String,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: String,
    pub level: String,
    pub interview_type: Option<String>,
    pub difficulty_current: i32,
    #[serde(skip_serializing)]
    pub conversation_state: Option<Json<ConversationState>>,
    pub created_at: DateTime<Utc>,
}

impl SessionRow {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }

    /// Conversation state, upgraded to the current schema version.
    /// Sessions that never stored one get a fresh state.
    pub fn conversation(&self) -> ConversationState {
        self.conversation_state
            .as_ref()
            .map(|Json(state)| state.clone().upgraded())
            .unwrap_or_default()
    }
}

/// Fields for inserting a session row.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub mode: String,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: String,
    pub level: String,
    pub interview_type: Option<String>,
    pub difficulty_current: i32,
    pub conversation_state: Option<ConversationState>,
}

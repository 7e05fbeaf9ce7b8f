use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Rolling aggregate per (session, skill, topic).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TopicProgressRow {
    pub id: i64,
    pub session_id: i64,
    pub track: String,
    pub skill: String,
    pub topic: String,
    pub attempts: i32,
    pub avg_overall: Option<f64>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

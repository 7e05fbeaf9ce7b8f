use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Standing preferences of one user. Roadmaps read it as planning context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub user_id: i64,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: Option<String>,
    pub level: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of a user's profile fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: Option<String>,
    pub level: Option<String>,
}

impl From<&UserProfileRow> for ProfileFields {
    fn from(row: &UserProfileRow) -> Self {
        Self {
            domain: row.domain.clone(),
            role: row.role.clone(),
            track: row.track.clone(),
            level: row.level.clone(),
        }
    }
}

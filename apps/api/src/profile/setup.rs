//! Standing profile of a user: domain, role, track and level.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::{ProfileFields, UserProfileRow};
use crate::practice::taxonomy::{Level, Track};
use crate::sessions::service::{optional_text, MAX_DOMAIN_CHARS, MAX_ROLE_CHARS};
use crate::store::PracticeStore;

/// Absent fields keep their stored value. A blank `domain` or `role` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileSetupRequest {
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: Option<Track>,
    pub level: Option<Level>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub track: Option<String>,
    pub level: Option<String>,
}

impl UserProfile {
    fn empty(user_id: i64) -> Self {
        Self {
            id: user_id,
            domain: None,
            role: None,
            track: None,
            level: None,
        }
    }
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            id: row.user_id,
            domain: row.domain,
            role: row.role,
            track: row.track,
            level: row.level,
        }
    }
}

pub async fn setup_profile(
    store: &dyn PracticeStore,
    user_id: i64,
    request: ProfileSetupRequest,
) -> Result<UserProfile, AppError> {
    let mut fields = store
        .get_user_profile(user_id)
        .await?
        .as_ref()
        .map(ProfileFields::from)
        .unwrap_or_default();

    if let Some(domain) = request.domain {
        fields.domain = optional_text(Some(domain), "domain", MAX_DOMAIN_CHARS)?;
    }
    if let Some(role) = request.role {
        fields.role = optional_text(Some(role), "role", MAX_ROLE_CHARS)?;
    }
    if let Some(track) = request.track {
        fields.track = Some(track.as_str().to_string());
    }
    if let Some(level) = request.level {
        fields.level = Some(level.as_str().to_string());
    }

    let row = store.upsert_user_profile(user_id, &fields).await?;
    info!("User {} updated profile", user_id);
    Ok(row.into())
}

/// The caller's profile. A user who never set one gets empty fields.
pub async fn my_profile(store: &dyn PracticeStore, user_id: i64) -> Result<UserProfile, AppError> {
    Ok(store
        .get_user_profile(user_id)
        .await?
        .map(UserProfile::from)
        .unwrap_or_else(|| UserProfile::empty(user_id)))
}

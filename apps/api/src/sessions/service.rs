use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::qa_item::QaItemRow;
use crate::models::session::{NewSession, SessionRow};
use crate::practice::taxonomy::{Level, Mode, Track};
use crate::store::{owned_session, PracticeStore};

/// Upper bound on listed sessions.
pub const SESSION_LIST_LIMIT: i64 = 100;

pub const MAX_DOMAIN_CHARS: usize = 100;
pub const MAX_ROLE_CHARS: usize = 120;

const DEFAULT_DIFFICULTY: i32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: Mode,
    pub track: Track,
    pub level: Level,
    pub domain: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub session_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionItem {
    pub id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: String,
    pub format: String,
    pub difficulty: i32,
    pub question: String,
    pub user_answer: Option<String>,
    pub overall: Option<f64>,
}

impl From<QaItemRow> for SessionItem {
    fn from(row: QaItemRow) -> Self {
        Self {
            id: row.id,
            skill: row.skill,
            topic: row.topic,
            question_type: row.question_type,
            format: row.format,
            difficulty: row.difficulty,
            question: row.question,
            user_answer: row.user_answer,
            overall: row.overall,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: SessionRow,
    pub items: Vec<SessionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    pub session_id: i64,
}

/// Trims optional free text, treating blank as absent.
pub(crate) fn optional_text(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, AppError> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        other => Ok(other),
    }
}

pub async fn create_session(
    store: &dyn PracticeStore,
    user_id: i64,
    request: CreateSessionRequest,
) -> Result<CreatedSession, AppError> {
    let session = store
        .create_session(NewSession {
            user_id,
            mode: request.mode.as_str().to_string(),
            domain: optional_text(request.domain, "domain", MAX_DOMAIN_CHARS)?,
            role: optional_text(request.role, "role", MAX_ROLE_CHARS)?,
            track: request.track.as_str().to_string(),
            level: request.level.as_str().to_string(),
            interview_type: None,
            difficulty_current: DEFAULT_DIFFICULTY,
            conversation_state: None,
        })
        .await?;
    info!("User {} started {} session {}", user_id, session.mode, session.id);
    Ok(CreatedSession {
        session_id: session.id,
    })
}

pub async fn get_session(
    store: &dyn PracticeStore,
    user_id: i64,
    session_id: i64,
) -> Result<SessionDetail, AppError> {
    let session = owned_session(store, session_id, user_id).await?;
    let items = store
        .list_qa_items(session.id)
        .await?
        .into_iter()
        .map(SessionItem::from)
        .collect();
    Ok(SessionDetail { session, items })
}

pub async fn list_sessions(store: &dyn PracticeStore, user_id: i64) -> Result<Vec<SessionRow>, AppError> {
    store.list_sessions(user_id, SESSION_LIST_LIMIT).await
}

/// The caller's most recent session.
pub async fn active_session(store: &dyn PracticeStore, user_id: i64) -> Result<ActiveSession, AppError> {
    store
        .list_sessions(user_id, 1)
        .await?
        .first()
        .map(|s| ActiveSession { session_id: s.id })
        .ok_or_else(|| AppError::NotFound("No sessions found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn request(mode: Mode) -> CreateSessionRequest {
        CreateSessionRequest {
            mode,
            track: Track::Backend,
            level: Level::Intermediate,
            domain: Some("  Software  ".to_string()),
            role: Some("   ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let created = create_session(&store, 5, request(Mode::Learn)).await.unwrap();

        let detail = get_session(&store, 5, created.session_id).await.unwrap();
        assert_eq!(detail.session.track, "backend");
        assert_eq!(detail.session.domain.as_deref(), Some("Software"));
        assert_eq!(detail.session.role, None);
        assert_eq!(detail.session.difficulty_current, 3);
        assert!(detail.items.is_empty());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], created.session_id);
        assert!(json.get("conversation_state").is_none());
    }

    #[tokio::test]
    async fn test_other_users_sessions_are_hidden() {
        let store = MemoryStore::new();
        let created = create_session(&store, 5, request(Mode::Learn)).await.unwrap();

        assert!(matches!(
            get_session(&store, 6, created.session_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(list_sessions(&store, 6).await.unwrap().is_empty());
        assert!(matches!(
            active_session(&store, 6).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_legacy_session_has_no_owner() {
        let store = MemoryStore::new();
        store.seed_session(SessionRow {
            id: 1,
            user_id: None,
            mode: "learn".to_string(),
            domain: None,
            role: None,
            track: "backend".to_string(),
            level: "beginner".to_string(),
            interview_type: None,
            difficulty_current: 3,
            conversation_state: None,
            created_at: chrono::Utc::now(),
        });

        assert!(matches!(
            get_session(&store, 1, 1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(list_sessions(&store, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_active_is_latest() {
        let store = MemoryStore::new();
        let first = create_session(&store, 5, request(Mode::Learn)).await.unwrap();
        let second = create_session(&store, 5, request(Mode::Interview)).await.unwrap();

        let ids: Vec<i64> = list_sessions(&store, 5).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.session_id, first.session_id]);
        assert_eq!(active_session(&store, 5).await.unwrap().session_id, second.session_id);
    }
}

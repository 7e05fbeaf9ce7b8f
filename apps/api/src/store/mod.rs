//! Persistence boundary for practice data.
//!
//! `AppState` holds an `Arc<dyn PracticeStore>`. `PgStore` is the production
//! backend; tests run the same services against the in-memory store.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::conversation::ConversationState;
use crate::models::profile::{ProfileFields, UserProfileRow};
use crate::models::progress::TopicProgressRow;
use crate::models::qa_item::{EvaluationRecord, McqSubmission, NewQaItem, QaItemRow};
use crate::models::roadmap::{NewRoadmap, RoadmapRow};
use crate::models::session::{NewSession, SessionRow};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Outcome of inserting a fingerprinted item.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(QaItemRow),
    /// Another item in the session already carries this fingerprint.
    /// Retryable from the caller's point of view.
    Duplicate,
}

/// One graded attempt fed into the topic aggregate.
#[derive(Debug, Clone)]
pub struct AttemptRecord<'a> {
    pub session_id: i64,
    pub track: &'a str,
    pub skill: &'a str,
    pub topic: &'a str,
    pub score: f64,
}

#[async_trait]
pub trait PracticeStore: Send + Sync {
    // Sessions
    async fn create_session(&self, new: NewSession) -> Result<SessionRow, AppError>;
    async fn get_session(&self, session_id: i64) -> Result<Option<SessionRow>, AppError>;
    /// Newest first, at most `limit`.
    async fn list_sessions(&self, user_id: i64, limit: i64) -> Result<Vec<SessionRow>, AppError>;
    async fn save_interview_state(
        &self,
        session_id: i64,
        difficulty_current: i32,
        state: &ConversationState,
    ) -> Result<(), AppError>;

    // Items
    /// Inserts an item. Reports a fingerprint collision against committed
    /// state as `InsertOutcome::Duplicate` rather than an error.
    async fn insert_qa_item(&self, new: NewQaItem) -> Result<InsertOutcome, AppError>;
    async fn get_qa_item(&self, item_id: i64) -> Result<Option<QaItemRow>, AppError>;
    /// All items of a session, oldest first.
    async fn list_qa_items(&self, session_id: i64) -> Result<Vec<QaItemRow>, AppError>;
    /// The `limit` most recent non-empty questions, returned oldest first.
    async fn recent_questions(&self, session_id: i64, limit: i64) -> Result<Vec<String>, AppError>;
    async fn fingerprint_exists(&self, session_id: i64, fingerprint: &str) -> Result<bool, AppError>;
    /// Durably stores the submitted answer ahead of any grading.
    async fn store_user_answer(&self, item_id: i64, answer: &str) -> Result<(), AppError>;
    async fn record_evaluation(&self, item_id: i64, record: &EvaluationRecord) -> Result<(), AppError>;
    async fn record_mcq_submission(&self, item_id: i64, submission: &McqSubmission) -> Result<(), AppError>;

    // Progress
    /// Applies the online-mean update for the attempt's (session, skill, topic)
    /// key atomically with respect to other writers of the same key.
    async fn record_attempt(&self, attempt: AttemptRecord<'_>) -> Result<TopicProgressRow, AppError>;
    async fn list_topic_progress(&self, session_id: i64) -> Result<Vec<TopicProgressRow>, AppError>;

    // Roadmaps
    async fn insert_roadmap(&self, new: NewRoadmap) -> Result<RoadmapRow, AppError>;
    async fn latest_roadmap(&self, user_id: i64) -> Result<Option<RoadmapRow>, AppError>;

    // Profiles
    async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfileRow>, AppError>;
    /// Creates or replaces the user's profile.
    async fn upsert_user_profile(&self, user_id: i64, fields: &ProfileFields) -> Result<UserProfileRow, AppError>;
}

/// Loads a session the caller owns. Missing and foreign sessions are
/// indistinguishable to the caller.
pub async fn owned_session(
    store: &dyn PracticeStore,
    session_id: i64,
    user_id: i64,
) -> Result<SessionRow, AppError> {
    store
        .get_session(session_id)
        .await?
        .filter(|s| s.is_owned_by(user_id))
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

/// Loads an item together with its session, enforcing ownership the same way.
pub async fn owned_item(
    store: &dyn PracticeStore,
    item_id: i64,
    user_id: i64,
) -> Result<(QaItemRow, SessionRow), AppError> {
    let item = store
        .get_qa_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("QA item {item_id} not found")))?;
    let session = store
        .get_session(item.session_id)
        .await?
        .filter(|s| s.is_owned_by(user_id))
        .ok_or_else(|| AppError::NotFound(format!("QA item {item_id} not found")))?;
    Ok((item, session))
}

//! In-process store used by service and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use crate::errors::AppError;
use crate::models::conversation::ConversationState;
use crate::models::profile::{ProfileFields, UserProfileRow};
use crate::models::progress::TopicProgressRow;
use crate::models::qa_item::{EvaluationRecord, McqSubmission, NewQaItem, QaItemRow};
use crate::models::roadmap::{NewRoadmap, RoadmapRow};
use crate::models::session::{NewSession, SessionRow};
use crate::progress::aggregator::online_mean;
use crate::store::{AttemptRecord, InsertOutcome, PracticeStore};

#[derive(Default)]
struct Tables {
    sessions: Vec<SessionRow>,
    items: Vec<QaItemRow>,
    progress: Vec<TopicProgressRow>,
    roadmaps: Vec<RoadmapRow>,
    profiles: Vec<UserProfileRow>,
    lose_next_insert: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn item_mut<'a>(tables: &'a mut Tables, item_id: i64) -> Result<&'a mut QaItemRow, AppError> {
        tables
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| AppError::NotFound(format!("QA item {item_id} not found")))
    }

    /// Mirrors the `overall IS NULL` condition on grading updates.
    fn ungraded_mut<'a>(tables: &'a mut Tables, item_id: i64) -> Result<&'a mut QaItemRow, AppError> {
        let item = Self::item_mut(tables, item_id)?;
        if item.overall.is_some() {
            return Err(AppError::Validation(format!(
                "QA item {item_id} has already been graded"
            )));
        }
        Ok(item)
    }

    /// Test helper: the next item insert behaves as if a concurrent writer
    /// stored the same fingerprint first. The row lands, the caller sees
    /// `Duplicate`.
    pub fn lose_next_insert_race(&self) {
        self.lock().lose_next_insert = true;
    }

    /// Test helper: inserts a session with an arbitrary owner.
    pub fn seed_session(&self, row: SessionRow) {
        self.lock().sessions.push(row);
    }
}

#[async_trait]
impl PracticeStore for MemoryStore {
    async fn create_session(&self, new: NewSession) -> Result<SessionRow, AppError> {
        let mut tables = self.lock();
        let row = SessionRow {
            id: tables.sessions.len() as i64 + 1,
            user_id: Some(new.user_id),
            mode: new.mode,
            domain: new.domain,
            role: new.role,
            track: new.track,
            level: new.level,
            interview_type: new.interview_type,
            difficulty_current: new.difficulty_current,
            conversation_state: new.conversation_state.map(Json),
            created_at: Utc::now(),
        };
        tables.sessions.push(row.clone());
        Ok(row)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<SessionRow>, AppError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn list_sessions(&self, user_id: i64, limit: i64) -> Result<Vec<SessionRow>, AppError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .rev()
            .filter(|s| s.is_owned_by(user_id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn save_interview_state(
        &self,
        session_id: i64,
        difficulty_current: i32,
        state: &ConversationState,
    ) -> Result<(), AppError> {
        let mut tables = self.lock();
        if let Some(session) = tables.sessions.iter_mut().find(|s| s.id == session_id) {
            session.difficulty_current = difficulty_current;
            session.conversation_state = Some(Json(state.clone()));
        }
        Ok(())
    }

    async fn insert_qa_item(&self, new: NewQaItem) -> Result<InsertOutcome, AppError> {
        let mut tables = self.lock();
        if let Some(hash) = &new.question_hash {
            let taken = tables
                .items
                .iter()
                .any(|i| i.session_id == new.session_id && i.question_hash.as_ref() == Some(hash));
            if taken {
                return Ok(InsertOutcome::Duplicate);
            }
        }
        let row = QaItemRow {
            id: tables.items.len() as i64 + 1,
            session_id: new.session_id,
            skill: new.skill,
            topic: new.topic,
            question_type: new.question_type,
            format: new.format.as_str().to_string(),
            difficulty: new.difficulty,
            question: new.question,
            question_hash: new.question_hash,
            mcq: new.mcq.map(Json),
            user_answer: None,
            model_answer: None,
            overall: None,
            scores: None,
            feedback: None,
            provenance: Some(Json(new.provenance)),
            created_at: Utc::now(),
            evaluated_at: None,
        };
        if std::mem::take(&mut tables.lose_next_insert) {
            tables.items.push(row);
            return Ok(InsertOutcome::Duplicate);
        }
        tables.items.push(row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn get_qa_item(&self, item_id: i64) -> Result<Option<QaItemRow>, AppError> {
        Ok(self.lock().items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn list_qa_items(&self, session_id: i64) -> Result<Vec<QaItemRow>, AppError> {
        Ok(self
            .lock()
            .items
            .iter()
            .filter(|i| i.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn recent_questions(&self, session_id: i64, limit: i64) -> Result<Vec<String>, AppError> {
        let tables = self.lock();
        let mut recent: Vec<String> = tables
            .items
            .iter()
            .rev()
            .filter(|i| i.session_id == session_id && !i.question.trim().is_empty())
            .take(limit.max(0) as usize)
            .map(|i| i.question.clone())
            .collect();
        recent.reverse();
        Ok(recent)
    }

    async fn fingerprint_exists(&self, session_id: i64, fingerprint: &str) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .items
            .iter()
            .any(|i| i.session_id == session_id && i.question_hash.as_deref() == Some(fingerprint)))
    }

    async fn store_user_answer(&self, item_id: i64, answer: &str) -> Result<(), AppError> {
        let mut tables = self.lock();
        Self::item_mut(&mut tables, item_id)?.user_answer = Some(answer.to_string());
        Ok(())
    }

    async fn record_evaluation(&self, item_id: i64, record: &EvaluationRecord) -> Result<(), AppError> {
        let mut tables = self.lock();
        let item = Self::ungraded_mut(&mut tables, item_id)?;
        item.overall = Some(record.overall);
        item.scores = Some(Json(record.scores));
        item.feedback = Some(Json(record.feedback.clone()));
        item.model_answer = Some(record.model_answer.clone());
        item.provenance = Some(Json(record.provenance.clone()));
        item.evaluated_at = Some(Utc::now());
        Ok(())
    }

    async fn record_mcq_submission(&self, item_id: i64, submission: &McqSubmission) -> Result<(), AppError> {
        let mut tables = self.lock();
        let item = Self::ungraded_mut(&mut tables, item_id)?;
        item.user_answer = Some(submission.selected.to_string());
        item.overall = Some(submission.overall);
        item.feedback = Some(Json(submission.feedback.clone()));
        item.mcq = Some(Json(submission.mcq.clone()));
        item.evaluated_at = Some(Utc::now());
        Ok(())
    }

    async fn record_attempt(&self, attempt: AttemptRecord<'_>) -> Result<TopicProgressRow, AppError> {
        let mut tables = self.lock();
        let now = Utc::now();
        let next_id = tables.progress.len() as i64 + 1;
        let existing = tables.progress.iter_mut().find(|p| {
            p.session_id == attempt.session_id && p.skill == attempt.skill && p.topic == attempt.topic
        });
        let row = match existing {
            Some(row) => {
                row.avg_overall = Some(online_mean(row.avg_overall, row.attempts, attempt.score));
                row.attempts += 1;
                row.last_seen_at = Some(now);
                row.updated_at = now;
                row.clone()
            }
            None => {
                let row = TopicProgressRow {
                    id: next_id,
                    session_id: attempt.session_id,
                    track: attempt.track.to_string(),
                    skill: attempt.skill.to_string(),
                    topic: attempt.topic.to_string(),
                    attempts: 1,
                    avg_overall: Some(attempt.score),
                    last_seen_at: Some(now),
                    created_at: now,
                    updated_at: now,
                };
                tables.progress.push(row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn list_topic_progress(&self, session_id: i64) -> Result<Vec<TopicProgressRow>, AppError> {
        Ok(self
            .lock()
            .progress
            .iter()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_roadmap(&self, new: NewRoadmap) -> Result<RoadmapRow, AppError> {
        let mut tables = self.lock();
        let row = RoadmapRow {
            id: tables.roadmaps.len() as i64 + 1,
            user_id: new.user_id,
            session_id: new.session_id,
            title: new.title,
            duration_days: new.duration_days,
            plan: Json(new.plan),
            created_at: Utc::now(),
        };
        tables.roadmaps.push(row.clone());
        Ok(row)
    }

    async fn latest_roadmap(&self, user_id: i64) -> Result<Option<RoadmapRow>, AppError> {
        Ok(self
            .lock()
            .roadmaps
            .iter()
            .rev()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfileRow>, AppError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_user_profile(&self, user_id: i64, fields: &ProfileFields) -> Result<UserProfileRow, AppError> {
        let mut tables = self.lock();
        let row = UserProfileRow {
            user_id,
            domain: fields.domain.clone(),
            role: fields.role.clone(),
            track: fields.track.clone(),
            level: fields.level.clone(),
            updated_at: Utc::now(),
        };
        tables.profiles.retain(|p| p.user_id != user_id);
        tables.profiles.push(row.clone());
        Ok(row)
    }
}
